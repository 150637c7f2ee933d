use std::io::{self, Read};

use async_trait::async_trait;
use flate2::bufread::GzDecoder;
use flate2::read::GzEncoder;
use flate2::Compression;
use tracing::error;

/// Compression level for persisted blobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    /// No compression
    None = 0,
    /// Fast compression with a lower ratio
    Fast = 1,
    /// Balanced compression
    Default = 6,
    /// Best ratio, slowest
    Best = 9,
}

impl From<CompressionLevel> for Compression {
    fn from(level: CompressionLevel) -> Self {
        match level {
            CompressionLevel::None => Compression::none(),
            CompressionLevel::Fast => Compression::fast(),
            CompressionLevel::Default => Compression::default(),
            CompressionLevel::Best => Compression::best(),
        }
    }
}

/// Interface for in-memory compression
#[async_trait]
pub trait CompressionService: Send + Sync {
    /// Compresses a byte buffer
    async fn compress_data(&self, data: &[u8], level: CompressionLevel) -> io::Result<Vec<u8>>;

    /// Decompresses a byte buffer
    async fn decompress_data(&self, compressed_data: &[u8]) -> io::Result<Vec<u8>>;
}

/// Gzip backed compression, work runs on the blocking pool
#[derive(Debug, Default)]
pub struct GzipCompressionService;

impl GzipCompressionService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CompressionService for GzipCompressionService {
    async fn compress_data(&self, data: &[u8], level: CompressionLevel) -> io::Result<Vec<u8>> {
        let data_owned = data.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut encoder = GzEncoder::new(&data_owned[..], level.into());
            let mut compressed = Vec::new();
            encoder.read_to_end(&mut compressed)?;
            Ok::<_, io::Error>(compressed)
        })
        .await
        .unwrap_or_else(|e| {
            error!("Compression task failed: {}", e);
            Err(io::Error::new(io::ErrorKind::Other, e.to_string()))
        })
    }

    async fn decompress_data(&self, compressed_data: &[u8]) -> io::Result<Vec<u8>> {
        let data = compressed_data.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut decoder = GzDecoder::new(&data[..]);
            let mut decompressed = Vec::new();
            decoder.read_to_end(&mut decompressed)?;
            Ok::<_, io::Error>(decompressed)
        })
        .await
        .unwrap_or_else(|e| {
            error!("Decompression task failed: {}", e);
            Err(io::Error::new(io::ErrorKind::Other, e.to_string()))
        })
    }
}
