pub mod translation_cache;
pub mod compression_service;
pub mod cache_codec;
pub mod http_transport;
