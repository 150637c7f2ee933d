pub mod dtos;
pub mod ports;
pub mod services;

// Re-exports for easy access to the outbound ports
pub use ports::outbound::{PersistencePort, ServerEndpoint, TransportPort};
