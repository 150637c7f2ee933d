pub mod file_persistence_repository;

pub use file_persistence_repository::FilePersistenceRepository;
