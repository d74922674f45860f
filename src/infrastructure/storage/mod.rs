//! Storage infrastructure - Snapshot repository implementations

mod factory;
mod file;
mod in_memory;
mod postgres;

pub use factory::SnapshotRepositoryFactory;
pub use file::FileSnapshotRepository;
pub use in_memory::InMemorySnapshotRepository;
pub use postgres::{PostgresConfig, PostgresSnapshotRepository};
