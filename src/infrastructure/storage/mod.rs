//! Storage implementations that live outside a database

mod memory;

pub use memory::InMemoryRepositoryProvider;
