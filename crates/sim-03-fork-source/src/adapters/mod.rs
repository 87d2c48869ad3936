//! Adapters for the remote provider port.

pub mod in_memory;

pub use in_memory::InMemoryRemoteProvider;
