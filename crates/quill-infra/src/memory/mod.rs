//! In-memory implementations of the repository ports.

mod store;

pub use store::InMemoryStore;

#[cfg(all(test, feature = "auth"))]
mod tests;
