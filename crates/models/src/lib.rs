//! Document shapes persisted by the restaurant service.

pub mod errors;
pub mod id;
pub mod restaurant;
pub mod feedback;

pub use id::DocumentId;

#[cfg(test)]
mod tests;
