//! Service layer for the restaurant directory.
//! - Validates untrusted JSON before anything reaches storage.
//! - Talks to the document store and image host only through traits.
//! - Maps every failure onto one `RestaurantError` taxonomy.

pub mod errors;
pub mod validation;
pub mod store;
pub mod image;
pub mod restaurant;
pub mod runtime;
#[cfg(test)]
pub mod test_support;
#[cfg(test)]
mod tests;

pub use errors::RestaurantError;
pub use restaurant::RestaurantService;
