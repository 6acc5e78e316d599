//! Restaurant directory: validation-backed CRUD plus scores, comments and images.

pub mod query;
pub mod scoring;
pub mod service;

pub use service::RestaurantService;
