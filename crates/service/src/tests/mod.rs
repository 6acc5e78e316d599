pub mod restaurant_tests;
pub mod scoring_tests;
