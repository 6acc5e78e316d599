//! External image hosting: upload bytes, get back a public URL.

use async_trait::async_trait;
use thiserror::Error;

pub mod http;

pub use http::HttpImageHost;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ImageHostError {
    #[error("empty image")]
    Empty,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("upload rejected: {0}")]
    Rejected(String),
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: Vec<u8>) -> Result<String, ImageHostError>;
}

/// Deterministic in-process image host for tests and local runs.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    pub struct MockImageHost {
        uploads: AtomicUsize,
        failing: AtomicBool,
    }

    impl MockImageHost {
        pub fn set_failing(&self, failing: bool) { self.failing.store(failing, Ordering::SeqCst); }

        /// Number of successful uploads so far.
        pub fn uploads(&self) -> usize { self.uploads.load(Ordering::SeqCst) }
    }

    #[async_trait]
    impl ImageHost for MockImageHost {
        async fn upload(&self, image: Vec<u8>) -> Result<String, ImageHostError> {
            if image.is_empty() {
                return Err(ImageHostError::Empty);
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(ImageHostError::Rejected("mock host configured to fail".into()));
            }
            let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("https://images.test/{n}-{}.png", image.len()))
        }
    }
}
