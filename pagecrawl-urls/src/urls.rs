use crate::middleware::Middleware;
use serde::Serialize;

/// Compiled URLs of one configuration entry, post-processed through
/// middleware before they are handed to the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UrlList {
    urls: Vec<String>,
}

impl UrlList {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }

    /// Apply a middleware to process the URLs
    pub fn apply<M: Middleware + ?Sized>(mut self, middleware: &M) -> Self {
        self.urls = middleware.process(self.urls);
        self
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn into_inner(self) -> Vec<String> {
        self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl From<Vec<String>> for UrlList {
    fn from(urls: Vec<String>) -> Self {
        Self::new(urls)
    }
}
