use std::sync::Arc;
use std::time::Duration;

use stubby_core::{Alias, Context, UrlMapper};

#[derive(Clone)]
pub struct AppState {
    mapper: Arc<dyn UrlMapper>,
    base_url: String,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(
        mapper: Arc<dyn UrlMapper>,
        public_base_url: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            mapper,
            base_url: public_base_url.into(),
            request_timeout,
        }
    }

    pub fn mapper(&self) -> &dyn UrlMapper {
        self.mapper.as_ref()
    }

    /// A fresh context bounded by the configured request timeout.
    pub fn request_context(&self) -> Context {
        Context::background().with_timeout(self.request_timeout)
    }

    pub fn short_url(&self, alias: &Alias) -> String {
        alias.to_url(&format!("{}/url", self.base_url.trim_end_matches('/')))
    }
}
