use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::upstream::UpstreamClient;

/// State shared by all API handlers.
pub struct RelayState {
    pub upstream: UpstreamClient,
    pub keep_alive: Duration,
}

impl RelayState {
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        Ok(Self {
            upstream: UpstreamClient::new(&config.upstream)?,
            keep_alive: Duration::from_secs(config.keep_alive_secs.max(1)),
        })
    }
}

pub type AppState = Arc<RelayState>;
