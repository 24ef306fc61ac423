use crate::domain::{error::DomainResult, repositories::PushTransport};
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

/// Hands out a fixed device token: the configured one, or a random token
/// generated once per process.
#[derive(Debug, Clone)]
pub struct StaticPushTransport {
    token: String,
}

impl StaticPushTransport {
    pub fn new(configured: Option<String>) -> Self {
        let token = configured.unwrap_or_else(|| {
            let generated = format!("local-{}", Uuid::new_v4());
            info!("No device token configured, using {}", generated);
            generated
        });
        Self { token }
    }
}

#[async_trait]
impl PushTransport for StaticPushTransport {
    async fn device_token(&self) -> DomainResult<String> {
        Ok(self.token.clone())
    }
}
