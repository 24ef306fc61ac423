use crate::domain::error::DomainResult;
use async_trait::async_trait;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

/// Platform push service. Only token issuance is needed here.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn device_token(&self) -> DomainResult<String>;
}

pub type DynPushTransport = Arc<dyn PushTransport>;
