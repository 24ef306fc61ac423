use crate::domain::{
    entities::{
        CreateNotificationRequest, DeviceRegistration, Notification, NotificationId,
        NotificationPage, UserId,
    },
    error::{DomainError, DomainResult},
    repositories::NotificationTransport,
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterDeviceBody<'a> {
    user_id: UserId,
    device_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegistrationStatus {
    registered: bool,
}

/// JSON-over-HTTP client for the marketplace notification API.
#[derive(Debug, Clone)]
pub struct HttpNotificationTransport {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpNotificationTransport {
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> DomainResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self::with_client(client, base_url, api_token))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> DomainResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, body))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> DomainResult<T> {
        let response = self.send(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| DomainError::TransportError(format!("Malformed response: {}", e)))
    }
}

fn status_error(status: StatusCode, body: String) -> DomainError {
    let message = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, body.trim())
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DomainError::UnauthorizedError(message),
        StatusCode::NOT_FOUND => DomainError::NotFoundError(message),
        StatusCode::CONFLICT => DomainError::ConflictError(message),
        _ => DomainError::TransportError(message),
    }
}

#[async_trait]
impl NotificationTransport for HttpNotificationTransport {
    async fn register_device(
        &self,
        user_id: UserId,
        device_token: String,
    ) -> DomainResult<DeviceRegistration> {
        let body = RegisterDeviceBody {
            user_id,
            device_token: &device_token,
        };
        self.send(self.request(Method::POST, "/devices").json(&body))
            .await?;
        Ok(DeviceRegistration::new(user_id, device_token))
    }

    async fn is_device_registered(&self, user_id: UserId) -> DomainResult<bool> {
        let path = format!("/devices/{}", user_id);
        match self
            .send_json::<RegistrationStatus>(self.request(Method::GET, &path))
            .await
        {
            Ok(status) => Ok(status.registered),
            Err(DomainError::NotFoundError(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn clear_device_binding(&self, user_id: UserId) -> DomainResult<()> {
        let path = format!("/devices/{}", user_id);
        match self.send(self.request(Method::DELETE, &path)).await {
            Ok(_) | Err(DomainError::NotFoundError(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn fetch_notifications(
        &self,
        user_id: UserId,
        page: u32,
        page_size: u32,
    ) -> DomainResult<NotificationPage> {
        let path = format!("/notifications/user/{}", user_id);
        let builder = self
            .request(Method::GET, &path)
            .query(&[("page", page), ("limit", page_size)]);
        self.send_json(builder).await
    }

    async fn fetch_all_for_user(&self, user_id: UserId) -> DomainResult<Vec<Notification>> {
        let path = format!("/notifications/user/{}/all", user_id);
        self.send_json(self.request(Method::GET, &path)).await
    }

    async fn mark_read(&self, id: NotificationId) -> DomainResult<()> {
        let path = format!("/notifications/{}/read", id);
        self.send(self.request(Method::PUT, &path)).await?;
        Ok(())
    }

    async fn mark_all_read(&self, user_id: UserId) -> DomainResult<()> {
        let path = format!("/notifications/user/{}/read-all", user_id);
        self.send(self.request(Method::PUT, &path)).await?;
        Ok(())
    }

    async fn delete(&self, id: NotificationId) -> DomainResult<()> {
        let path = format!("/notifications/{}", id);
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn create(&self, request: CreateNotificationRequest) -> DomainResult<Notification> {
        self.send_json(self.request(Method::POST, "/notifications").json(&request))
            .await
    }
}
