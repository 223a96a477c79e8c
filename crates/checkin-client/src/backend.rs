//! Backend seam and its HTTP implementation.

use async_trait::async_trait;
use checkin_core::api::{
    ErrorBody, EventName, FaceSummary, IdentifyResponse, RegisterResponse, CAPTURE_FILE_NAME,
    FIELD_EVENT_ID, FIELD_IMAGE, FIELD_NAME,
};
use checkin_core::{Event, EventId};
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Status { status: u16, message: Option<String> },
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// How the backend answered a registration.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterReply {
    /// 2xx with the echoed person and event.
    Registered(RegisterResponse),
    /// Non-2xx; `error` is the body's `error` field when present.
    Rejected { status: u16, error: Option<String> },
}

/// Operations the workflows need from the check-in backend.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_events(&self) -> Result<Vec<Event>, BackendError>;
    async fn create_event(&self, name: &str) -> Result<(), BackendError>;
    async fn update_event(&self, id: EventId, name: &str) -> Result<(), BackendError>;
    async fn delete_event(&self, id: EventId) -> Result<(), BackendError>;
    async fn list_faces(&self) -> Result<Vec<FaceSummary>, BackendError>;

    /// Submit a JPEG for matching within one event. The HTTP status is not
    /// inspected; only the JSON body is.
    async fn identify(&self, event_id: EventId, jpeg: Vec<u8>)
        -> Result<IdentifyResponse, BackendError>;

    async fn register(
        &self,
        name: &str,
        event_id: EventId,
        jpeg: Vec<u8>,
    ) -> Result<RegisterReply, BackendError>;
}

/// `reqwest`-based backend talking to `base_url`.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn image_part(jpeg: Vec<u8>) -> Result<Part, BackendError> {
        Ok(Part::bytes(jpeg)
            .file_name(CAPTURE_FILE_NAME)
            .mime_str("image/jpeg")?)
    }
}

/// Pass 2xx responses through; turn anything else into `BackendError::Status`.
async fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.json::<ErrorBody>().await.ok().map(|b| b.error);
    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_events(&self) -> Result<Vec<Event>, BackendError> {
        let response = self.client.get(self.url("/admin/events")).send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn create_event(&self, name: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.url("/admin/events"))
            .json(&EventName { name: name.to_string() })
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn update_event(&self, id: EventId, name: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .put(self.url(&format!("/admin/events/{id}")))
            .json(&EventName { name: name.to_string() })
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn delete_event(&self, id: EventId) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(self.url(&format!("/admin/events/{id}")))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn list_faces(&self) -> Result<Vec<FaceSummary>, BackendError> {
        let response = self.client.get(self.url("/admin/faces")).send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn identify(
        &self,
        event_id: EventId,
        jpeg: Vec<u8>,
    ) -> Result<IdentifyResponse, BackendError> {
        let form = Form::new()
            .part(FIELD_IMAGE, Self::image_part(jpeg)?)
            .text(FIELD_EVENT_ID, event_id.to_string());

        let response = self
            .client
            .post(self.url("/identify"))
            .multipart(form)
            .send()
            .await?;
        tracing::debug!(status = %response.status(), "identify response");
        Ok(response.json().await?)
    }

    async fn register(
        &self,
        name: &str,
        event_id: EventId,
        jpeg: Vec<u8>,
    ) -> Result<RegisterReply, BackendError> {
        let form = Form::new()
            .text(FIELD_NAME, name.to_string())
            .text(FIELD_EVENT_ID, event_id.to_string())
            .part(FIELD_IMAGE, Self::image_part(jpeg)?);

        let response = self
            .client
            .post(self.url("/register"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await?;
        tracing::debug!(status = %status, "register response");

        if status.is_success() {
            let registered = serde_json::from_value(body)
                .map_err(|e| BackendError::Decode(e.to_string()))?;
            Ok(RegisterReply::Registered(registered))
        } else {
            Ok(RegisterReply::Rejected {
                status: status.as_u16(),
                error: body
                    .get("error")
                    .and_then(serde_json::Value::as_str)
                    .filter(|e| !e.is_empty())
                    .map(str::to_owned),
            })
        }
    }
}
