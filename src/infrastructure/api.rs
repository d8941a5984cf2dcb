//! Client for the remote application service.
//!
//! The backend owns every state transition. This module only moves requests
//! and responses; permission decisions live in [`crate::domain::lifecycle`].

use crate::domain::{
    Application, ApplicationDetail, ApplicationStatus, FileStatus, FileUpload, IdentityUpdate,
    NewApplication,
};
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Header carrying the administrator shared secret.
pub const ADMIN_TOKEN_HEADER: &str = "X-ADMIN-TOKEN";

/// Opaque administrator credential. Never printed.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AdminToken(String);

impl AdminToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminToken(***)")
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Administrator authorization required")]
    Unauthorized,
    #[error("Server error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("No administrator token configured")]
    MissingAdminToken,
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized
        } else {
            ApiError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Operations the front ends need from the backend.
pub trait ApplicationService {
    fn search_applications(&self, query: &str) -> ApiResult<Vec<Application>>;
    fn get_application(&self, id: &str) -> ApiResult<ApplicationDetail>;
    fn create_application(&self, new: &NewApplication) -> ApiResult<Application>;
    fn update_identity(&self, id: &str, update: &IdentityUpdate) -> ApiResult<()>;
    fn upload_file(&self, application_id: &str, upload: &FileUpload) -> ApiResult<()>;
    fn delete_file(&self, file_id: &str) -> ApiResult<()>;
    fn submit_application(&self, id: &str) -> ApiResult<()>;
    fn admin_set_application_status(&self, id: &str, status: ApplicationStatus) -> ApiResult<()>;
    fn admin_set_file_status(&self, file_id: &str, status: FileStatus) -> ApiResult<()>;
    fn admin_delete_file(&self, file_id: &str) -> ApiResult<()>;
}

/// [`ApplicationService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpApplicationService {
    client: Client,
    base: Url,
    admin_token: Option<AdminToken>,
}

impl HttpApplicationService {
    pub fn new(base_url: &str, admin_token: Option<AdminToken>) -> ApiResult<Self> {
        let base = Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            client: Client::new(),
            base,
            admin_token,
        })
    }

    pub fn has_admin_token(&self) -> bool {
        self.admin_token.is_some()
    }

    /// Joins percent-encoded path segments onto the base URL.
    pub fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn elevated(&self, builder: RequestBuilder) -> ApiResult<RequestBuilder> {
        let token = self.admin_token.as_ref().ok_or(ApiError::MissingAdminToken)?;
        Ok(builder.header(ADMIN_TOKEN_HEADER, token.expose()))
    }

    fn check(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }

    fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let text = Self::check(response)?.text()?;
        Ok(serde_json::from_str(&text)?)
    }

    fn send(builder: RequestBuilder) -> ApiResult<()> {
        Self::check(builder.send()?).map(|_| ())
    }
}

impl ApplicationService for HttpApplicationService {
    fn search_applications(&self, query: &str) -> ApiResult<Vec<Application>> {
        let mut request = self.client.get(self.endpoint(&["applications"])?);
        let trimmed = query.trim();
        if !trimmed.is_empty() {
            request = request.query(&[("search", trimmed)]);
        }
        tracing::debug!(query = trimmed, "searching applications");
        let found: Option<Vec<Application>> = Self::decode(request.send()?)?;
        Ok(found.unwrap_or_default())
    }

    fn get_application(&self, id: &str) -> ApiResult<ApplicationDetail> {
        tracing::debug!(application_id = id, "fetching application");
        let request = self.client.get(self.endpoint(&["applications", id])?);
        Self::decode(request.send()?)
    }

    fn create_application(&self, new: &NewApplication) -> ApiResult<Application> {
        let request = self.client.post(self.endpoint(&["applications"])?).json(new);
        let created: Application = Self::decode(request.send()?)?;
        tracing::info!(application_id = %created.id, "application created");
        Ok(created)
    }

    fn update_identity(&self, id: &str, update: &IdentityUpdate) -> ApiResult<()> {
        tracing::debug!(application_id = id, "updating horse identity");
        Self::send(self.client.patch(self.endpoint(&["applications", id])?).json(update))
    }

    fn upload_file(&self, application_id: &str, upload: &FileUpload) -> ApiResult<()> {
        let mut form = multipart::Form::new()
            .file("file", &upload.path)
            .map_err(|source| ApiError::Io {
                path: upload.path.display().to_string(),
                source,
            })?
            .text("file_type", upload.file_type.as_str());
        if let Some(choice) = &upload.choice {
            form = form.text("choice", choice.clone());
        }
        tracing::info!(
            application_id,
            file_type = %upload.file_type,
            path = %upload.path.display(),
            "uploading file"
        );
        let url = self.endpoint(&["applications", application_id, "files"])?;
        Self::send(self.client.post(url).multipart(form))
    }

    fn delete_file(&self, file_id: &str) -> ApiResult<()> {
        tracing::info!(file_id, "deleting file");
        Self::send(self.client.delete(self.endpoint(&["files", file_id])?))
    }

    fn submit_application(&self, id: &str) -> ApiResult<()> {
        tracing::info!(application_id = id, "submitting application");
        Self::send(self.client.post(self.endpoint(&["applications", id, "submit"])?))
    }

    fn admin_set_application_status(&self, id: &str, status: ApplicationStatus) -> ApiResult<()> {
        let request = self
            .client
            .patch(self.endpoint(&["applications", id])?)
            .query(&[("status", status.as_str())]);
        let request = self.elevated(request)?;
        tracing::info!(application_id = id, status = %status, "setting application status");
        Self::send(request)
    }

    fn admin_set_file_status(&self, file_id: &str, status: FileStatus) -> ApiResult<()> {
        let request = self
            .client
            .patch(self.endpoint(&["files", file_id])?)
            .query(&[("status", status.as_str())]);
        let request = self.elevated(request)?;
        tracing::info!(file_id, status = %status, "setting file status");
        Self::send(request)
    }

    fn admin_delete_file(&self, file_id: &str) -> ApiResult<()> {
        let request = self.elevated(self.client.delete(self.endpoint(&["files", file_id])?))?;
        tracing::info!(file_id, "deleting file as administrator");
        Self::send(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_segments() {
        let service = HttpApplicationService::new("https://api.example.org/api", None).unwrap();
        let url = service.endpoint(&["applications", "42", "files"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.org/api/applications/42/files");
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash_and_encodes() {
        let service = HttpApplicationService::new("https://api.example.org/api/", None).unwrap();
        let url = service.endpoint(&["applications", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.org/api/applications/a%20b%2Fc");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpApplicationService::new("not a url", None),
            Err(ApiError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            HttpApplicationService::new("mailto:admin@example.org", None),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_admin_calls_need_a_token() {
        let service = HttpApplicationService::new("http://127.0.0.1:9/api", None).unwrap();
        assert!(!service.has_admin_token());
        assert!(matches!(service.admin_delete_file("f1"), Err(ApiError::MissingAdminToken)));
        assert!(matches!(
            service.admin_set_file_status("f1", FileStatus::Accepted),
            Err(ApiError::MissingAdminToken)
        ));
        assert!(matches!(
            service.admin_set_application_status("a1", ApplicationStatus::Complete),
            Err(ApiError::MissingAdminToken)
        ));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, "unauthorized\n"),
            ApiError::Unauthorized
        ));
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "horse_year out of range\n");
        assert_eq!(err.to_string(), "Server error 400: horse_year out of range");
        assert!(ApiError::from_status(StatusCode::NOT_FOUND, "not found").is_not_found());
    }

    #[test]
    fn test_token_is_redacted() {
        let token = AdminToken::new("secret123");
        assert_eq!(format!("{:?}", token), "AdminToken(***)");
        assert_eq!(token.expose(), "secret123");
    }
}
