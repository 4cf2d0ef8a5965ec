use reqwest::{Response, StatusCode};
use thiserror::Error;

/// Failure talking to a third-party HTTP API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("failed to call {service}: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} API error: status code {status}, response: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("failed to parse {service} response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid {service} URL: {source}")]
    Url {
        service: &'static str,
        #[source]
        source: url::ParseError,
    },
}

impl UpstreamError {
    pub(crate) const fn transport(service: &'static str, source: reqwest::Error) -> Self {
        Self::Transport { service, source }
    }

    pub(crate) const fn decode(service: &'static str, source: reqwest::Error) -> Self {
        Self::Decode { service, source }
    }

    pub(crate) const fn url(service: &'static str, source: url::ParseError) -> Self {
        Self::Url { service, source }
    }

    /// Status code returned by the upstream, if it answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Passes 2xx responses through; anything else becomes [`UpstreamError::Status`]
/// carrying the body for diagnosis.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: Response,
) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::Status {
        service,
        status,
        body,
    })
}
