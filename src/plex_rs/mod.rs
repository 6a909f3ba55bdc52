use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;

pub mod identity;
pub mod playlist;
pub mod users;

/// Docs:
/// https://developer.plex.tv/pms/#section/API-Info/Authenticating-with-Plex
pub const PLEX_TV_URL: &str = "https://plex.tv";

#[derive(Debug, thiserror::Error)]
pub enum PlexError {
    #[error("Plex resource not found: {0}")]
    NotFound(String),
    #[error("Plex returned {status} for {url}: {body}")]
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },
    #[error("Failed to send http request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Failed to parse Plex response: {0}")]
    Parse(String),
    #[error("Invalid Plex URL: {0}")]
    Url(#[from] url::ParseError),
}

/* ---------- Core response envelope ---------- */

#[derive(Debug, Clone, Deserialize)]
pub struct PlexResponse<T> {
    #[serde(rename = "MediaContainer")]
    pub media_container: PlexMediaContainer<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlexMediaContainer<T> {
    // Plex omits `Metadata` entirely for empty containers.
    #[serde(rename = "Metadata", default = "Vec::new")]
    pub metadata: Vec<T>,
}

/// Attaches the headers every Plex request carries.
pub(crate) fn with_token(request: RequestBuilder, token: &str) -> RequestBuilder {
    request
        .header("Accept", "application/json")
        .header("X-Plex-Token", token)
}

/// Maps 404 to [`PlexError::NotFound`] and any other non-2xx reply to
/// [`PlexError::Status`], keeping the body for the log.
pub(crate) async fn check_status(res: Response) -> Result<Response, PlexError> {
    let status = res.status();
    let url = res.url().to_string();

    if status == StatusCode::NOT_FOUND {
        return Err(PlexError::NotFound(url));
    }
    if !status.is_success() {
        let body = res
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error text".to_string());
        return Err(PlexError::Status { status, url, body });
    }
    Ok(res)
}

/// Reads a successful reply as a JSON Plex envelope.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    res: Response,
    what: &str,
) -> Result<T, PlexError> {
    let res = check_status(res).await?;
    res.json::<T>()
        .await
        .map_err(|e| PlexError::Parse(format!("Failed to deserialize {}: {}", what, e)))
}
