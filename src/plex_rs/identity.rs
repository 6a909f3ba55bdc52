use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{PlexError, read_json, with_token};

/* ---------- Identity (machineIdentifier) ---------- */

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlexIdentity {
    #[serde(rename = "machineIdentifier")]
    pub machine_identifier: String,

    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlexIdentityResponse {
    #[serde(rename = "MediaContainer")]
    media_container: PlexIdentity,
}

/// Fetches the machine identifier and version of the server at `base_url`.
///
/// The identity endpoint puts its attributes on the container itself rather
/// than in `Metadata`.
pub async fn get_server_identity(
    client: &Client,
    base_url: &Url,
    user_token: &str,
) -> Result<PlexIdentity, PlexError> {
    let url = base_url.join("identity")?;

    let res = with_token(client.get(url), user_token).send().await?;
    let identity = read_json::<PlexIdentityResponse>(res, "Plex identity response").await?;

    Ok(identity.media_container)
}
