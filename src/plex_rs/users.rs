use std::collections::{BTreeMap, HashMap};

use reqwest::Client;
use url::Url;

use super::{PlexError, check_status};

/// Fetches an XML document from plex.tv. These endpoints do not offer JSON.
async fn get_plex_tv_xml(
    client: &Client,
    plex_tv_url: &Url,
    path: &str,
    owner_token: &str,
) -> Result<String, PlexError> {
    let url = plex_tv_url.join(path)?;

    let res = client
        .get(url)
        .header("Accept", "application/xml")
        .header("X-Plex-Token", owner_token)
        .send()
        .await?;
    let res = check_status(res).await?;

    Ok(res.text().await?)
}

/// Maps plex.tv user ids to a login name.
///
/// Managed users have an empty `username`, so their `title` is used instead.
pub fn parse_user_names(xml: &str) -> Result<HashMap<String, String>, PlexError> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| PlexError::Parse(format!("Invalid plex.tv users XML: {}", e)))?;

    let users = doc
        .descendants()
        .filter(|node| node.has_tag_name("User"))
        .filter_map(|node| {
            let id = node.attribute("id")?;
            let name = node
                .attribute("username")
                .filter(|username| !username.is_empty())
                .or_else(|| node.attribute("title"))?;
            Some((id.to_string(), name.to_string()))
        })
        .collect();

    Ok(users)
}

/// Lists `(user id, access token)` pairs for every account the server is
/// shared with.
pub fn parse_shared_server_tokens(xml: &str) -> Result<Vec<(String, String)>, PlexError> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| PlexError::Parse(format!("Invalid plex.tv shared servers XML: {}", e)))?;

    let tokens = doc
        .descendants()
        .filter(|node| node.has_tag_name("SharedServer"))
        .filter_map(|node| {
            let user_id = node.attribute("userID")?;
            let token = node.attribute("accessToken")?;
            Some((user_id.to_string(), token.to_string()))
        })
        .collect();

    Ok(tokens)
}

/// Builds the directory of accounts that share the server identified by
/// `machine_identifier`, keyed by login name, with each account's delegated
/// access token for that server.
pub async fn get_shared_accounts(
    client: &Client,
    plex_tv_url: &Url,
    owner_token: &str,
    machine_identifier: &str,
) -> Result<BTreeMap<String, String>, PlexError> {
    let users_xml = get_plex_tv_xml(client, plex_tv_url, "api/users", owner_token).await?;
    let user_names = parse_user_names(&users_xml)?;

    let shared_xml = get_plex_tv_xml(
        client,
        plex_tv_url,
        &format!("api/servers/{}/shared_servers", machine_identifier),
        owner_token,
    )
    .await?;

    let mut accounts = BTreeMap::new();
    for (user_id, token) in parse_shared_server_tokens(&shared_xml)? {
        match user_names.get(&user_id) {
            Some(name) => {
                accounts.insert(name.clone(), token);
            }
            None => log::warn!(
                "Server is shared with unknown plex.tv user id {}, skipping",
                user_id
            ),
        }
    }

    Ok(accounts)
}
