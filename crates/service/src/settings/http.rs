//! Reqwest-backed settings store.
//!
//! Talks to the administration service's `_apis/Settings/Entries` surface.
//! This adapter owns transport details only: URL construction, auth header,
//! timeout, HTTP error mapping and JSON decoding.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use super::{check_key, Entries, SettingsError, SettingsStore, UserScope};

pub const DEFAULT_API_VERSION: &str = "5.0-preview.1";

/// Settings store that performs one HTTP request per operation against an organization URL.
#[derive(Clone)]
pub struct HttpSettingsStore {
    client: Client,
    organization: Url,
    token: Option<String>,
    api_version: String,
}

#[derive(Deserialize)]
struct EntriesEnvelope {
    #[serde(default)]
    value: Option<Entries>,
}

#[derive(Deserialize)]
struct ServiceErrorBody {
    message: Option<String>,
}

impl HttpSettingsStore {
    /// Build the store for `organization` (e.g. `https://dev.example.com/acme`).
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is unusable or the reqwest client cannot be constructed.
    pub fn new(
        organization: &str,
        token: Option<String>,
        api_version: &str,
        timeout: Duration,
    ) -> Result<Self, SettingsError> {
        let organization = Url::parse(organization.trim_end_matches('/'))
            .map_err(|e| SettingsError::Transport(format!("invalid organization URL: {e}")))?;
        if organization.cannot_be_a_base() {
            return Err(SettingsError::Transport(format!(
                "invalid organization URL: {organization}"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SettingsError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            organization,
            token: token.filter(|t| !t.is_empty()),
            api_version: api_version.to_string(),
        })
    }

    /// `{org}/_apis/Settings/Entries/{scope}[/{key segments}]?api-version=V`
    fn entries_url(&self, scope: UserScope, key: Option<&str>) -> Result<Url, SettingsError> {
        if let Some(key) = key {
            check_key(key)?;
        }
        let mut url = self.organization.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SettingsError::Transport("organization URL cannot be a base".into()))?;
            segments.pop_if_empty().extend(["_apis", "Settings", "Entries", scope.as_str()]);
            if let Some(key) = key {
                segments.extend(key.split('/'));
            }
        }
        url.query_pairs_mut().append_pair("api-version", &self.api_version);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Entries>,
    ) -> Result<Vec<u8>, SettingsError> {
        debug!(%method, %url, "settings request");
        let mut request = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.basic_auth("", Some(token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, &bytes));
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SettingsStore for HttpSettingsStore {
    async fn list(&self, scope: UserScope, key: &str) -> Result<Entries, SettingsError> {
        check_key(key)?;
        let url = self.entries_url(scope, Some(key))?;
        let body = self.send(Method::GET, url, None).await?;
        let entries = parse_entries(&body)?;
        debug!(%scope, key, count = entries.len(), "listed settings");
        Ok(entries)
    }

    async fn add_or_update(&self, scope: UserScope, entries: Entries) -> Result<(), SettingsError> {
        for key in entries.keys() {
            check_key(key)?;
        }
        let url = self.entries_url(scope, None)?;
        self.send(Method::PATCH, url, Some(&entries)).await?;
        debug!(%scope, count = entries.len(), "wrote settings");
        Ok(())
    }

    async fn remove(&self, scope: UserScope, key: &str) -> Result<(), SettingsError> {
        check_key(key)?;
        let url = self.entries_url(scope, Some(key))?;
        self.send(Method::DELETE, url, None).await?;
        debug!(%scope, key, "removed setting");
        Ok(())
    }
}

fn parse_entries(body: &[u8]) -> Result<Entries, SettingsError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Entries::new());
    }
    let envelope: EntriesEnvelope =
        serde_json::from_slice(body).map_err(|e| SettingsError::Decode(e.to_string()))?;
    Ok(envelope.value.unwrap_or_default())
}

fn map_transport_error(error: reqwest::Error) -> SettingsError {
    if error.is_timeout() {
        return SettingsError::Transport(format!("request timed out: {error}"));
    }
    SettingsError::Transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> SettingsError {
    let message = serde_json::from_slice::<ServiceErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            if text.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            }
        });
    SettingsError::Status { status: status.as_u16(), message }
}
