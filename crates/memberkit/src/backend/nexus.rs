//! Nexus Repository Manager security API backend.
//!
//! Users are read with `GET /service/rest/v1/security/users?userId=<id>`,
//! which returns every user whose id *starts with* the query, so the exact
//! match is picked out locally. Writes go through
//! `PUT /service/rest/v1/security/users/<id>` with the whole user object.
//!
//! No retries happen here: every failure is returned as-is.

use crate::backend::EntityStore;
use crate::error::{Error, Result};
use crate::types::User;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::time::Duration;

/// Path of the users endpoint below the server base URL.
const USERS_PATH: &str = "/service/rest/v1/security/users";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Entity store backed by a Nexus server.
///
/// # Example
///
/// ```no_run
/// use memberkit::backend::{EntityStore, nexus::NexusStore};
///
/// let store = NexusStore::new("http://localhost:8081").with_credentials("admin", "admin123");
/// if let Some(user) = store.get("jdoe").unwrap() {
///     println!("{} has roles {}", user.user_id, user.roles);
/// }
/// ```
pub struct NexusStore {
    agent: ureq::Agent,
    base_url: String,
    authorization: Option<String>,
}

impl NexusStore {
    /// Create a store for the server at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            agent: build_agent(DEFAULT_TIMEOUT),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            authorization: None,
        }
    }

    /// Use HTTP basic authentication.
    #[must_use]
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        let token = STANDARD.encode(format!("{username}:{password}"));
        self.authorization = Some(format!("Basic {token}"));
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    /// Server base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn users_url(&self) -> String {
        format!("{}{}", self.base_url, USERS_PATH)
    }

    fn user_url(&self, key: &str) -> String {
        format!("{}{}/{}", self.base_url, USERS_PATH, urlencoding::encode(key))
    }

    fn transport_error(url: &str, err: &ureq::Error) -> Error {
        Error::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

impl EntityStore for NexusStore {
    fn get(&self, key: &str) -> Result<Option<User>> {
        let url = self.users_url();
        log::debug!("GET {url}?userId={key}");

        let mut request = self
            .agent
            .get(&url)
            .query("userId", key)
            .header("Accept", "application/json");
        if let Some(auth) = &self.authorization {
            request = request.header("Authorization", auth);
        }

        let mut response = request
            .call()
            .map_err(|e| Self::transport_error(&url, &e))?;
        let status = response.status().as_u16();

        if status == 404 {
            return Ok(None);
        }
        if !(200..300).contains(&status) {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(Error::http(url, status, body.trim()));
        }

        let users: Vec<User> =
            response
                .body_mut()
                .read_json()
                .map_err(|e| Error::InvalidResponse {
                    url: url.clone(),
                    message: e.to_string(),
                })?;

        Ok(pick_exact(users, key))
    }

    fn replace(&self, key: &str, user: &User) -> Result<()> {
        let url = self.user_url(key);
        log::debug!("PUT {url} roles=[{}]", user.roles);

        let mut request = self
            .agent
            .put(&url)
            .header("Accept", "application/json");
        if let Some(auth) = &self.authorization {
            request = request.header("Authorization", auth);
        }

        let mut response = request
            .send_json(user)
            .map_err(|e| Self::transport_error(&url, &e))?;
        let status = response.status().as_u16();

        if !(200..300).contains(&status) {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(Error::http(url, status, body.trim()));
        }

        Ok(())
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build();
    config.into()
}

/// The search endpoint is a prefix match; keep only the exact id.
fn pick_exact(users: Vec<User>, key: &str) -> Option<User> {
    users.into_iter().find(|u| u.user_id == key)
}
