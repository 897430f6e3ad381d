//! rolesync configuration (`rolesync.toml`)

use anyhow::{Context, Result, bail};
use memberkit::{MemberSet, Ownership};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Main Config Schema
// ============================================================================

/// The rolesync configuration file
#[derive(Debug, Serialize, Deserialize)]
pub struct RolesyncConfig {
    /// Nexus server connection
    pub server: ServerConfig,

    /// Declared role assignments, one per user
    #[serde(default)]
    pub user_roles: Vec<UserRoleConfig>,
}

impl RolesyncConfig {
    /// Load and validate the config file at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        log::debug!(
            "Loaded {} user role assignments from {}",
            config.user_roles.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse and validate config from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid TOML format")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.server.validate().context("Invalid [server] section")?;

        let mut seen = HashSet::new();
        for entry in &self.user_roles {
            entry.validate()?;
            if !seen.insert(entry.userid.as_str()) {
                bail!("User '{}' is declared more than once", entry.userid);
            }
        }

        Ok(())
    }

    /// Find the declared roles for a user
    pub fn find_user(&self, userid: &str) -> Option<&UserRoleConfig> {
        self.user_roles.iter().find(|u| u.userid == userid)
    }
}

// ============================================================================
// Server
// ============================================================================

/// Where the Nexus server is and how to log in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL, e.g. `http://localhost:8081`
    pub url: String,

    /// User for HTTP basic auth
    #[serde(default)]
    pub username: Option<String>,

    /// Name of the environment variable holding the password
    #[serde(default)]
    pub password_env: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl ServerConfig {
    /// Validate the server section
    pub fn validate(&self) -> Result<()> {
        let uri: ureq::http::Uri = self
            .url
            .parse()
            .with_context(|| format!("'{}' is not a valid URL", self.url))?;

        match uri.scheme_str() {
            Some("http" | "https") => {}
            _ => bail!("url '{}' must start with http:// or https://", self.url),
        }
        if uri.host().is_none_or(str::is_empty) {
            bail!("url '{}' has no host", self.url);
        }

        if self.password_env.is_some() && self.username.is_none() {
            bail!("password_env is set but username is missing");
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }

        Ok(())
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Username and password, if basic auth is configured
    ///
    /// Reads the password from the environment at call time.
    pub fn credentials(&self) -> Result<Option<(String, String)>> {
        let Some(username) = &self.username else {
            return Ok(None);
        };

        let password = match &self.password_env {
            Some(var) => std::env::var(var)
                .with_context(|| format!("Environment variable {var} (password_env) is not set"))?,
            None => String::new(),
        };

        Ok(Some((username.clone(), password)))
    }
}

// ============================================================================
// User Roles
// ============================================================================

/// Roles this configuration manages on one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleConfig {
    /// Nexus user id
    pub userid: String,

    /// Roles to keep assigned; duplicates collapse
    #[serde(default)]
    pub roles: MemberSet,

    /// Whether other actors may also assign roles to this user
    #[serde(default)]
    pub ownership: Ownership,
}

impl UserRoleConfig {
    /// Validate one entry
    pub fn validate(&self) -> Result<()> {
        if self.userid.trim().is_empty() {
            bail!("user_roles entry has an empty userid");
        }
        if self.roles.iter().any(|r| r.trim().is_empty()) {
            bail!("User '{}' has an empty role name", self.userid);
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[server]
url = "http://localhost:8081"
username = "admin"
password_env = "ROLESYNC_TEST_PASSWORD_UNSET"

[[user_roles]]
userid = "jdoe"
roles = ["nx-dev", "nx-deploy", "nx-dev"]

[[user_roles]]
userid = "ci.bot"
roles = ["nx-deploy"]
ownership = "exclusive"
"#;

    #[test]
    fn test_parse_sample() {
        let config = RolesyncConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.server.timeout_secs, 30);
        assert_eq!(config.user_roles.len(), 2);

        let jdoe = config.find_user("jdoe").unwrap();
        assert_eq!(jdoe.roles.len(), 2);
        assert_eq!(jdoe.ownership, Ownership::Shared);

        let bot = config.find_user("ci.bot").unwrap();
        assert_eq!(bot.ownership, Ownership::Exclusive);
    }

    #[test]
    fn test_empty_roles_allowed() {
        let config = RolesyncConfig::parse(
            r#"
[server]
url = "https://nexus.example.com"

[[user_roles]]
userid = "jdoe"
"#,
        )
        .unwrap();
        assert!(config.user_roles[0].roles.is_empty());
    }

    #[test]
    fn test_duplicate_user_rejected() {
        let err = RolesyncConfig::parse(
            r#"
[server]
url = "http://localhost:8081"

[[user_roles]]
userid = "jdoe"
roles = ["a"]

[[user_roles]]
userid = "jdoe"
roles = ["b"]
"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("more than once"));
    }

    #[test]
    fn test_empty_userid_rejected() {
        let result = RolesyncConfig::parse(
            r#"
[server]
url = "http://localhost:8081"

[[user_roles]]
userid = " "
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_urls_rejected() {
        for url in ["localhost:8081", "ftp://nexus", "not a url"] {
            let server = ServerConfig {
                url: url.to_string(),
                username: None,
                password_env: None,
                timeout_secs: 30,
            };
            assert!(server.validate().is_err(), "{url} should be rejected");
        }
    }

    #[test]
    fn test_unknown_ownership_rejected() {
        let result = RolesyncConfig::parse(
            r#"
[server]
url = "http://localhost:8081"

[[user_roles]]
userid = "jdoe"
ownership = "mine"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_credentials() {
        let config = RolesyncConfig::parse(SAMPLE).unwrap();
        let err = config.server.credentials().unwrap_err();
        assert!(err.to_string().contains("ROLESYNC_TEST_PASSWORD_UNSET"));

        let anonymous = ServerConfig {
            url: "http://localhost:8081".into(),
            username: None,
            password_env: None,
            timeout_secs: 30,
        };
        assert!(anonymous.credentials().unwrap().is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RolesyncConfig::load(&dir.path().join("rolesync.toml")).unwrap_err();
        assert!(err.to_string().contains("Could not read config file"));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rolesync.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = RolesyncConfig::load(&path).unwrap();
        assert_eq!(config.server.username.as_deref(), Some("admin"));
    }
}
