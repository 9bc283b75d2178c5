use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding `index.html` and the other static assets.
    pub static_dir: PathBuf,
    /// Take the client address from `X-Forwarded-For` and friends instead of
    /// the TCP peer. The API listener terminates TLS itself, so the peer is
    /// the client; only enable behind a proxy that overwrites these headers.
    pub trust_proxy_headers: bool,
    /// Maximum accepted request body, in bytes.
    pub body_limit: usize,
}

/// PEM files for the API listener. All three must exist at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct TlsConfig {
    /// Private key (PKCS#8, PKCS#1 or SEC1).
    pub key: PathBuf,
    /// Server certificate.
    pub cert: PathBuf,
    /// Intermediate/CA certificates sent after `cert` in the chain.
    pub ca: PathBuf,
}

/// Plaintext listener that sends every request to the HTTPS origin.
#[derive(Debug, Deserialize, Clone)]
pub struct RedirectConfig {
    pub enabled: bool,
    pub port: u16,
    /// Port used in the redirect target. Omitted from the URL when 443.
    pub https_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Deserialize, Clone)]
pub struct IdentityConfig {
    pub pepper: String,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("pepper", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    /// Number of links an identity may own before creation is refused.
    pub max_links_per_identity: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_links_per_identity: 50,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub tls: TlsConfig,
    pub redirect: RedirectConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub limits: LimitsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8443)?
            .set_default("server.static_dir", "static")?
            .set_default("server.trust_proxy_headers", false)?
            .set_default("server.body_limit", 16 * 1024)?
            .set_default("redirect.enabled", true)?
            .set_default("redirect.port", 8080)?
            .set_default("redirect.https_port", 8443)?
            .set_default("database.max_connections", 100)?
            .set_default("limits.max_links_per_identity", 50)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., LINKBOARD__TLS__CERT)
            .add_source(Environment::with_prefix("LINKBOARD").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that deserialize fine but cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.pepper.is_empty() {
            return Err(ConfigError::Message(
                "identity.pepper must not be empty".into(),
            ));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Message("database.url must not be empty".into()));
        }
        for (name, path) in [
            ("tls.key", &self.tls.key),
            ("tls.cert", &self.tls.cert),
            ("tls.ca", &self.tls.ca),
        ] {
            if !path.is_file() {
                return Err(ConfigError::Message(format!(
                    "{name} does not point to a file: {}",
                    path.display()
                )));
            }
        }
        if self.limits.max_links_per_identity == 0 {
            return Err(ConfigError::Message(
                "limits.max_links_per_identity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
