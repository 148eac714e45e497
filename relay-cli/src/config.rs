//! Configuration module
//!
//! Settings shared by every command.

use anyhow::Result;
use relay_client::OrchestratorClient;

pub const DEFAULT_ORCHESTRATOR_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone)]
pub struct Config {
    /// Orchestrator base URL with a scheme and no trailing slash
    pub orchestrator_url: String,
}

impl Config {
    /// Build the config from a user-supplied orchestrator address
    ///
    /// Accepts bare `host:port` addresses (assumed `http`) and tolerates
    /// trailing slashes, so `localhost:8080/` and `http://localhost:8080`
    /// reach the same routes.
    pub fn new(orchestrator_url: &str) -> Result<Self> {
        let url = orchestrator_url.trim().trim_end_matches('/');
        if url.is_empty() {
            anyhow::bail!("orchestrator URL must not be empty");
        }

        let orchestrator_url = if url.contains("://") {
            url.to_string()
        } else {
            format!("http://{}", url)
        };

        Ok(Self { orchestrator_url })
    }

    pub fn client(&self) -> OrchestratorClient {
        OrchestratorClient::new(&self.orchestrator_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url_is_kept() {
        let config = Config::new(DEFAULT_ORCHESTRATOR_URL).unwrap();
        assert_eq!(config.orchestrator_url, "http://localhost:8080");
    }

    #[test]
    fn test_bare_address_gets_http_scheme() {
        let config = Config::new("orchestrator.internal:9000").unwrap();
        assert_eq!(config.orchestrator_url, "http://orchestrator.internal:9000");
    }

    #[test]
    fn test_trailing_slashes_are_dropped() {
        let config = Config::new(" https://relay.example.com// ").unwrap();
        assert_eq!(config.orchestrator_url, "https://relay.example.com");
    }

    #[test]
    fn test_empty_url_is_rejected() {
        assert!(Config::new("").is_err());
        assert!(Config::new(" / ").is_err());
    }
}
