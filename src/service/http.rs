use anyhow::Context;
use reqwest::Client;
use url::Url;

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};

/// Build the HTTP client every fetch of a run goes through.
pub fn create_client(config: &SyncConfig) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .connect_timeout(config.connect_timeout())
        .user_agent(config.user_agent.clone())
        .build()
        .context("Failed to build HTTP client")
}

/// Fetches profile pages as `<base>/name/<identifier>/`.
pub struct ProfileFetcher {
    client: Client,
    base_url: Url,
}

impl ProfileFetcher {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = create_client(config).map_err(|e| SyncError::fatal(format!("{:#}", e)))?;
        let mut base_url = config.provider_url()?;
        // A base path without a trailing slash would lose its last segment on join
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { client, base_url })
    }

    /// `<base>/name/<identifier>/`, keeping any path the base carries.
    pub fn profile_url(&self, identifier: &str) -> Result<Url> {
        self.base_url
            .join(&format!("name/{}/", identifier))
            .map_err(|e| SyncError::transport(identifier, None, format!("invalid profile URL: {}", e)))
    }

    /// GET the profile page. Anything but a 2xx is a transport failure.
    pub async fn fetch(&self, identifier: &str) -> Result<String> {
        let url = self.profile_url(identifier)?;
        log::trace!("[FETCH] GET {}", url);

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| SyncError::transport(url.as_str(), None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::transport(
                url.as_str(),
                Some(status.as_u16()),
                format!("HTTP {}", status),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SyncError::transport(url.as_str(), Some(status.as_u16()), e.to_string()))?;
        log::trace!("[FETCH] Received {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher_for(server: &mockito::Server) -> ProfileFetcher {
        let config = SyncConfig::new("sqlite::memory:").with_provider(server.url());
        ProfileFetcher::new(&config).unwrap()
    }

    #[test]
    fn test_profile_url_shape() {
        let config = SyncConfig::new("sqlite::memory:");
        let fetcher = ProfileFetcher::new(&config).unwrap();
        assert_eq!(
            fetcher.profile_url("nm0000123").unwrap().as_str(),
            "https://www.imdb.com/name/nm0000123/"
        );
    }

    #[test]
    fn test_profile_url_keeps_base_path() {
        for base in ["https://mirror.example/imdb/", "https://mirror.example/imdb"] {
            let config = SyncConfig::new("sqlite::memory:").with_provider(base);
            let fetcher = ProfileFetcher::new(&config).unwrap();
            assert_eq!(
                fetcher.profile_url("nm1").unwrap().as_str(),
                "https://mirror.example/imdb/name/nm1/",
                "base {}",
                base
            );
        }
    }

    #[tokio::test]
    async fn test_fetch_sends_user_agent_and_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/name/nm1/")
            .match_header("user-agent", "credit-sync-test/1.0")
            .with_status(200)
            .with_body("<html>ok</html>")
            .create_async()
            .await;

        let mut config = SyncConfig::new("sqlite::memory:").with_provider(server.url());
        config.user_agent = "credit-sync-test/1.0".into();
        let fetcher = ProfileFetcher::new(&config).unwrap();

        assert_eq!(fetcher.fetch("nm1").await.unwrap(), "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/name/nm404/")
            .with_status(404)
            .create_async()
            .await;

        let err = fetcher_for(&server).fetch("nm404").await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::TransportFailure {
                status: Some(404),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_redirect_target_must_succeed() {
        let mut server = mockito::Server::new_async().await;
        let _moved = server
            .mock("GET", "/name/nm2/")
            .with_status(301)
            .with_header("location", "/name/nm3/")
            .create_async()
            .await;
        let _target = server
            .mock("GET", "/name/nm3/")
            .with_status(503)
            .create_async()
            .await;

        let err = fetcher_for(&server).fetch("nm2").await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::TransportFailure {
                status: Some(503),
                ..
            }
        ));
    }
}
