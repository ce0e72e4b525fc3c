//! GitHub API repository provider: repo metadata and HEAD source
//! tarballs.

use std::env;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};

use crate::repo_health::RepoRef;

use super::{ProviderError, RepoInfo, RepositoryProvider};

const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const API_BASE_URL_VAR: &str = "PRETRUST_GITHUB_API_BASE_URL";
const TOKEN_VAR: &str = "GITHUB_TOKEN";
const USER_AGENT: &str = concat!("pretrust/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct GithubProvider {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl GithubProvider {
    pub fn new(http: Client) -> Self {
        let base_url =
            env::var(API_BASE_URL_VAR).unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        Self::with_base_url(http, base_url)
    }

    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            token: env::var(TOKEN_VAR).ok().filter(|token| !token.is_empty()),
        }
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .get(url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }
}

#[async_trait]
impl RepositoryProvider for GithubProvider {
    async fn fetch_repo_info(&self, repo: &RepoRef) -> Result<RepoInfo, ProviderError> {
        let url = format!(
            "{}/repos/{}/{}",
            self.base_url.trim_end_matches('/'),
            repo.owner,
            repo.repo
        );
        let response = self
            .request(&url)
            .send()
            .await
            .map_err(|err| ProviderError::transport("unable to query repository host", err))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ProviderError::PackageNotFound {
                package: format!("{}/{}", repo.owner, repo.repo),
            });
        }
        if !response.status().is_success() {
            return Err(ProviderError::Transport {
                message: format!("repository host returned status {}", response.status()),
            });
        }

        response
            .json()
            .await
            .map_err(|err| ProviderError::InvalidResponse {
                message: format!("failed to parse repository JSON: {err}"),
            })
    }

    async fn download_tarball(&self, repo: &RepoRef) -> Result<Vec<u8>, ProviderError> {
        let url = format!(
            "{}/repos/{}/{}/tarball",
            self.base_url.trim_end_matches('/'),
            repo.owner,
            repo.repo
        );
        let response = self
            .request(&url)
            .send()
            .await
            .map_err(|err| ProviderError::transport("unable to download source tarball", err))?;

        if !response.status().is_success() {
            return Err(ProviderError::Transport {
                message: format!("source tarball download returned status {}", response.status()),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ProviderError::transport("source tarball download truncated", err))?;
        Ok(bytes.to_vec())
    }
}
