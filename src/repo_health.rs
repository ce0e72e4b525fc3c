//! Source-repository URL parsing and the repository health probe.

use tracing::debug;

use crate::providers::{RepoInfo, RepositoryProvider};
use crate::types::RepoHealth;

/// A parsed `{owner}/{repo}` reference on the canonical host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

const CANONICAL_HOSTS: [&str; 2] = ["github.com", "www.github.com"];

/// Normalizes the repository URL shapes seen in package manifests:
/// `https://host/owner/repo[.git]`, `git+…`, `git://…`, `ssh://git@…`,
/// and the `github:owner/repo` shorthand. Non-canonical hosts are
/// rejected.
pub fn parse_repo_url(raw: &str) -> Option<RepoRef> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(shorthand) = trimmed.strip_prefix("github:") {
        return split_owner_repo(shorthand);
    }

    let without_git_prefix = trimmed.strip_prefix("git+").unwrap_or(trimmed);
    let normalized = if let Some(rest) = without_git_prefix.strip_prefix("git://") {
        format!("https://{rest}")
    } else if let Some(rest) = without_git_prefix.strip_prefix("ssh://git@") {
        format!("https://{rest}")
    } else {
        without_git_prefix.to_string()
    };

    let parsed = url::Url::parse(&normalized).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    if !CANONICAL_HOSTS.contains(&host.as_str()) {
        return None;
    }
    split_owner_repo(parsed.path().trim_matches('/'))
}

fn split_owner_repo(path: &str) -> Option<RepoRef> {
    let mut segments = path.trim_matches('/').split('/');
    let owner = segments.next()?.trim();
    let repo = segments.next()?.trim().trim_end_matches(".git");
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some(RepoRef {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

/// Queries the repository provider and folds the answer into a
/// `RepoHealth`. Every failure mode degrades to `{found: false}`.
pub async fn probe(
    provider: &dyn RepositoryProvider,
    repository_url: &str,
    publisher: Option<&str>,
) -> RepoHealth {
    let Some(repo_ref) = parse_repo_url(repository_url) else {
        debug!(url = repository_url, "unrecognized repository URL");
        return RepoHealth::not_found();
    };

    match provider.fetch_repo_info(&repo_ref).await {
        Ok(info) => health_from_info(&repo_ref, info, publisher),
        Err(err) => {
            debug!(
                owner = %repo_ref.owner,
                repo = %repo_ref.repo,
                error = %err,
                "repository lookup failed"
            );
            RepoHealth::not_found()
        }
    }
}

fn health_from_info(repo_ref: &RepoRef, info: RepoInfo, publisher: Option<&str>) -> RepoHealth {
    let publisher_matches_owner = publisher
        .is_some_and(|publisher| publisher.eq_ignore_ascii_case(&repo_ref.owner));
    RepoHealth {
        found: true,
        full_name: info.full_name,
        stars: info.stargazers_count,
        forks: info.forks_count,
        open_issues: info.open_issues_count,
        license: info.license.and_then(|license| license.spdx_id),
        created_at: info.created_at,
        pushed_at: info.pushed_at,
        archived: info.archived,
        publisher_matches_owner,
    }
}

#[cfg(test)]
#[path = "repo_health_tests.rs"]
mod tests;
