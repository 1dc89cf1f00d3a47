//! GitLab adapter.
//!
//! Every list is a single request of [`PAGE_SIZE`] items. Any continuation
//! the server advertises is ignored, so groups and users with more than
//! [`PAGE_SIZE`] members or projects come back truncated.

use crate::error::Result;
use crate::provider::http::{AuthStyle, HttpFetcher};
use crate::provider::page::{PageFetcher, Paginator, decode_pages};
use crate::provider::{RemoteIdentity, RemoteRepository, RepoProvider};
use serde::Deserialize;

/// Items requested per list call.
pub const PAGE_SIZE: usize = 100;

const API_BASE: &str = "https://gitlab.com/api/v4";
const WEB_HOST: &str = "https://gitlab.com";

#[derive(Debug, Deserialize)]
struct Member {
    username: String,
}

#[derive(Debug, Default, Deserialize)]
struct Owner {
    #[serde(default)]
    username: String,
}

#[derive(Debug, Default, Deserialize)]
struct Namespace {
    #[serde(default)]
    full_path: String,
}

/// Project record from the GitLab API. `repository_size` is in bytes.
#[derive(Debug, Deserialize)]
struct Project {
    name: String,
    #[serde(default)]
    fork: bool,
    #[serde(default)]
    forked_from_project: Option<serde_json::Value>,
    #[serde(default)]
    repository_size: u64,
    #[serde(default)]
    owner: Option<Owner>,
    #[serde(default)]
    namespace: Option<Namespace>,
}

impl From<Project> for RemoteRepository {
    fn from(project: Project) -> Self {
        let owner_login = project
            .owner
            .map(|o| o.username)
            .filter(|u| !u.is_empty())
            .or_else(|| project.namespace.map(|n| n.full_path))
            .unwrap_or_default();
        Self {
            name: project.name,
            is_fork: project.fork || project.forked_from_project.is_some(),
            size_kb: project.repository_size / 1024,
            owner_login,
        }
    }
}

/// GitLab groups, fetched one page deep.
pub struct GitLabProvider<F = HttpFetcher> {
    fetcher: F,
    api_base: String,
    web_host: String,
}

impl GitLabProvider<HttpFetcher> {
    /// Creates an adapter for gitlab.com. Public groups can be read without a token.
    pub fn new(token: &str) -> Result<Self> {
        Ok(Self::with_fetcher(HttpFetcher::new(
            token,
            AuthStyle::PrivateToken,
        )?))
    }
}

impl<F: PageFetcher> GitLabProvider<F> {
    /// Creates an adapter on top of any page fetcher.
    pub fn with_fetcher(fetcher: F) -> Self {
        Self {
            fetcher,
            api_base: API_BASE.into(),
            web_host: WEB_HOST.into(),
        }
    }

    /// Points the adapter at a self-hosted instance's `/api/v4`.
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the host used for repository URLs.
    pub fn web_host(mut self, url: impl Into<String>) -> Self {
        self.web_host = url.into().trim_end_matches('/').to_string();
        self
    }

    fn fetch_first_page<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>> {
        let start = format!("{}{}", self.api_base, endpoint);
        let pages = Paginator::new(&self.fetcher, start)
            .max_pages(1)
            .collect_all()?;
        decode_pages(&pages)
    }
}

impl<F: PageFetcher> RepoProvider for GitLabProvider<F> {
    fn list_members(&self, group: &str) -> Result<Vec<RemoteIdentity>> {
        let endpoint = format!(
            "/groups/{}/members?per_page={}",
            urlencoding::encode(group),
            PAGE_SIZE
        );
        let members: Vec<Member> = self.fetch_first_page(&endpoint)?;
        Ok(members.into_iter().map(|m| m.username).collect())
    }

    fn list_org_repositories(&self, group: &str) -> Result<Vec<RemoteRepository>> {
        let endpoint = format!(
            "/groups/{}/projects?per_page={}",
            urlencoding::encode(group),
            PAGE_SIZE
        );
        let projects: Vec<Project> = self.fetch_first_page(&endpoint)?;
        Ok(projects.into_iter().map(Into::into).collect())
    }

    fn list_user_repositories(&self, user: &str) -> Result<Vec<RemoteRepository>> {
        let endpoint = format!(
            "/users/{}/projects?per_page={}",
            urlencoding::encode(user),
            PAGE_SIZE
        );
        let projects: Vec<Project> = self.fetch_first_page(&endpoint)?;
        Ok(projects.into_iter().map(Into::into).collect())
    }

    fn repository_url(&self, owner: &str, name: &str) -> String {
        format!("{}/{}/{}", self.web_host, owner, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::StaticFetcher;

    #[test]
    fn test_projects_normalize_size_and_owner() {
        let body = r#"[
            {"name":"api","repository_size":2048000,"namespace":{"full_path":"acme"}},
            {"name":"fork","forked_from_project":{"id":1},"owner":{"username":"bob"}}
        ]"#;
        let fetcher = StaticFetcher::new().page(
            "https://gitlab.com/api/v4/groups/acme/projects?per_page=100",
            body,
            None,
        );

        let gitlab = GitLabProvider::with_fetcher(fetcher);
        let repos = gitlab.list_org_repositories("acme").unwrap();

        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].size_kb, 2000);
        assert_eq!(repos[0].owner_login, "acme");
        assert!(!repos[0].is_fork);
        assert!(repos[1].is_fork);
        assert_eq!(repos[1].owner_login, "bob");
    }

    #[test]
    fn test_lists_are_truncated_to_one_page() {
        let first: Vec<String> = (0..PAGE_SIZE)
            .map(|i| format!(r#"{{"username":"user{}"}}"#, i))
            .collect();
        let fetcher = StaticFetcher::new()
            .page(
                "https://gitlab.com/api/v4/groups/big/members?per_page=100",
                &format!("[{}]", first.join(",")),
                Some("https://gitlab.com/api/v4/groups/big/members?per_page=100&page=2"),
            )
            .page(
                "https://gitlab.com/api/v4/groups/big/members?per_page=100&page=2",
                r#"[{"username":"overflow"}]"#,
                None,
            );

        let gitlab = GitLabProvider::with_fetcher(fetcher);
        let members = gitlab.list_members("big").unwrap();

        assert_eq!(members.len(), PAGE_SIZE);
        assert!(!members.contains(&"overflow".to_string()));
    }

    #[test]
    fn test_subgroup_path_is_encoded() {
        let fetcher = StaticFetcher::new().page(
            "https://gitlab.com/api/v4/groups/acme%2Fplatform/projects?per_page=100",
            "[]",
            None,
        );
        let gitlab = GitLabProvider::with_fetcher(fetcher);
        assert!(gitlab.list_org_repositories("acme/platform").unwrap().is_empty());
    }

    #[test]
    fn test_repository_url() {
        let gitlab = GitLabProvider::with_fetcher(StaticFetcher::new());
        assert_eq!(
            gitlab.repository_url("acme", "api"),
            "https://gitlab.com/acme/api"
        );
    }
}
