//! GitHub adapter.

use crate::error::Result;
use crate::provider::http::{AuthStyle, HttpFetcher};
use crate::provider::page::{PageFetcher, Paginator, decode_pages};
use crate::provider::{RemoteIdentity, RemoteRepository, RepoProvider};
use serde::Deserialize;

const API_BASE: &str = "https://api.github.com";
const WEB_HOST: &str = "https://github.com";

#[derive(Debug, Deserialize)]
struct Member {
    login: String,
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: String,
}

/// Repository record from the GitHub API. `size` is in kilobytes.
#[derive(Debug, Deserialize)]
struct Repo {
    name: String,
    #[serde(default)]
    fork: bool,
    #[serde(default)]
    size: u64,
    owner: Owner,
}

impl From<Repo> for RemoteRepository {
    fn from(repo: Repo) -> Self {
        Self {
            name: repo.name,
            is_fork: repo.fork,
            size_kb: repo.size,
            owner_login: repo.owner.login,
        }
    }
}

/// GitHub organizations, following `Link` headers across every page.
pub struct GitHubProvider<F = HttpFetcher> {
    fetcher: F,
    api_base: String,
    web_host: String,
}

impl GitHubProvider<HttpFetcher> {
    /// Creates an adapter for github.com. An empty token reads anonymously.
    pub fn new(token: &str) -> Result<Self> {
        Ok(Self::with_fetcher(HttpFetcher::new(token, AuthStyle::Bearer)?))
    }
}

impl<F: PageFetcher> GitHubProvider<F> {
    /// Creates an adapter on top of any page fetcher.
    pub fn with_fetcher(fetcher: F) -> Self {
        Self {
            fetcher,
            api_base: API_BASE.into(),
            web_host: WEB_HOST.into(),
        }
    }

    /// Points the adapter at a GitHub Enterprise API.
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the host used for repository URLs.
    pub fn web_host(mut self, url: impl Into<String>) -> Self {
        self.web_host = url.into().trim_end_matches('/').to_string();
        self
    }

    fn fetch_all<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>> {
        let start = format!("{}{}", self.api_base, endpoint);
        let pages = Paginator::new(&self.fetcher, start).collect_all()?;
        decode_pages(&pages)
    }
}

impl<F: PageFetcher> RepoProvider for GitHubProvider<F> {
    fn list_members(&self, org: &str) -> Result<Vec<RemoteIdentity>> {
        let endpoint = format!("/orgs/{}/members?per_page=100", urlencoding::encode(org));
        let members: Vec<Member> = self.fetch_all(&endpoint)?;
        Ok(members.into_iter().map(|m| m.login).collect())
    }

    fn list_org_repositories(&self, org: &str) -> Result<Vec<RemoteRepository>> {
        let endpoint = format!("/orgs/{}/repos?per_page=100", urlencoding::encode(org));
        let repos: Vec<Repo> = self.fetch_all(&endpoint)?;
        Ok(repos.into_iter().map(Into::into).collect())
    }

    fn list_user_repositories(&self, user: &str) -> Result<Vec<RemoteRepository>> {
        let endpoint = format!("/users/{}/repos?per_page=100", urlencoding::encode(user));
        let repos: Vec<Repo> = self.fetch_all(&endpoint)?;
        Ok(repos.into_iter().map(Into::into).collect())
    }

    fn repository_url(&self, owner: &str, name: &str) -> String {
        format!("{}/{}/{}", self.web_host, owner, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrgFetchError;
    use crate::provider::testing::StaticFetcher;

    fn repo_json(name: &str, fork: bool, size: u64, owner: &str) -> String {
        format!(
            r#"{{"name":"{}","fork":{},"size":{},"owner":{{"login":"{}"}},"private":false}}"#,
            name, fork, size, owner
        )
    }

    #[test]
    fn test_org_repos_follow_link_pages() {
        let page1 = format!(
            "[{},{}]",
            repo_json("api", false, 120, "acme"),
            repo_json("web", true, 40, "acme")
        );
        let page2 = format!("[{}]", repo_json("cli", false, 8, "acme"));
        let fetcher = StaticFetcher::new()
            .page(
                "https://api.github.com/orgs/acme/repos?per_page=100",
                &page1,
                Some("https://api.github.com/orgs/acme/repos?per_page=100&page=2"),
            )
            .page(
                "https://api.github.com/orgs/acme/repos?per_page=100&page=2",
                &page2,
                None,
            );

        let github = GitHubProvider::with_fetcher(fetcher);
        let repos = github.list_org_repositories("acme").unwrap();

        let names: Vec<&str> = repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["api", "web", "cli"]);
        assert!(repos[1].is_fork);
        assert_eq!(repos[0].size_kb, 120);
        assert_eq!(repos[0].owner_login, "acme");
    }

    #[test]
    fn test_members_across_pages() {
        let fetcher = StaticFetcher::new()
            .page(
                "https://api.github.com/orgs/acme/members?per_page=100",
                r#"[{"login":"alice"},{"login":"bob"}]"#,
                Some("next-members"),
            )
            .page("next-members", r#"[{"login":"carol"}]"#, None);

        let github = GitHubProvider::with_fetcher(fetcher);
        let members = github.list_members("acme").unwrap();
        assert_eq!(members, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_k_pages_of_p_items() {
        let (k, p) = (5, 7);
        let mut fetcher = StaticFetcher::new();
        for page in 0..k {
            let items: Vec<String> = (0..p)
                .map(|i| repo_json(&format!("repo-{}-{}", page, i), false, 1, "u"))
                .collect();
            let locator = if page == 0 {
                "https://api.github.com/users/u/repos?per_page=100".to_string()
            } else {
                format!("cursor-{}", page)
            };
            let next = (page + 1 < k).then(|| format!("cursor-{}", page + 1));
            fetcher = fetcher.page(&locator, &format!("[{}]", items.join(",")), next.as_deref());
        }

        let github = GitHubProvider::with_fetcher(fetcher);
        let repos = github.list_user_repositories("u").unwrap();
        assert_eq!(repos.len(), k * p);
        assert_eq!(repos[0].name, "repo-0-0");
        assert_eq!(repos[p].name, "repo-1-0");
        assert_eq!(repos[k * p - 1].name, format!("repo-{}-{}", k - 1, p - 1));
    }

    #[test]
    fn test_empty_org_is_empty_not_error() {
        let fetcher = StaticFetcher::new().page(
            "https://api.github.com/orgs/empty/repos?per_page=100",
            "[]",
            None,
        );
        let github = GitHubProvider::with_fetcher(fetcher);
        assert!(github.list_org_repositories("empty").unwrap().is_empty());
    }

    #[test]
    fn test_second_page_failure_fails_whole_list() {
        let fetcher = StaticFetcher::new().page(
            "https://api.github.com/orgs/acme/members?per_page=100",
            r#"[{"login":"alice"}]"#,
            Some("gone"),
        );
        let github = GitHubProvider::with_fetcher(fetcher);
        assert!(matches!(
            github.list_members("acme"),
            Err(OrgFetchError::HttpStatus { status: 404, .. })
        ));
    }

    #[test]
    fn test_enterprise_base_and_host() {
        let fetcher = StaticFetcher::new().page(
            "https://ghe.example.com/api/v3/orgs/acme/members?per_page=100",
            "[]",
            None,
        );
        let github = GitHubProvider::with_fetcher(fetcher)
            .api_base("https://ghe.example.com/api/v3/")
            .web_host("https://ghe.example.com");

        assert!(github.list_members("acme").unwrap().is_empty());
        assert_eq!(
            github.repository_url("acme", "api"),
            "https://ghe.example.com/acme/api"
        );
    }
}
