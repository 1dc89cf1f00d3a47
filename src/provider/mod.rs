//! Hosted Git platform adapters.
//!
//! Each platform implements [`RepoProvider`], which exposes the three list
//! operations the aggregator needs with sizes normalized to kilobytes:
//!
//! - [`RepoProvider::list_members`]
//! - [`RepoProvider::list_org_repositories`]
//! - [`RepoProvider::list_user_repositories`]
//!
//! The platforms paginate differently. [`GitHubProvider`] follows `Link`
//! headers until the last page. [`GitLabProvider`] requests a single page of
//! [`gitlab::PAGE_SIZE`] items, so groups or users with more items than that
//! are truncated.
//!
//! # Example
//!
//! ```rust,no_run
//! use org_fetch::provider::{GitHubProvider, RepoProvider};
//!
//! let github = GitHubProvider::new("ghp_your_token_here")?;
//!
//! for repo in github.list_org_repositories("my-org")? {
//!     println!("{} ({} KB)", repo.name, repo.size_kb);
//! }
//! # Ok::<(), org_fetch::error::OrgFetchError>(())
//! ```

pub mod github;
pub mod gitlab;
mod http;
mod link;
mod page;

pub use github::GitHubProvider;
pub use gitlab::GitLabProvider;
pub use http::{AuthStyle, HttpFetcher};
pub use link::next_link;
pub use page::{Page, PageFetcher, Paginator, decode_pages};

use crate::config::{FetchConfig, Provider};
use crate::error::Result;

/// A member login on a platform.
pub type RemoteIdentity = String;

/// A repository as reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepository {
    pub name: String,
    pub is_fork: bool,
    /// Size in kilobytes.
    pub size_kb: u64,
    pub owner_login: String,
}

/// Listing operations every platform adapter supports.
pub trait RepoProvider: Send + Sync {
    /// List the member logins of an organization or group.
    fn list_members(&self, org: &str) -> Result<Vec<RemoteIdentity>>;

    /// List repositories owned by an organization or group.
    fn list_org_repositories(&self, org: &str) -> Result<Vec<RemoteRepository>>;

    /// List repositories owned by a user.
    fn list_user_repositories(&self, user: &str) -> Result<Vec<RemoteRepository>>;

    /// Browser/clone URL for a repository under `owner`.
    fn repository_url(&self, owner: &str, name: &str) -> String;
}

/// Builds the HTTP-backed adapter selected by the configuration.
pub fn from_config(config: &FetchConfig) -> Result<Box<dyn RepoProvider>> {
    Ok(match config.provider {
        Provider::Github => {
            let fetcher = HttpFetcher::new(&config.token, AuthStyle::Bearer)?;
            let mut provider = GitHubProvider::with_fetcher(fetcher);
            if let Some(api) = &config.api_base {
                provider = provider.api_base(api);
            }
            if let Some(host) = &config.web_host {
                provider = provider.web_host(host);
            }
            Box::new(provider)
        }
        Provider::Gitlab => {
            let fetcher = HttpFetcher::new(&config.token, AuthStyle::PrivateToken)?;
            let mut provider = GitLabProvider::with_fetcher(fetcher);
            if let Some(api) = &config.api_base {
                provider = provider.api_base(api);
            }
            if let Some(host) = &config.web_host {
                provider = provider.web_host(host);
            }
            Box::new(provider)
        }
    })
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory page sources shared by adapter tests.

    use super::{Page, PageFetcher};
    use crate::error::{OrgFetchError, Result};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned pages keyed by locator and records every request.
    #[derive(Default)]
    pub struct StaticFetcher {
        pages: HashMap<String, (String, Option<String>)>,
        pub requests: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, locator: &str, body: &str, next: Option<&str>) -> Self {
            self.pages.insert(
                locator.to_string(),
                (body.to_string(), next.map(String::from)),
            );
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl PageFetcher for StaticFetcher {
        fn fetch(&self, locator: &str) -> Result<Page> {
            self.requests.lock().unwrap().push(locator.to_string());
            match self.pages.get(locator) {
                Some((body, next)) => Ok(Page {
                    locator: locator.to_string(),
                    body: body.clone().into_bytes(),
                    next: next.clone(),
                }),
                None => Err(OrgFetchError::HttpStatus {
                    url: locator.to_string(),
                    status: 404,
                    body: "Not Found".into(),
                }),
            }
        }
    }
}
