//! Run configuration.
//!
//! A [`FetchConfig`] is built once from command-line input and handed to the
//! [`Aggregator`](crate::aggregate::Aggregator) and
//! [`Dispatcher`](crate::dispatch::Dispatcher). Nothing in the crate reads
//! configuration from global state.

use crate::error::{OrgFetchError, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default number of concurrent clones.
pub const DEFAULT_PARALLELISM: usize = 4;

/// Default maximum repository size in megabytes.
pub const DEFAULT_MAX_SIZE_MB: u64 = 250;

/// Default directory that clones are written into.
pub const DEFAULT_DESTINATION: &str = "downloaded_repos";

/// Hosted Git platform to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Provider {
    #[default]
    Github,
    Gitlab,
}

impl Provider {
    /// Environment variable consulted when no token is given explicitly.
    pub fn token_env_var(self) -> &'static str {
        match self {
            Self::Github => "GITHUB_TOKEN",
            Self::Gitlab => "GITLAB_TOKEN",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Github => write!(f, "github"),
            Self::Gitlab => write!(f, "gitlab"),
        }
    }
}

/// Which repositories to collect for an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SelectionMode {
    /// Repositories owned by the organization or group.
    #[default]
    Org,
    /// Repositories owned by each member.
    Member,
    /// Organization repositories followed by member repositories.
    Both,
}

impl SelectionMode {
    pub fn includes_org(self) -> bool {
        matches!(self, Self::Org | Self::Both)
    }

    pub fn includes_members(self) -> bool {
        matches!(self, Self::Member | Self::Both)
    }
}

/// Immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Platform to query.
    pub provider: Provider,
    /// Access token. Empty means anonymous.
    pub token: String,
    /// Keep forked repositories.
    pub include_forks: bool,
    /// Repository selection mode.
    pub mode: SelectionMode,
    /// Restrict member selection to this single login.
    pub member: Option<String>,
    /// Maximum repository size in megabytes. Accepted but not enforced.
    pub max_size_mb: u64,
    /// Number of concurrent clone workers, at least 1.
    pub parallelism: usize,
    /// Directory clones are created in.
    pub destination: PathBuf,
    /// Override for the provider API base URL.
    pub api_base: Option<String>,
    /// Override for the web host used in clone URLs.
    pub web_host: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::new(Provider::default())
    }
}

impl FetchConfig {
    /// Creates a configuration with default settings for a provider.
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            token: String::new(),
            include_forks: false,
            mode: SelectionMode::Org,
            member: None,
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            parallelism: DEFAULT_PARALLELISM,
            destination: PathBuf::from(DEFAULT_DESTINATION),
            api_base: None,
            web_host: None,
        }
    }

    /// Sets the access token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Falls back to the provider's token environment variable when no token is set.
    pub fn token_from_env(mut self) -> Self {
        if self.token.is_empty()
            && let Ok(token) = std::env::var(self.provider.token_env_var())
        {
            self.token = token;
        }
        self
    }

    /// Keeps forked repositories in the results.
    pub fn include_forks(mut self, include: bool) -> Self {
        self.include_forks = include;
        self
    }

    /// Sets the selection mode.
    pub fn mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Restricts member selection to a single login. Empty input clears it.
    pub fn member(mut self, member: Option<String>) -> Self {
        self.member = member.filter(|m| !m.trim().is_empty());
        self
    }

    /// Sets the maximum repository size in megabytes.
    pub fn max_size_mb(mut self, mb: u64) -> Self {
        self.max_size_mb = mb;
        self
    }

    /// Sets the number of concurrent clone workers. Values below 1 become 1.
    pub fn parallelism(mut self, workers: usize) -> Self {
        self.parallelism = workers.max(1);
        self
    }

    /// Sets the clone destination directory.
    pub fn destination(mut self, dir: impl Into<PathBuf>) -> Self {
        self.destination = dir.into();
        self
    }

    /// Overrides the provider API base URL.
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = Some(trim_trailing_slash(url.into()));
        self
    }

    /// Overrides the web host used to build clone URLs.
    pub fn web_host(mut self, url: impl Into<String>) -> Self {
        self.web_host = Some(trim_trailing_slash(url.into()));
        self
    }

    /// Drops the member override when the mode never looks at members.
    pub fn ignore_unused_member(mut self) -> Self {
        if !self.mode.includes_members()
            && let Some(member) = self.member.take()
        {
            tracing::warn!(%member, mode = ?self.mode, "member is ignored for this repo type");
        }
        self
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

/// Resolves the organization argument into a list of names.
///
/// If `arg` names an existing file, every non-blank line is an organization.
/// Otherwise `arg` itself is the single organization.
pub fn read_org_list(arg: &str) -> Result<Vec<String>> {
    let path = Path::new(arg);
    if !path.is_file() {
        return Ok(vec![arg.to_string()]);
    }

    let content = std::fs::read_to_string(path).map_err(|source| OrgFetchError::Input {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
