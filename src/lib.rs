//! # org-fetch
//!
//! Enumerate the members and repositories of GitHub organizations or GitLab
//! groups, and clone the selected repositories with a bounded worker pool.
//!
//! The pipeline has three stages:
//! - [`provider`] adapters list members and repositories, following each
//!   platform's pagination convention
//! - the [`aggregate::Aggregator`] combines those lists per organization
//!   according to the selection mode and fork filter
//! - the [`dispatch::Dispatcher`] clones the resulting targets in parallel and
//!   reports one outcome per target
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use org_fetch::prelude::*;
//!
//! let config = FetchConfig::new(Provider::Github)
//!     .token("ghp_your_token_here")
//!     .mode(SelectionMode::Both)
//!     .parallelism(8);
//!
//! let provider = org_fetch::provider::from_config(&config)?;
//! let aggregator = Aggregator::new(provider.as_ref(), &config);
//!
//! let reports = aggregator.collect_all(&["acme", "globex"]);
//! let targets = aggregator.clone_targets(&reports);
//!
//! let outcomes = Dispatcher::from_config(GitCli::new(), &config)
//!     .run_blocking(targets, |outcome| println!("{}", outcome))?;
//! println!("{} repositories processed", outcomes.len());
//! # Ok::<(), org_fetch::error::OrgFetchError>(())
//! ```

pub mod aggregate;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod provider;
pub mod report;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::aggregate::{Aggregator, FetchFailure, FetchScope, OrgReport, filter_forks};
    pub use crate::config::{FetchConfig, Provider, SelectionMode, read_org_list};
    pub use crate::dispatch::{
        CloneOutcome, CloneTarget, CloneTool, Dispatch, DispatchState, Dispatcher, GitCli,
    };
    pub use crate::error::{OrgFetchError, Result};
    pub use crate::provider::{
        GitHubProvider, GitLabProvider, RemoteIdentity, RemoteRepository, RepoProvider,
    };
    pub use crate::report::{OutputMode, Reporter, Totals};
}

pub use prelude::*;
