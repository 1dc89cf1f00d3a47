//! Multi-organization aggregation.
//!
//! The [`Aggregator`] turns organization names into [`OrgReport`]s by driving
//! a [`RepoProvider`]. Organizations are processed one after another. A fetch
//! failure is recorded in the report of the organization it belongs to and
//! never stops the remaining organizations.

use crate::config::{FetchConfig, SelectionMode};
use crate::dispatch::CloneTarget;
use crate::error::{OrgFetchError, Result};
use crate::provider::{RemoteIdentity, RemoteRepository, RepoProvider};
use std::fmt;

/// What was being fetched when an error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchScope {
    /// Repositories owned by an organization.
    OrgRepositories(String),
    /// Membership of an organization.
    Members(String),
    /// Repositories owned by a member.
    MemberRepositories(String),
}

impl fmt::Display for FetchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrgRepositories(org) => write!(f, "Error fetching org repos for {}", org),
            Self::Members(org) => write!(f, "Error fetching members for {}", org),
            Self::MemberRepositories(user) => write!(f, "Error fetching repos for {}", user),
        }
    }
}

/// A recorded fetch error.
#[derive(Debug)]
pub struct FetchFailure {
    pub scope: FetchScope,
    pub error: OrgFetchError,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.scope, self.error)
    }
}

/// Repositories owned by one member.
#[derive(Debug, Clone)]
pub struct MemberRepositories {
    pub member: RemoteIdentity,
    pub repositories: Vec<RemoteRepository>,
}

/// Everything collected for one organization.
#[derive(Debug)]
pub struct OrgReport {
    pub org: String,
    /// Whether the organization's repositories were listed successfully.
    /// Stays false when the mode skips them or the fetch failed.
    pub org_listed: bool,
    /// Organization-owned repositories after fork filtering.
    pub org_repositories: Vec<RemoteRepository>,
    /// Members whose repositories were looked up, in membership order.
    pub members: Vec<RemoteIdentity>,
    /// Member-owned repositories after fork filtering, grouped in membership order.
    pub member_repositories: Vec<MemberRepositories>,
    pub failures: Vec<FetchFailure>,
}

impl OrgReport {
    fn new(org: &str) -> Self {
        Self {
            org: org.to_string(),
            org_listed: false,
            org_repositories: Vec::new(),
            members: Vec::new(),
            member_repositories: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn record(&mut self, scope: FetchScope, error: OrgFetchError) {
        tracing::warn!(%scope, %error, "fetch failed");
        self.failures.push(FetchFailure { scope, error });
    }

    /// Number of member-owned repositories across all members.
    pub fn member_repository_count(&self) -> usize {
        self.member_repositories
            .iter()
            .map(|m| m.repositories.len())
            .sum()
    }

    /// `(owner, repository)` pairs: organization repositories first, then
    /// member repositories grouped by member.
    pub fn owned_repositories(&self) -> impl Iterator<Item = (&str, &RemoteRepository)> {
        let org = self
            .org_repositories
            .iter()
            .map(move |r| (self.org.as_str(), r));
        let members = self.member_repositories.iter().flat_map(|m| {
            m.repositories
                .iter()
                .map(move |r| (m.member.as_str(), r))
        });
        org.chain(members)
    }
}

/// Drops forks unless `include_forks` is set.
pub fn filter_forks(repos: Vec<RemoteRepository>, include_forks: bool) -> Vec<RemoteRepository> {
    if include_forks {
        return repos;
    }
    repos.into_iter().filter(|r| !r.is_fork).collect()
}

/// Collects repositories and members across organizations through one provider.
pub struct Aggregator<'a> {
    provider: &'a dyn RepoProvider,
    config: &'a FetchConfig,
}

impl<'a> Aggregator<'a> {
    pub fn new(provider: &'a dyn RepoProvider, config: &'a FetchConfig) -> Self {
        Self { provider, config }
    }

    /// The provider this aggregator reads from.
    pub fn provider(&self) -> &dyn RepoProvider {
        self.provider
    }

    /// Lists the members of an organization.
    pub fn members(&self, org: &str) -> Result<Vec<RemoteIdentity>> {
        self.provider.list_members(org)
    }

    /// Collects one organization according to the configured selection mode.
    pub fn collect(&self, org: &str) -> OrgReport {
        let mut report = OrgReport::new(org);

        if self.config.mode.includes_org() {
            match self.provider.list_org_repositories(org) {
                Ok(repos) => {
                    report.org_listed = true;
                    report.org_repositories = filter_forks(repos, self.config.include_forks);
                }
                Err(e) => {
                    report.record(FetchScope::OrgRepositories(org.to_string()), e);
                    if self.config.mode == SelectionMode::Org {
                        return report;
                    }
                }
            }
        }

        if self.config.mode.includes_members() {
            let members = match &self.config.member {
                Some(member) => vec![member.clone()],
                None => match self.provider.list_members(org) {
                    Ok(members) => members,
                    Err(e) => {
                        report.record(FetchScope::Members(org.to_string()), e);
                        return report;
                    }
                },
            };

            for member in &members {
                match self.provider.list_user_repositories(member) {
                    Ok(repos) => report.member_repositories.push(MemberRepositories {
                        member: member.clone(),
                        repositories: filter_forks(repos, self.config.include_forks),
                    }),
                    Err(e) => report.record(FetchScope::MemberRepositories(member.clone()), e),
                }
            }
            report.members = members;
        }

        tracing::debug!(
            org,
            org_repos = report.org_repositories.len(),
            member_repos = report.member_repository_count(),
            failures = report.failures.len(),
            "collected organization"
        );
        report
    }

    /// Members to list under an organization in detailed output.
    ///
    /// Org mode fetches the membership here, and only after the
    /// organization's repositories were listed. The other modes reuse the
    /// members already in `report`.
    pub fn detail_members(&self, report: &OrgReport) -> Option<Result<Vec<RemoteIdentity>>> {
        match self.config.mode {
            SelectionMode::Org if report.org_listed => Some(self.members(&report.org)),
            SelectionMode::Org => None,
            SelectionMode::Member | SelectionMode::Both => Some(Ok(report.members.clone())),
        }
    }

    /// Collects every organization in order.
    pub fn collect_all<S: AsRef<str>>(&self, orgs: &[S]) -> Vec<OrgReport> {
        orgs.iter().map(|org| self.collect(org.as_ref())).collect()
    }

    /// Repository URLs of a report in selection order.
    pub fn repository_urls(&self, report: &OrgReport) -> Vec<String> {
        report
            .owned_repositories()
            .map(|(owner, repo)| self.provider.repository_url(owner, &repo.name))
            .collect()
    }

    /// Flattens reports into clone targets under the configured destination.
    pub fn clone_targets(&self, reports: &[OrgReport]) -> Vec<CloneTarget> {
        reports
            .iter()
            .flat_map(|report| self.repository_urls(report))
            .map(|url| CloneTarget::new(url, &self.config.destination))
            .collect()
    }
}
