//! Report rendering.

use crate::aggregate::{Aggregator, FetchFailure, FetchScope, OrgReport};
use crate::config::SelectionMode;
use crate::error::Result;
use crate::provider::RemoteIdentity;
use std::io::Write;

const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// How results are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Organization header, repository details and members.
    #[default]
    Detailed,
    /// One repository URL per line.
    UrlsOnly,
    /// One member login per line.
    UsernamesOnly,
}

/// Running counts across organizations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub members: usize,
    pub org_repositories: usize,
    pub member_repositories: usize,
}

impl Totals {
    /// Colored summary lines for the console.
    pub fn summary(&self, output: OutputMode, mode: SelectionMode) -> Vec<String> {
        let line = |label: &str, n: usize| format!("{}{}: {}{}{}", YELLOW, label, GREEN, n, RESET);
        match output {
            OutputMode::UsernamesOnly => vec![line("Total members", self.members)],
            OutputMode::UrlsOnly => {
                let mut lines = Vec::new();
                if mode.includes_org() {
                    lines.push(line("Total repositories", self.org_repositories));
                }
                if mode.includes_members() {
                    lines.push(line(
                        "Total member-owned repositories",
                        self.member_repositories,
                    ));
                }
                lines
            }
            OutputMode::Detailed => Vec::new(),
        }
    }
}

/// Writes reports to an output sink and keeps totals.
pub struct Reporter<W: Write> {
    out: W,
    totals: Totals,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            totals: Totals::default(),
        }
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Writes the member logins of an organization, or the error that prevented listing them.
    pub fn usernames(&mut self, org: &str, members: Result<Vec<RemoteIdentity>>) -> Result<()> {
        match members {
            Ok(members) => {
                for member in &members {
                    writeln!(self.out, "{}", member)?;
                }
                self.totals.members += members.len();
            }
            Err(e) => writeln!(self.out, "Error fetching members for {}: {}", org, e)?,
        }
        Ok(())
    }

    /// Writes one URL per selected repository.
    pub fn urls(&mut self, aggregator: &Aggregator<'_>, report: &OrgReport) -> Result<()> {
        for url in aggregator.repository_urls(report) {
            writeln!(self.out, "{}", url)?;
        }
        self.count(report);
        self.failures(report)
    }

    /// Writes the detailed listing of one organization.
    ///
    /// The `Organization:` header is written whenever the organization's
    /// repositories were listed, even if the fork filter left none. Error
    /// lines follow the block they belong to, in fetch order. `members` comes
    /// from [`Aggregator::detail_members`]; `None` writes no member listing.
    pub fn detailed(
        &mut self,
        aggregator: &Aggregator<'_>,
        report: &OrgReport,
        members: Option<Result<Vec<RemoteIdentity>>>,
    ) -> Result<()> {
        if report.org_listed {
            writeln!(self.out, "Organization: {}", report.org)?;
        }
        for repo in &report.org_repositories {
            writeln!(self.out, "Repo: {}", repo.name)?;
            writeln!(
                self.out,
                "  URL: {}",
                aggregator.provider().repository_url(&report.org, &repo.name)
            )?;
            writeln!(self.out, "  Fork: {}", repo.is_fork)?;
            writeln!(self.out, "  Size (KB): {}", repo.size_kb)?;
            writeln!(self.out, "  Owner: {}", repo.owner_login)?;
        }
        self.failures_where(report, |scope| matches!(scope, FetchScope::OrgRepositories(_)))?;

        for owned in &report.member_repositories {
            for repo in &owned.repositories {
                writeln!(self.out, "{}/{}", owned.member, repo.name)?;
            }
        }
        self.failures_where(report, |scope| !matches!(scope, FetchScope::OrgRepositories(_)))?;

        match members {
            Some(Ok(members)) => {
                for member in &members {
                    writeln!(self.out, "Member: {}", member)?;
                }
                self.totals.members += members.len();
            }
            Some(Err(error)) => {
                let failure = FetchFailure {
                    scope: FetchScope::Members(report.org.clone()),
                    error,
                };
                writeln!(self.out, "{}", failure)?;
            }
            None => {}
        }
        self.count(report);
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn count(&mut self, report: &OrgReport) {
        self.totals.org_repositories += report.org_repositories.len();
        self.totals.member_repositories += report.member_repository_count();
    }

    fn failures(&mut self, report: &OrgReport) -> Result<()> {
        self.failures_where(report, |_| true)
    }

    fn failures_where<P>(&mut self, report: &OrgReport, keep: P) -> Result<()>
    where
        P: Fn(&FetchScope) -> bool,
    {
        for failure in report.failures.iter().filter(|f| keep(&f.scope)) {
            writeln!(self.out, "{}", failure)?;
        }
        Ok(())
    }
}
