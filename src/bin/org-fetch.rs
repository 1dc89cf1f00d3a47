//! CLI for org-fetch.

use anyhow::{Context, Result};
use clap::Parser;
use org_fetch::dispatch::prepare_destination;
use org_fetch::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "org-fetch")]
#[command(author, version, about = "Fetch and report organization/group members and repositories from GitHub or GitLab")]
#[command(after_help = "ORGNAME may be a file containing one organization or group per line.")]
struct Cli {
    /// Provider to use
    #[arg(short, long, value_enum, default_value_t = Provider::Github)]
    provider: Provider,

    /// Personal access token (falls back to GITHUB_TOKEN / GITLAB_TOKEN)
    #[arg(short, long, default_value = "")]
    token: String,

    /// Organization (GitHub) or group (GitLab) name, or a file listing them
    #[arg(short, long)]
    orgname: String,

    /// Write results to this file instead of stdout
    #[arg(short = 'O', long)]
    output: Option<PathBuf>,

    /// Include forked repositories
    #[arg(short = 'f', long)]
    include_forks: bool,

    /// Repositories to fetch
    #[arg(short, long, value_enum, default_value_t = SelectionMode::Org)]
    repo_type: SelectionMode,

    /// Fetch repositories of this member only (repo type member or both)
    #[arg(short, long)]
    member: Option<String>,

    /// Clone every listed repository
    #[arg(short, long)]
    download: bool,

    /// Print only repository URLs
    #[arg(short, long)]
    urls_only: bool,

    /// Print only member usernames (takes precedence over --urls-only)
    #[arg(short = 'U', long)]
    usernames_only: bool,

    /// Maximum repository size (MB) to clone; currently not applied
    #[arg(short = 's', long, default_value_t = org_fetch::config::DEFAULT_MAX_SIZE_MB)]
    max_size: u64,

    /// Number of concurrent clones when downloading
    #[arg(short = 'P', long, default_value_t = org_fetch::config::DEFAULT_PARALLELISM)]
    parallel: usize,

    /// Directory clones are written into
    #[arg(long, default_value = org_fetch::config::DEFAULT_DESTINATION)]
    dest: PathBuf,

    /// API base URL for self-hosted instances
    #[arg(long)]
    api_url: Option<String>,

    /// Web host used in repository URLs for self-hosted instances
    #[arg(long)]
    web_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> FetchConfig {
        let mut config = FetchConfig::new(self.provider)
            .token(&self.token)
            .token_from_env()
            .include_forks(self.include_forks)
            .mode(self.repo_type)
            .member(self.member.clone())
            .max_size_mb(self.max_size)
            .parallelism(self.parallel)
            .destination(&self.dest);
        if let Some(api) = &self.api_url {
            config = config.api_base(api);
        }
        if let Some(web) = &self.web_url {
            config = config.web_host(web);
        }
        config
    }

    fn output_mode(&self) -> OutputMode {
        if self.usernames_only && self.urls_only {
            tracing::warn!("--usernames-only and --urls-only both given, printing usernames");
        }
        if self.usernames_only {
            OutputMode::UsernamesOnly
        } else if self.urls_only {
            OutputMode::UrlsOnly
        } else {
            OutputMode::Detailed
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "org_fetch=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let orgs = read_org_list(&cli.orgname).context("Error reading orgname(s)")?;
    let config = cli.config().ignore_unused_member();

    let sink: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Error creating output file {}", path.display())
        })?)),
        None => Box::new(io::stdout()),
    };

    let provider = org_fetch::provider::from_config(&config).context("Invalid token")?;
    let aggregator = Aggregator::new(provider.as_ref(), &config);
    let output = cli.output_mode();

    let mut reporter = Reporter::new(sink);
    let mut reports = Vec::new();
    for org in &orgs {
        if output == OutputMode::UsernamesOnly {
            reporter.usernames(org, aggregator.members(org))?;
            continue;
        }

        let report = aggregator.collect(org);
        match output {
            OutputMode::UrlsOnly => reporter.urls(&aggregator, &report)?,
            _ => reporter.detailed(&aggregator, &report, aggregator.detail_members(&report))?,
        }
        reports.push(report);
    }
    reporter.flush()?;

    // totals go to the console even when results are redirected to a file
    for line in reporter.totals().summary(output, config.mode) {
        println!("{}", line);
    }

    if cli.download {
        if reports.is_empty() {
            reports = aggregator.collect_all(&orgs);
        }
        download(&aggregator, &reports, &config)?;
    }

    Ok(())
}

fn download(aggregator: &Aggregator<'_>, reports: &[OrgReport], config: &FetchConfig) -> Result<()> {
    let targets = aggregator.clone_targets(reports);
    prepare_destination(&config.destination).with_context(|| {
        format!("Error creating {}", config.destination.display())
    })?;
    tracing::debug!(
        max_size_mb = config.max_size_mb,
        "size limit is not applied to clones"
    );

    let outcomes = Dispatcher::from_config(GitCli::new(), config)
        .run_blocking(targets, |outcome| println!("{}", outcome))
        .context("Error starting clone workers")?;

    let failed = outcomes.iter().filter(|o| !o.succeeded).count();
    println!(
        "Cloned {} of {} repositories ({} failed)",
        outcomes.len() - failed,
        outcomes.len(),
        failed
    );
    Ok(())
}
