//! Bounded concurrent clone dispatcher.
//!
//! A [`Dispatcher`] runs a fixed pool of workers over a work queue that is
//! filled with every [`CloneTarget`] and closed before the first outcome is
//! read. Each target produces exactly one [`CloneOutcome`]. Outcomes arrive
//! in completion order, not submission order.
//!
//! # Example
//!
//! ```rust,no_run
//! use org_fetch::dispatch::{CloneTarget, Dispatcher, GitCli};
//!
//! let targets = vec![
//!     CloneTarget::new("https://github.com/acme/api", "downloaded_repos"),
//!     CloneTarget::new("https://github.com/acme/web", "downloaded_repos"),
//! ];
//!
//! let outcomes = Dispatcher::new(GitCli::new(), 4)
//!     .run_blocking(targets, |outcome| println!("{}", outcome))?;
//! println!("{} finished", outcomes.len());
//! # Ok::<(), org_fetch::error::OrgFetchError>(())
//! ```

use crate::config::FetchConfig;
use crate::error::{OrgFetchError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;

/// One repository to materialize locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CloneTarget {
    pub source_url: String,
    /// Directory the clone tool runs in. The clone lands in a subdirectory
    /// named after the repository.
    pub destination_dir: PathBuf,
}

impl CloneTarget {
    pub fn new(source_url: impl Into<String>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_url: source_url.into(),
            destination_dir: destination_dir.into(),
        }
    }
}

/// Result of cloning one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneOutcome {
    pub target: CloneTarget,
    pub succeeded: bool,
    pub message: String,
}

impl CloneOutcome {
    fn cloned(target: CloneTarget) -> Self {
        Self {
            target,
            succeeded: true,
            message: String::new(),
        }
    }

    fn failed(target: CloneTarget, message: impl Into<String>) -> Self {
        Self {
            target,
            succeeded: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for CloneOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.succeeded {
            write!(f, "Cloned: {}", self.target.source_url)
        } else {
            write!(f, "Failed: {} ({})", self.target.source_url, self.message)
        }
    }
}

/// External tool that materializes a repository.
///
/// Implementations block until the clone finishes. A failure is reported as
/// [`OrgFetchError::CloneTool`] carrying the tool's diagnostic output.
pub trait CloneTool: Send + Sync + 'static {
    fn clone_repo(&self, target: &CloneTarget) -> Result<()>;
}

/// Runs `git clone <url>` inside the destination directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    /// Uses `git` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Uses a specific git executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl CloneTool for GitCli {
    fn clone_repo(&self, target: &CloneTarget) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("clone")
            .arg(&target.source_url)
            .current_dir(&target.destination_dir)
            .output()
            .map_err(|e| OrgFetchError::CloneTool {
                url: target.source_url.clone(),
                message: format!("could not run {}: {}", self.program.display(), e),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(OrgFetchError::CloneTool {
            url: target.source_url.clone(),
            message: format!("git clone failed: {}\n{}", output.status, combined.trim_end()),
        })
    }
}

/// Observable lifecycle of a [`Dispatch`].
///
/// Enqueueing happens inside [`Dispatcher::start`], which only returns once
/// the work queue is full and closed, so a handle starts out `Draining`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Queue closed; outcomes are being read.
    Draining,
    /// Every outcome has been read.
    Done,
}

/// Fixed-size clone worker pool.
pub struct Dispatcher<T: CloneTool> {
    tool: Arc<T>,
    workers: usize,
}

impl<T: CloneTool> Dispatcher<T> {
    /// Creates a pool of `workers` workers (at least one).
    pub fn new(tool: T, workers: usize) -> Self {
        Self {
            tool: Arc::new(tool),
            workers: workers.max(1),
        }
    }

    /// Creates a pool sized by the configured parallelism.
    pub fn from_config(tool: T, config: &FetchConfig) -> Self {
        Self::new(tool, config.parallelism)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Enqueues every target, closes the queue and starts the workers.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn start(&self, targets: Vec<CloneTarget>) -> Dispatch {
        let expected = targets.len();
        // tokio channels need a non-zero capacity
        let capacity = expected.max(1);
        let (work_tx, work_rx) = mpsc::channel::<CloneTarget>(capacity);
        let (result_tx, result_rx) = mpsc::channel::<CloneOutcome>(capacity);

        tracing::debug!(targets = expected, workers = self.workers, "dispatching");
        // work_rx is alive and the queue holds every target, so sends never fail or wait
        for target in targets {
            let _ = work_tx.send(target).await;
        }
        drop(work_tx);

        let work_rx = Arc::new(Mutex::new(work_rx));
        let mut pool = JoinSet::new();
        for id in 0..self.workers.min(capacity) {
            pool.spawn(worker(
                id,
                Arc::clone(&self.tool),
                Arc::clone(&work_rx),
                result_tx.clone(),
            ));
        }
        drop(result_tx);

        tracing::debug!("work queue closed, draining");
        Dispatch {
            results: result_rx,
            pool,
            expected,
            received: 0,
            state: DispatchState::Draining,
        }
    }

    /// Clones every target and returns the outcomes in arrival order.
    pub async fn run(&self, targets: Vec<CloneTarget>) -> Vec<CloneOutcome> {
        self.start(targets).await.finish(|_| {}).await
    }

    /// Builds a runtime, clones every target and calls `on_outcome` as each
    /// outcome arrives.
    pub fn run_blocking<F>(&self, targets: Vec<CloneTarget>, on_outcome: F) -> Result<Vec<CloneOutcome>>
    where
        F: FnMut(&CloneOutcome),
    {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.workers)
            .enable_all()
            .build()?;
        Ok(runtime.block_on(async { self.start(targets).await.finish(on_outcome).await }))
    }
}

async fn worker<T: CloneTool>(
    id: usize,
    tool: Arc<T>,
    work: Arc<Mutex<mpsc::Receiver<CloneTarget>>>,
    results: mpsc::Sender<CloneOutcome>,
) {
    loop {
        let next = work.lock().await.recv().await;
        let Some(target) = next else { break };

        let outcome = clone_one(Arc::clone(&tool), target).await;
        tracing::debug!(worker = id, succeeded = outcome.succeeded, url = %outcome.target.source_url, "clone finished");
        if results.send(outcome).await.is_err() {
            break;
        }
    }
    tracing::debug!(worker = id, "work queue exhausted");
}

async fn clone_one<T: CloneTool>(tool: Arc<T>, target: CloneTarget) -> CloneOutcome {
    let job = target.clone();
    match tokio::task::spawn_blocking(move || tool.clone_repo(&job)).await {
        Ok(Ok(())) => CloneOutcome::cloned(target),
        Ok(Err(OrgFetchError::CloneTool { message, .. })) => CloneOutcome::failed(target, message),
        Ok(Err(e)) => CloneOutcome::failed(target, e.to_string()),
        Err(e) => CloneOutcome::failed(target, format!("clone task aborted: {}", e)),
    }
}

/// A running dispatch whose outcomes are being drained.
pub struct Dispatch {
    results: mpsc::Receiver<CloneOutcome>,
    pool: JoinSet<()>,
    expected: usize,
    received: usize,
    state: DispatchState,
}

impl Dispatch {
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Number of outcomes this dispatch will produce.
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Waits for the next outcome. Returns `None` once every target has reported.
    pub async fn next_outcome(&mut self) -> Option<CloneOutcome> {
        if self.received >= self.expected {
            self.state = DispatchState::Done;
            return None;
        }
        let outcome = self.results.recv().await?;
        self.received += 1;
        if self.received == self.expected {
            self.state = DispatchState::Done;
        }
        Some(outcome)
    }

    /// Drains the remaining outcomes and waits for the workers to exit.
    pub async fn finish<F>(mut self, mut on_outcome: F) -> Vec<CloneOutcome>
    where
        F: FnMut(&CloneOutcome),
    {
        let mut outcomes = Vec::with_capacity(self.expected - self.received);
        while let Some(outcome) = self.next_outcome().await {
            on_outcome(&outcome);
            outcomes.push(outcome);
        }
        while let Some(joined) = self.pool.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "clone worker panicked");
            }
        }
        self.state = DispatchState::Done;

        let failed = outcomes.iter().filter(|o| !o.succeeded).count();
        tracing::info!(
            cloned = outcomes.len() - failed,
            failed,
            "dispatch complete"
        );
        outcomes
    }
}

/// Creates `dir` if needed so clones have somewhere to land.
pub fn prepare_destination(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}
