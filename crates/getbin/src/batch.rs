use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::sync::Arc;

use futures_util::future::join_all;
use getbin_cache::CacheIndex;
use getbin_fetch::{Fetcher, HttpClient};
use getbin_platform::{Current, matches};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::progress::{NoProgress, ProgressReporter};
use crate::request::{BinaryRequest, BinarySpec, validate_all};
use crate::resolver::{ResolvedBinary, Resolver};
use crate::settings::Settings;

/// Outcome of one batch: every request that applied to this platform ends
/// up in exactly one of the two collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub binaries: BTreeMap<String, ResolvedBinary>,
    pub errors: Vec<RequestFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn path(&self, name: &str) -> Option<&std::path::Path> {
        self.binaries.get(name).map(|b| b.path.as_path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFailure {
    pub name: String,
    pub message: String,
}

impl RequestFailure {
    fn new(name: &str, err: &Error) -> Self {
        Self {
            name: err.request_name().unwrap_or(name).to_string(),
            message: err.chain(),
        }
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Resolves batches of binary requests.
pub struct Getbin<C: HttpClient> {
    settings: Settings,
    fetcher: Fetcher<C>,
    index: CacheIndex,
    current: Current,
    progress: Arc<dyn ProgressReporter>,
    search_path: Option<OsString>,
}

impl Getbin<getbin_fetch::ReqwestClient> {
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let config = getbin_fetch::ClientConfig {
            user_agent: settings.user_agent.clone(),
            connect_timeout: settings.connect_timeout(),
        };
        let client = getbin_fetch::ReqwestClient::new(&config).map_err(Error::Client)?;
        Ok(Self::new(settings, client))
    }
}

impl<C: HttpClient> Getbin<C> {
    pub fn new(settings: Settings, client: C) -> Self {
        let index = CacheIndex::new(settings.index_path());
        Self {
            settings,
            fetcher: Fetcher::new(client),
            index,
            current: Current::detect(),
            progress: Arc::new(NoProgress),
            search_path: None,
        }
    }

    /// Match requests against `current` instead of the running machine.
    pub fn with_platform(mut self, current: Current) -> Self {
        self.current = current;
        self
    }

    pub fn with_progress(mut self, reporter: impl ProgressReporter + 'static) -> Self {
        self.progress = Arc::new(reporter);
        self
    }

    /// Look command names up in `paths` instead of `PATH`.
    pub fn with_search_path(mut self, paths: impl Into<OsString>) -> Self {
        self.search_path = Some(paths.into());
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn index(&self) -> &CacheIndex {
        &self.index
    }

    pub fn client(&self) -> &C {
        self.fetcher.client()
    }

    /// Resolve every request in `specs` that applies to this platform.
    ///
    /// Requests whose OS constraint excludes the running platform are
    /// dropped without a trace in the report. All others run concurrently
    /// and fail independently; only a cache index that can not be read or
    /// written aborts the whole batch.
    ///
    /// With `force`, each target directory is emptied and the cache is
    /// bypassed, though a command found on `PATH` still wins.
    pub async fn get_all(&self, specs: &[BinarySpec], force: bool) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        let mut applicable = Vec::with_capacity(specs.len());
        for spec in specs {
            match spec.os_constraint() {
                Ok(constraint) if !matches(constraint.as_ref(), &self.current) => {
                    tracing::debug!(name = %spec.name, platform = %self.current, "skipped for this platform");
                }
                Ok(_) => applicable.push(spec),
                Err(e) => self.record_failure(&mut report, &spec.name, &e),
            }
        }

        let mut requests = Vec::with_capacity(applicable.len());
        for (spec, validated) in applicable.iter().zip(validate_all(&applicable, &self.settings.home)) {
            match validated {
                Ok(request) => requests.push(request),
                Err(e) => self.record_failure(&mut report, &spec.name, &e),
            }
        }

        let outcomes = join_all(requests.iter().map(|request| self.get_one(request, force))).await;
        for (request, outcome) in requests.iter().zip(outcomes) {
            match outcome {
                Ok(resolved) => {
                    report.binaries.insert(request.name.clone(), resolved);
                }
                Err(e) if e.is_batch_fatal() => return Err(e),
                Err(e) => self.record_failure(&mut report, &request.name, &e),
            }
        }
        Ok(report)
    }

    async fn get_one(&self, request: &BinaryRequest, force: bool) -> Result<ResolvedBinary> {
        let resolver = Resolver {
            index: &self.index,
            search_path: self.search_path.as_ref(),
        };
        if let Some(resolved) = resolver.resolve(request, force).await? {
            return Ok(resolved);
        }

        if force {
            let target = request.target.clone();
            tokio::task::spawn_blocking(move || getbin_fs::empty_dir(target))
                .await?
                .map_err(|source| Error::Install {
                    name: request.name.clone(),
                    source,
                })?;
        }

        Pipeline {
            fetcher: &self.fetcher,
            index: &self.index,
            progress: self.progress.as_ref(),
        }
        .run(request)
        .await
    }

    fn record_failure(&self, report: &mut BatchReport, name: &str, err: &Error) {
        let failure = RequestFailure::new(name, err);
        tracing::warn!("{failure}");
        report.errors.push(failure);
    }
}
