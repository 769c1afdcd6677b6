//! Runs download jobs end to end.
//!
//! One job is: yt-dlp into the Temp Store, work out which file it produced,
//! reconcile that file into the destination folder, record history, then
//! optionally rate (and convert) the result. Every step reports to the UI
//! through a [`JobUpdate`] channel; the engine never touches UI state.
//!
//! Batches and channels run strictly one job at a time.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::tracker::TempPathTracker;
use super::update::{JobUpdate, UpdateSender};
use super::DownloadError;
use crate::codec::{ConversionPlan, MediaInfo, convert, default_output_path, probe};
use crate::config::AppConfig;
use crate::history::{HistoryEntry, append as append_history};
use crate::job::{DownloadJob, JobId, JobRegistry, JobStatus};
use crate::process::{TAIL_LINES, run_captured, run_streaming};
use crate::progress::{classify_line, is_auth_wall};
use crate::reconcile::{ConflictResolver, ReconciliationDecision, Reconciler};
use crate::source::validate_url;
use crate::temp_store::TempStore;
use crate::ytdlp::{
    ChannelEntry, CookieSource, DownloadOptions, channel_listing_args, parse_channel_listing,
    video_args,
};

/// What happened to a job that reached `Resolved`.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub job_id: JobId,
    pub url: String,
    pub status: JobStatus,
    pub decision: ReconciliationDecision,
    /// `None` when the user skipped a collision.
    pub final_path: Option<PathBuf>,
    pub title: Option<String>,
    /// Present when compatibility checking is enabled and ffprobe succeeded.
    pub compatibility: Option<MediaInfo>,
    /// Output of an automatic conversion.
    pub converted: Option<PathBuf>,
}

/// Outcome of a channel download.
#[derive(Debug, Default)]
pub struct ChannelReport {
    pub completed: Vec<JobReport>,
    pub failed: Vec<(String, DownloadError)>,
}

impl ChannelReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len()
    }
}

/// Drives yt-dlp jobs through the reconciliation pipeline.
pub struct DownloadEngine {
    config: AppConfig,
    store: TempStore,
    registry: Arc<JobRegistry>,
    resolver: Arc<dyn ConflictResolver>,
    updates: Option<UpdateSender>,
    check_compatibility: bool,
    auto_convert: bool,
}

impl fmt::Debug for DownloadEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadEngine")
            .field("store", &self.store)
            .field("live_jobs", &self.registry.live_count())
            .field("check_compatibility", &self.check_compatibility)
            .field("auto_convert", &self.auto_convert)
            .finish_non_exhaustive()
    }
}

impl DownloadEngine {
    /// Creates an engine writing into `config.temp_dir`.
    ///
    /// `registry` should be shared with the [`CleanupSweeper`](crate::sweeper::CleanupSweeper)
    /// so files of running jobs are never swept.
    #[must_use]
    pub fn new(
        config: AppConfig,
        registry: Arc<JobRegistry>,
        resolver: Arc<dyn ConflictResolver>,
    ) -> Self {
        let store = TempStore::new(&config.temp_dir);
        Self {
            config,
            store,
            registry,
            resolver,
            updates: None,
            check_compatibility: false,
            auto_convert: false,
        }
    }

    /// Sends progress to `updates`.
    #[must_use]
    pub fn with_updates(mut self, updates: UpdateSender) -> Self {
        self.updates = Some(updates);
        self
    }

    /// Enables the ffprobe check and, when `auto_convert` is set, ffmpeg
    /// conversion of files that need it.
    #[must_use]
    pub fn with_post_processing(mut self, check_compatibility: bool, auto_convert: bool) -> Self {
        self.check_compatibility = check_compatibility;
        self.auto_convert = check_compatibility && auto_convert;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn store(&self) -> &TempStore {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Downloads one video into `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] when the URL is rejected, yt-dlp fails, no
    /// output file can be found, or reconciliation fails. The job is marked
    /// `Failed` and a final status update is sent before returning.
    #[instrument(skip(self, options), fields(dest = %dest.display()))]
    pub async fn download_video(
        &self,
        url: &str,
        dest: &Path,
        options: &DownloadOptions,
    ) -> Result<JobReport, DownloadError> {
        self.download_at(url, dest, options, None).await
    }

    /// Downloads each URL in turn. One failure does not stop the rest.
    pub async fn download_batch(
        &self,
        urls: &[String],
        dest: &Path,
        options: &DownloadOptions,
    ) -> Vec<(String, Result<JobReport, DownloadError>)> {
        let total = urls.len();
        let mut results = Vec::with_capacity(total);
        for (index, url) in urls.iter().enumerate() {
            let position = (total > 1).then_some((index + 1, total));
            let result = self.download_at(url, dest, options, position).await;
            results.push((url.clone(), result));
        }
        results
    }

    /// Lists a channel's videos with their uploader.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::AuthRequired`] or [`DownloadError::Subprocess`]
    /// when yt-dlp fails, and [`DownloadError::EmptyChannel`] when it lists
    /// nothing.
    #[instrument(skip(self, cookies))]
    pub async fn list_channel(
        &self,
        url: &str,
        cookies: &CookieSource,
    ) -> Result<Vec<ChannelEntry>, DownloadError> {
        validate_url(url).map_err(DownloadError::Source)?;
        let args = channel_listing_args(url, cookies);
        let output = run_captured(&self.config.ytdlp_path, &args)
            .await
            .map_err(|source| DownloadError::Spawn {
                url: url.to_string(),
                source,
            })?;

        if !output.success {
            if output.stderr.lines().any(is_auth_wall) {
                return Err(DownloadError::auth_required(url));
            }
            let lines: Vec<&str> = output.stderr.lines().filter(|l| !l.trim().is_empty()).collect();
            let tail = lines[lines.len().saturating_sub(TAIL_LINES)..].join("\n");
            return Err(DownloadError::subprocess(url, output.code, tail));
        }

        let entries = parse_channel_listing(&output.stdout);
        if entries.is_empty() {
            return Err(DownloadError::EmptyChannel {
                url: url.to_string(),
            });
        }
        info!(count = entries.len(), "channel listed");
        Ok(entries)
    }

    /// Downloads every video of a channel into `<dest>/<uploader>/`.
    ///
    /// # Errors
    ///
    /// Only listing failures are returned; per-video failures are collected
    /// in the report.
    #[instrument(skip(self, options), fields(dest = %dest.display()))]
    pub async fn download_channel(
        &self,
        url: &str,
        dest: &Path,
        options: &DownloadOptions,
    ) -> Result<ChannelReport, DownloadError> {
        let entries = self.list_channel(url, &options.cookies).await?;
        self.download_entries(&entries, dest, options).await
    }

    /// Downloads already listed channel entries, one at a time.
    ///
    /// # Errors
    ///
    /// Never fails as a whole; the `Result` matches [`Self::download_channel`].
    pub async fn download_entries(
        &self,
        entries: &[ChannelEntry],
        dest: &Path,
        options: &DownloadOptions,
    ) -> Result<ChannelReport, DownloadError> {
        let total = entries.len();
        let mut report = ChannelReport::default();
        for (index, entry) in entries.iter().enumerate() {
            let folder = dest.join(entry.folder_name());
            match self
                .download_at(&entry.url, &folder, options, Some((index + 1, total)))
                .await
            {
                Ok(job) => report.completed.push(job),
                Err(e) => report.failed.push((entry.url.clone(), e)),
            }
        }
        info!(
            completed = report.completed.len(),
            failed = report.failed.len(),
            "channel download finished"
        );
        Ok(report)
    }

    async fn download_at(
        &self,
        url: &str,
        dest: &Path,
        options: &DownloadOptions,
        position: Option<(usize, usize)>,
    ) -> Result<JobReport, DownloadError> {
        let url = url.trim();
        validate_url(url).map_err(DownloadError::Source)?;

        let mut job = DownloadJob::new(self.registry.next_id(), url, options.quality, dest);
        self.registry.track(&job).map_err(DownloadError::Job)?;
        self.emit(JobUpdate::Queued {
            job_id: job.id(),
            url: url.to_string(),
            position,
        });
        self.emit_status(&job);

        match self.run(&mut job, options).await {
            Ok(report) => Ok(report),
            Err(e) => Err(self.fail(&mut job, e)),
        }
    }

    async fn run(
        &self,
        job: &mut DownloadJob,
        options: &DownloadOptions,
    ) -> Result<JobReport, DownloadError> {
        self.store.ensure_exists().map_err(DownloadError::TempStore)?;
        job.start().map_err(DownloadError::Job)?;
        self.registry.track(job).map_err(DownloadError::Job)?;
        self.emit_status(job);

        let temp_path = self.fetch(job, options).await?;

        job.set_temp_file(&temp_path);
        self.registry.track(job).map_err(DownloadError::Job)?;
        job.await_reconciliation().map_err(DownloadError::Job)?;
        self.registry.track(job).map_err(DownloadError::Job)?;
        self.emit_status(job);

        let reconciler = Reconciler::new(self.resolver.as_ref());
        let outcome = reconciler
            .reconcile(job)
            .await
            .map_err(DownloadError::Reconcile)?;
        self.registry.track(job).map_err(DownloadError::Job)?;
        self.emit(JobUpdate::Reconciled {
            job_id: job.id(),
            decision: outcome.decision,
            path: outcome.final_path.clone(),
        });
        self.emit_status(job);

        let removed = self.store.remove_fragments(job.title());
        if !removed.is_empty() {
            debug!(job = job.id(), count = removed.len(), "removed stream fragments");
        }

        if let Some(final_path) = &outcome.final_path {
            self.record_history(job, final_path);
        }

        let (compatibility, converted) = match &outcome.final_path {
            Some(path) => self.post_process(job.id(), path).await,
            None => (None, None),
        };

        Ok(JobReport {
            job_id: job.id(),
            url: job.url().to_string(),
            status: job.status(),
            decision: outcome.decision,
            final_path: outcome.final_path,
            title: job.title().map(str::to_string),
            compatibility,
            converted,
        })
    }

    /// Runs yt-dlp for `job` and returns the temp file it produced.
    async fn fetch(
        &self,
        job: &DownloadJob,
        options: &DownloadOptions,
    ) -> Result<PathBuf, DownloadError> {
        let url = job.url();
        let job_id = job.id();
        let args = video_args(url, self.store.root(), options);
        let updates = self.updates.clone();
        let registry: &JobRegistry = &self.registry;
        let store = &self.store;
        let mut tracker = TempPathTracker::new();
        let mut auth_wall = false;

        let outcome = run_streaming(&self.config.ytdlp_path, &args, |line| {
            if is_auth_wall(line) {
                auth_wall = true;
            }
            if let Some(event) = classify_line(line) {
                if let Some(path) = tracker.observe(&event) {
                    claim_streamed(registry, store, job_id, &path);
                }
                send(updates.as_ref(), JobUpdate::Event { job_id, event });
            }
        })
        .await
        .map_err(|source| DownloadError::Spawn {
            url: url.to_string(),
            source,
        })?;

        if !outcome.success {
            if auth_wall {
                return Err(DownloadError::auth_required(url));
            }
            return Err(DownloadError::subprocess(url, outcome.code, outcome.tail_text()));
        }

        tracker
            .resolve(&self.store)
            .map_err(DownloadError::TempStore)?
            .ok_or_else(|| DownloadError::MissingOutput {
                url: url.to_string(),
            })
    }

    fn record_history(&self, job: &DownloadJob, final_path: &Path) {
        let filename = final_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let entry = HistoryEntry::now(job.title().unwrap_or_default(), job.url(), filename);
        if let Err(e) = append_history(&self.config.history_path(), entry) {
            warn!(job = job.id(), error = %e, "could not record download history");
        }
    }

    /// Compatibility check and optional conversion. Never fails the job.
    async fn post_process(
        &self,
        job_id: JobId,
        path: &Path,
    ) -> (Option<MediaInfo>, Option<PathBuf>) {
        if !self.check_compatibility {
            return (None, None);
        }

        let info = match probe(&self.config.ffprobe_path, path).await {
            Ok(info) => info,
            Err(e) => {
                warn!(job = job_id, error = %e, "compatibility check failed");
                self.emit(JobUpdate::Notice {
                    job_id,
                    message: format!("compatibility check failed: {e}"),
                });
                return (None, None);
            }
        };
        self.emit(JobUpdate::Compatibility {
            job_id,
            info: Box::new(info.clone()),
        });

        if !self.auto_convert || !info.needs_conversion() {
            return (Some(info), None);
        }

        let plan = ConversionPlan {
            video: info.video_needs_conversion(),
            audio: info.audio_needs_conversion(),
        };
        let output = default_output_path(path);
        let updates = self.updates.clone();
        let result = convert(
            &self.config.ffmpeg_path,
            path,
            &output,
            plan,
            info.duration,
            |progress| {
                send(
                    updates.as_ref(),
                    JobUpdate::Converting {
                        job_id,
                        percent: progress.percent,
                    },
                );
            },
        )
        .await;

        match result {
            Ok(()) => (Some(info), Some(output)),
            Err(e) => {
                warn!(job = job_id, error = %e, "automatic conversion failed");
                self.emit(JobUpdate::Notice {
                    job_id,
                    message: format!("conversion failed: {e}"),
                });
                (Some(info), None)
            }
        }
    }

    /// Marks `job` failed (unless reconciliation already did), releases it
    /// and hands the error back.
    fn fail(&self, job: &mut DownloadJob, error: DownloadError) -> DownloadError {
        if !job.status().is_terminal()
            && let Err(e) = job.fail(error.to_string())
        {
            debug!(job = job.id(), error = %e, "could not mark job failed");
        }
        self.registry.forget(job.id());
        warn!(job = job.id(), url = job.url(), error = %error, "download failed");
        self.emit_status(job);
        error
    }

    fn emit_status(&self, job: &DownloadJob) {
        self.emit(JobUpdate::Status {
            job_id: job.id(),
            status: job.status(),
        });
    }

    fn emit(&self, update: JobUpdate) {
        send(self.updates.as_ref(), update);
    }
}

/// Claims a file yt-dlp named mid-run, keyed the way the sweeper lists it.
fn claim_streamed(registry: &JobRegistry, store: &TempStore, job_id: JobId, path: &Path) {
    let key = match path.file_name() {
        Some(name) if path.is_relative() || path.parent() == Some(store.root()) => {
            store.root().join(name)
        }
        _ => path.to_path_buf(),
    };
    if let Err(e) = registry.claim_path(job_id, &key) {
        warn!(job = job_id, error = %e, "streamed temp file already claimed");
    }
}

fn send(updates: Option<&UpdateSender>, update: JobUpdate) {
    if let Some(tx) = updates
        && tx.send(update).is_err()
    {
        debug!("update receiver closed");
    }
}
