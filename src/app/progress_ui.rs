//! Progress UI: the single consumer of job updates.

use indicatif::{ProgressBar, ProgressStyle};
use quicktube_core::download::{JobUpdate, UpdateReceiver};
use quicktube_core::job::JobStatus;
use quicktube_core::progress::{EventKind, ProgressEvent};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const BAR_TEMPLATE: &str = "{spinner} [{bar:30}] {pos:>3}% {msg}";

/// Spawns the task that renders updates until every sender is dropped.
pub(crate) fn spawn_progress_ui(bar: ProgressBar, updates: UpdateReceiver) -> JoinHandle<()> {
    bar.set_style(
        ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    tokio::spawn(consume_updates(bar, updates))
}

async fn consume_updates(bar: ProgressBar, mut updates: UpdateReceiver) {
    let mut state = UiState::default();
    while let Some(update) = updates.recv().await {
        state.apply(&bar, update);
    }
    bar.finish_and_clear();
}

/// What the UI remembers about the current job.
#[derive(Debug, Default)]
struct UiState {
    label: String,
    percent: u64,
}

impl UiState {
    fn apply(&mut self, bar: &ProgressBar, update: JobUpdate) {
        match update {
            JobUpdate::Queued {
                job_id,
                url,
                position,
            } => {
                self.label = match position {
                    Some((n, total)) => format!("[{n}/{total}] {url}"),
                    None => url,
                };
                self.percent = 0;
                bar.reset();
                bar.set_position(0);
                bar.set_message(self.label.clone());
                bar.enable_steady_tick(std::time::Duration::from_millis(120));
                debug!(job = job_id, label = %self.label, "job queued");
            }
            JobUpdate::Event { job_id, event } => self.apply_event(bar, job_id, &event),
            JobUpdate::Status { job_id, status } => match status {
                JobStatus::AwaitingReconciliation => {
                    bar.set_message(format!("{} (placing file)", self.label));
                }
                JobStatus::Resolved | JobStatus::Failed => {
                    bar.disable_steady_tick();
                    bar.set_message(format!("{} ({status})", self.label));
                    debug!(job = job_id, %status, "job finished");
                }
                JobStatus::Pending | JobStatus::InProgress => {}
            },
            JobUpdate::Reconciled {
                job_id,
                decision,
                path,
            } => {
                debug!(job = job_id, %decision, ?path, "file placed");
            }
            JobUpdate::Compatibility { job_id, info } => {
                let line = format!(
                    "{}: {} ({} / {} in {})",
                    info.path.display(),
                    info.compatibility.as_str(),
                    info.video_codec.as_str(),
                    info.audio_codec.as_str(),
                    info.container
                );
                bar.suspend(|| info!(job = job_id, "{line}"));
                for issue in &info.issues {
                    bar.suspend(|| warn!(job = job_id, "{issue}"));
                }
            }
            JobUpdate::Converting { percent, .. } => {
                if let Some(percent) = percent {
                    bar.set_position(to_position(percent));
                }
                bar.set_message(format!("{} (converting)", self.label));
            }
            JobUpdate::Notice { job_id, message } => {
                bar.suspend(|| warn!(job = job_id, "{message}"));
            }
        }
    }

    fn apply_event(&mut self, bar: &ProgressBar, job_id: u64, event: &ProgressEvent) {
        match event.kind() {
            EventKind::Progress => {
                if let Some(percent) = event.percent() {
                    // Separate audio/video streams restart at 0%; never go backwards.
                    self.percent = self.percent.max(to_position(percent));
                    bar.set_position(self.percent);
                }
            }
            EventKind::Complete => {
                self.percent = 100;
                bar.set_position(100);
            }
            EventKind::CacheHit => {
                bar.set_position(100);
                bar.set_message(format!("{} (already downloaded)", self.label));
            }
            EventKind::Error => {
                bar.suspend(|| warn!(job = job_id, "{}", event.raw()));
            }
            EventKind::Info => {
                debug!(job = job_id, line = event.raw(), "yt-dlp");
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn to_position(percent: f32) -> u64 {
    percent.clamp(0.0, 100.0).round() as u64
}
