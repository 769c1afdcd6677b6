//! Integration tests for the download engine, driven by a scripted yt-dlp.

#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use quicktube_core::config::AppConfig;
use quicktube_core::download::{DownloadEngine, DownloadError, JobUpdate, channel};
use quicktube_core::history::History;
use quicktube_core::job::{JobRegistry, JobStatus};
use quicktube_core::progress::EventKind;
use quicktube_core::reconcile::{ConflictChoice, FixedChoice, ReconciliationDecision};
use quicktube_core::sweeper::CleanupSweeper;
use quicktube_core::temp_store::TempStore;
use quicktube_core::ytdlp::{CookieSource, DownloadOptions};
use tempfile::TempDir;

mod support;
use support::{DOWNLOADS_TEST_VIDEO, VIDEO_URL, aged_file, fake_ytdlp};

struct Fixture {
    root: TempDir,
    config: AppConfig,
}

impl Fixture {
    fn new(script: &str) -> Self {
        let root = TempDir::new().unwrap();
        let bin = root.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let mut config = AppConfig::with_root(&root.path().join("data"));
        config.ytdlp_path = fake_ytdlp(&bin, script);
        Self { root, config }
    }

    fn dest(&self) -> std::path::PathBuf {
        self.root.path().join("dest")
    }

    fn engine(&self, choice: ConflictChoice) -> DownloadEngine {
        self.engine_with(Arc::new(JobRegistry::new()), choice)
    }

    fn engine_with(&self, registry: Arc<JobRegistry>, choice: ConflictChoice) -> DownloadEngine {
        DownloadEngine::new(self.config.clone(), registry, Arc::new(FixedChoice(choice)))
    }
}

fn temp_files(dir: &Path) -> Vec<String> {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn test_download_moves_file_into_destination() {
    let fixture = Fixture::new(DOWNLOADS_TEST_VIDEO);
    let engine = fixture.engine(ConflictChoice::Skip);

    let report = engine
        .download_video(VIDEO_URL, &fixture.dest(), &DownloadOptions::default())
        .await
        .unwrap();

    let expected = fixture.dest().join("Test Video.mp4");
    assert_eq!(report.decision, ReconciliationDecision::MoveDirect);
    assert_eq!(report.status, JobStatus::Resolved);
    assert_eq!(report.final_path.as_deref(), Some(expected.as_path()));
    assert_eq!(report.title.as_deref(), Some("Test Video"));
    assert_eq!(fs::read_to_string(&expected).unwrap(), "video bytes");
    assert!(temp_files(&fixture.config.temp_dir).is_empty());
    assert_eq!(engine.registry().live_count(), 0);

    let history = History::load(&fixture.config.history_path());
    assert_eq!(history.len(), 1);
    assert_eq!(history.entries()[0].url, VIDEO_URL);
    assert_eq!(history.entries()[0].filename, "Test Video.mp4");
}

#[tokio::test]
async fn test_download_renames_on_collision() {
    let fixture = Fixture::new(DOWNLOADS_TEST_VIDEO);
    fs::create_dir_all(fixture.dest()).unwrap();
    fs::write(fixture.dest().join("Test Video.mp4"), "older").unwrap();

    let report = fixture
        .engine(ConflictChoice::RenameAndMove)
        .download_video(VIDEO_URL, &fixture.dest(), &DownloadOptions::default())
        .await
        .unwrap();

    assert_eq!(report.decision, ReconciliationDecision::RenameAndMove);
    assert_eq!(
        report.final_path,
        Some(fixture.dest().join("Test Video (2).mp4"))
    );
    assert_eq!(
        fs::read_to_string(fixture.dest().join("Test Video.mp4")).unwrap(),
        "older"
    );
}

#[tokio::test]
async fn test_skipped_collision_records_no_history() {
    let fixture = Fixture::new(DOWNLOADS_TEST_VIDEO);
    fs::create_dir_all(fixture.dest()).unwrap();
    fs::write(fixture.dest().join("Test Video.mp4"), "older").unwrap();

    let report = fixture
        .engine(ConflictChoice::Skip)
        .download_video(VIDEO_URL, &fixture.dest(), &DownloadOptions::default())
        .await
        .unwrap();

    assert_eq!(report.decision, ReconciliationDecision::Skip);
    assert_eq!(report.final_path, None);
    assert!(temp_files(&fixture.config.temp_dir).is_empty());
    assert!(History::load(&fixture.config.history_path()).is_empty());
}

#[tokio::test]
async fn test_cache_hit_beats_newer_temp_file() {
    let fixture = Fixture::new(
        r#"echo "[download] $tmp/Cached Clip.mp4 has already been downloaded""#,
    );
    fs::create_dir_all(&fixture.config.temp_dir).unwrap();
    aged_file(
        &fixture.config.temp_dir,
        "Cached Clip.mp4",
        "cached",
        Duration::from_secs(600),
    );
    aged_file(&fixture.config.temp_dir, "Newer.mp4", "newer", Duration::from_secs(1));

    let report = fixture
        .engine(ConflictChoice::Skip)
        .download_video(VIDEO_URL, &fixture.dest(), &DownloadOptions::default())
        .await
        .unwrap();

    assert_eq!(
        report.final_path,
        Some(fixture.dest().join("Cached Clip.mp4"))
    );
    assert!(fixture.config.temp_dir.join("Newer.mp4").exists());
}

#[tokio::test]
async fn test_periodic_sweep_spares_stale_cache_hit_while_streaming() {
    let fixture = Fixture::new(
        r#"echo "[download] $tmp/Test Video.mp4 has already been downloaded"
sleep 1"#,
    );
    fs::create_dir_all(&fixture.config.temp_dir).unwrap();
    aged_file(
        &fixture.config.temp_dir,
        "Test Video.mp4",
        "cached",
        Duration::from_secs(48 * 3600),
    );

    let registry = Arc::new(JobRegistry::new());
    let sweeper = CleanupSweeper::new(
        TempStore::new(&fixture.config.temp_dir),
        Arc::clone(&registry),
    )
    .with_threshold(Duration::from_secs(24 * 3600))
    .spawn_periodic(Duration::from_millis(100));

    let result = fixture
        .engine_with(Arc::clone(&registry), ConflictChoice::Skip)
        .download_video(VIDEO_URL, &fixture.dest(), &DownloadOptions::default())
        .await;
    sweeper.stop().await;

    let report = result.unwrap();
    let expected = fixture.dest().join("Test Video.mp4");
    assert_eq!(report.final_path.as_deref(), Some(expected.as_path()));
    assert_eq!(fs::read_to_string(&expected).unwrap(), "cached");
    assert!(registry.claimed_paths().is_empty());
}

#[tokio::test]
async fn test_subprocess_failure_is_reported_with_tail() {
    let fixture = Fixture::new(
        r#"echo "[youtube] Extracting URL: $url"
echo "ERROR: [youtube] dQw4w9WgXcQ: Video unavailable" >&2
exit 1"#,
    );
    let engine = fixture.engine(ConflictChoice::Skip);

    let err = engine
        .download_video(VIDEO_URL, &fixture.dest(), &DownloadOptions::default())
        .await
        .unwrap_err();

    match &err {
        DownloadError::Subprocess { code, tail, .. } => {
            assert_eq!(*code, Some(1));
            assert!(tail.contains("Video unavailable"));
        }
        other => panic!("expected subprocess error, got {other:?}"),
    }
    assert_eq!(engine.registry().live_count(), 0);
    assert!(!fixture.dest().exists());
}

#[tokio::test]
async fn test_auth_wall_becomes_auth_error() {
    let fixture = Fixture::new(
        r#"echo "ERROR: [youtube] dQw4w9WgXcQ: Sign in to confirm you're not a bot. Use --cookies-from-browser" >&2
exit 1"#,
    );

    let err = fixture
        .engine(ConflictChoice::Skip)
        .download_video(VIDEO_URL, &fixture.dest(), &DownloadOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_auth());
    assert!(err.to_string().starts_with("[AUTH]"));
}

#[tokio::test]
async fn test_successful_exit_without_file_is_missing_output() {
    let fixture = Fixture::new(r#"echo "[youtube] Extracting URL: $url""#);

    let err = fixture
        .engine(ConflictChoice::Skip)
        .download_video(VIDEO_URL, &fixture.dest(), &DownloadOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::MissingOutput { .. }));
}

#[tokio::test]
async fn test_invalid_url_never_starts_ytdlp() {
    let fixture = Fixture::new(r#"touch "$tmp/../../started""#);

    let err = fixture
        .engine(ConflictChoice::Skip)
        .download_video("https://example.com/video", &fixture.dest(), &DownloadOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::Source(_)));
    assert!(!fixture.root.path().join("started").exists());
}

#[tokio::test]
async fn test_updates_stream_progress_and_final_status() {
    let fixture = Fixture::new(DOWNLOADS_TEST_VIDEO);
    let (tx, mut rx) = channel();
    let engine = fixture.engine(ConflictChoice::Skip).with_updates(tx);

    engine
        .download_video(VIDEO_URL, &fixture.dest(), &DownloadOptions::default())
        .await
        .unwrap();
    drop(engine);

    let mut updates = Vec::new();
    while let Some(update) = rx.recv().await {
        updates.push(update);
    }

    assert!(matches!(updates.first(), Some(JobUpdate::Queued { position: None, .. })));
    assert!(updates.iter().any(|u| matches!(
        u,
        JobUpdate::Event { event, .. } if event.kind() == EventKind::Complete
    )));
    assert!(updates.iter().any(|u| matches!(
        u,
        JobUpdate::Reconciled { decision: ReconciliationDecision::MoveDirect, .. }
    )));
    assert!(matches!(
        updates.last(),
        Some(JobUpdate::Status { status: JobStatus::Resolved, .. })
    ));
}

#[tokio::test]
async fn test_batch_continues_after_failure() {
    let fixture = Fixture::new(DOWNLOADS_TEST_VIDEO);
    let urls = vec!["not a url".to_string(), VIDEO_URL.to_string()];

    let results = fixture
        .engine(ConflictChoice::Skip)
        .download_batch(&urls, &fixture.dest(), &DownloadOptions::default())
        .await;

    assert_eq!(results.len(), 2);
    assert!(results[0].1.is_err());
    assert!(results[1].1.is_ok());
}

const CHANNEL_SCRIPT: &str = r#"if [ "$listing" = "1" ]; then
  printf 'Some Creator\thttps://www.youtube.com/watch?v=aaaaaaaaaaa\n'
  printf 'Some Creator\thttps://www.youtube.com/watch?v=bbbbbbbbbbb\n'
  exit 0
fi
id="${url##*=}"
out="$tmp/Video $id.mp4"
printf 'bytes' > "$out"
echo "[download] Destination: $out"
echo "[download] 100% of    1.00MiB in 00:00:01 at 1.00MiB/s""#;

#[tokio::test]
async fn test_channel_lists_and_downloads_into_uploader_folder() {
    let fixture = Fixture::new(CHANNEL_SCRIPT);
    let engine = fixture.engine(ConflictChoice::Skip);
    let channel_url = "https://www.youtube.com/@somecreator";

    let entries = engine
        .list_channel(channel_url, &CookieSource::None)
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].uploader, "Some Creator");

    let report = engine
        .download_channel(channel_url, &fixture.dest(), &DownloadOptions::default())
        .await
        .unwrap();
    assert_eq!(report.total(), 2);
    assert!(report.failed.is_empty());

    let folder = fixture.dest().join("Some Creator");
    assert!(folder.join("Video aaaaaaaaaaa.mp4").is_file());
    assert!(folder.join("Video bbbbbbbbbbb.mp4").is_file());
}

#[tokio::test]
async fn test_empty_channel_listing_is_an_error() {
    let fixture = Fixture::new("exit 0");
    let err = fixture
        .engine(ConflictChoice::Skip)
        .list_channel("https://www.youtube.com/@nobody", &CookieSource::None)
        .await
        .unwrap_err();
    assert!(matches!(err, DownloadError::EmptyChannel { .. }));
}
