//! End-to-end CLI tests for the quicktube binary.
//!
//! Every test runs with `HOME` and the XDG roots pointed at a fresh temp
//! directory so no real settings or history are touched.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

mod support;

struct Env {
    home: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
        }
    }

    fn data_dir(&self) -> PathBuf {
        self.home.path().join("data").join("quicktube")
    }

    fn write_config(&self, body: &str) {
        let dir = self.home.path().join("config").join("quicktube");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), body).unwrap();
    }

    /// Config pointing every external tool somewhere that does not exist.
    fn write_default_config(&self, ytdlp: &Path) {
        let missing = self.home.path().join("missing");
        self.write_config(&format!(
            "ytdlp_path = \"{}\"\nffprobe_path = \"{}\"\nffmpeg_path = \"{}\"\n",
            ytdlp.display(),
            missing.join("ffprobe").display(),
            missing.join("ffmpeg").display(),
        ));
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("quicktube").unwrap();
        cmd.env("HOME", self.home.path())
            .env("XDG_DATA_HOME", self.home.path().join("data"))
            .env("XDG_CONFIG_HOME", self.home.path().join("config"))
            .env_remove("RUST_LOG")
            .arg("--no-color");
        cmd
    }
}

#[test]
fn test_help_lists_commands() {
    Env::new()
        .cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("download"))
        .stdout(predicate::str::contains("channel"))
        .stdout(predicate::str::contains("sweep"));
}

#[test]
fn test_missing_subcommand_is_usage_error() {
    Env::new().cmd().assert().code(2);
}

#[test]
fn test_settings_set_then_show() {
    let env = Env::new();
    env.cmd()
        .args(["settings", "set", "video_quality", "720"])
        .assert()
        .success();
    assert!(env.data_dir().join("settings.json").is_file());

    env.cmd()
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("video_quality = 720p"))
        .stdout(predicate::str::contains("check_compatibility = true"));
}

#[test]
fn test_settings_set_unknown_key_fails() {
    Env::new()
        .cmd()
        .args(["settings", "set", "turbo", "on"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("turbo"));
}

#[test]
fn test_history_empty() {
    Env::new()
        .cmd()
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No downloads recorded yet."));
}

#[test]
fn test_sweep_removes_stale_temp_files() {
    let env = Env::new();
    let temp = env.data_dir().join("temp");
    fs::create_dir_all(&temp).unwrap();
    let stale = support::aged_file(
        &temp,
        "old.mp4",
        "x",
        std::time::Duration::from_secs(30 * 3600),
    );
    let fresh = support::aged_file(&temp, "new.mp4", "x", std::time::Duration::from_secs(60));

    env.cmd()
        .arg("sweep")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 stale file(s) removed"));
    assert!(!stale.exists());
    assert!(fresh.exists());
}

#[test]
fn test_sweep_rejects_out_of_range_hours() {
    Env::new()
        .cmd()
        .args(["sweep", "--max-age-hours", "0"])
        .assert()
        .code(2);
}

#[test]
fn test_bad_config_file_exits_with_usage_code() {
    let env = Env::new();
    env.write_config("speed = \"fast\"\n");
    env.cmd()
        .arg("history")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_download_rejects_non_youtube_url() {
    let env = Env::new();
    env.write_default_config(&env.home.path().join("missing").join("yt-dlp"));
    env.cmd()
        .args(["download", "https://example.com/watch?v=abc"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not a YouTube video or channel URL"));
}

#[test]
fn test_channel_without_yes_refuses_when_not_interactive() {
    let env = Env::new();
    env.write_default_config(&env.home.path().join("missing").join("yt-dlp"));
    env.cmd()
        .args(["channel", "https://www.youtube.com/@somebody"])
        .write_stdin("")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

#[cfg(unix)]
#[test]
fn test_download_with_scripted_ytdlp() {
    let env = Env::new();
    let bin = env.home.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    let ytdlp = support::fake_ytdlp(&bin, support::DOWNLOADS_TEST_VIDEO);
    env.write_default_config(&ytdlp);
    let dest = env.home.path().join("videos");

    env.cmd()
        .args(["download", support::VIDEO_URL, "--on-conflict", "rename", "--dest"])
        .arg(&dest)
        .assert()
        .success()
        .stdout(predicate::str::contains("saved"))
        .stdout(predicate::str::contains("Test Video.mp4"));
    assert!(dest.join("Test Video.mp4").is_file());

    env.cmd()
        .args(["download", support::VIDEO_URL, "--on-conflict", "rename", "--dest"])
        .arg(&dest)
        .assert()
        .success();
    assert!(dest.join("Test Video (2).mp4").is_file());

    env.cmd()
        .args(["history", "--search", "test vdeo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Test Video"));
}
