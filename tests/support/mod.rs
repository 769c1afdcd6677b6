//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// Creates `dir/name` with `content` and a modification time `age` in the past.
pub fn aged_file(dir: &Path, name: &str, content: &str, age: Duration) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::now() - age)
        .unwrap();
    path
}

/// Writes an executable shell script standing in for yt-dlp.
///
/// The script receives the same arguments yt-dlp would. `$tmp` holds the
/// directory part of the `-o` template, `$url` the final argument and
/// `$listing` is 1 for channel listings.
#[cfg(unix)]
pub fn fake_ytdlp(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        r#"#!/bin/sh
tmpl=""
url=""
listing=0
while [ $# -gt 0 ]; do
  case "$1" in
    -o) tmpl="$2"; shift 2 ;;
    --flat-playlist) listing=1; shift ;;
    --) url="$2"; shift 2 ;;
    *) shift ;;
  esac
done
tmp="${{tmpl%/*}}"
{body}
"#
    );
    let path = dir.join("yt-dlp");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Writes `Test Video.mp4` into the temp folder and reports it.
pub const DOWNLOADS_TEST_VIDEO: &str = r#"out="$tmp/Test Video.mp4"
printf 'video bytes' > "$out"
echo "[youtube] Extracting URL: $url"
echo "[download] Destination: $out"
echo "[download]  50.0% of    1.00MiB at  1.00MiB/s ETA 00:01"
echo "[download] 100% of    1.00MiB in 00:00:01 at 1.00MiB/s""#;
