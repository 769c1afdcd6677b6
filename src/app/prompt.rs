//! Interactive answers to destination collisions.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use indicatif::ProgressBar;
use quicktube_core::reconcile::{Conflict, ConflictChoice, ConflictResolver};
use tracing::warn;

/// Asks on stderr/stdin, pausing the progress bar while waiting.
pub(crate) struct PromptResolver {
    bar: ProgressBar,
}

impl PromptResolver {
    pub(crate) fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

#[async_trait]
impl ConflictResolver for PromptResolver {
    async fn resolve(&self, conflict: &Conflict) -> ConflictChoice {
        let bar = self.bar.clone();
        let conflict = conflict.clone();
        let answer = tokio::task::spawn_blocking(move || {
            bar.suspend(|| ask(&conflict, io::stdin().lock(), io::stderr()))
        })
        .await;
        match answer {
            Ok(choice) => choice,
            Err(e) => {
                warn!(error = %e, "collision prompt failed; skipping");
                ConflictChoice::Skip
            }
        }
    }
}

/// Prompts until a valid answer arrives. End of input means skip.
pub(crate) fn ask<R: BufRead, W: Write>(
    conflict: &Conflict,
    mut input: R,
    mut output: W,
) -> ConflictChoice {
    loop {
        // Prompt write failures are not fatal; the answer still comes from input.
        let _ = write!(
            output,
            "\n\"{}\" already exists at {}\n  [s]kip, [r]ename, [o]verwrite? ",
            conflict.title,
            conflict.destination.display()
        );
        let _ = output.flush();

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => return ConflictChoice::Skip,
            Ok(_) => {}
        }
        match line.parse::<ConflictChoice>() {
            Ok(choice) => return choice,
            Err(message) => {
                let _ = writeln!(output, "  {message}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn conflict() -> Conflict {
        Conflict {
            temp_path: PathBuf::from("/tmp/qt/Clip.mp4"),
            destination: PathBuf::from("/videos/Clip.mp4"),
            title: "Clip".to_string(),
        }
    }

    #[test]
    fn test_ask_accepts_short_answers() {
        let mut out = Vec::new();
        assert_eq!(
            ask(&conflict(), Cursor::new("r\n"), &mut out),
            ConflictChoice::RenameAndMove
        );
        let prompt = String::from_utf8(out).unwrap_or_default();
        assert!(prompt.contains("\"Clip\" already exists"));
    }

    #[test]
    fn test_ask_repeats_until_valid() {
        let mut out = Vec::new();
        let choice = ask(&conflict(), Cursor::new("maybe\noverwrite\n"), &mut out);
        assert_eq!(choice, ConflictChoice::Replace);
        let prompt = String::from_utf8(out).unwrap_or_default();
        assert!(prompt.contains("invalid conflict choice"));
    }

    #[test]
    fn test_ask_skips_on_eof() {
        let choice = ask(&conflict(), Cursor::new(""), Vec::new());
        assert_eq!(choice, ConflictChoice::Skip);
    }
}
