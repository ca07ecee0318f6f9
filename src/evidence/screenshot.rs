//! Screenshot capture and housekeeping.
//!
//! Artifacts are PNG files named `<PREFIX>_<name>_<yyyy-MM-dd_HH-mm-ss>.png`
//! in the configured directory, which is created on demand. Old
//! artifacts are deleted by a best-effort cleanup pass at startup.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use thirtyfour::WebDriver;
use tracing::info;

use super::EvidenceError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Outcome prefix baked into the artifact file name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Prefix {
    Passed,
    Failed,
    Skipped,
    Step,
}

impl Prefix {
    pub fn label(&self) -> &'static str {
        match self {
            Prefix::Passed => "PASSED",
            Prefix::Failed => "FAILED",
            Prefix::Skipped => "SKIPPED",
            Prefix::Step => "STEP",
        }
    }
}

/// Build the artifact file name for a capture taken at `at`.
pub fn file_name(prefix: Prefix, name: &str, at: DateTime<Local>) -> String {
    format!(
        "{}_{}_{}.png",
        prefix.label(),
        sanitize(name),
        at.format(TIMESTAMP_FORMAT)
    )
}

/// Capture the full page from `driver` into `dir`.
pub async fn capture(
    driver: &WebDriver,
    dir: &Path,
    prefix: Prefix,
    name: &str,
) -> Result<PathBuf, EvidenceError> {
    let png = driver.screenshot_as_png().await?;

    std::fs::create_dir_all(dir).map_err(|source| EvidenceError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(file_name(prefix, name, Local::now()));
    std::fs::write(&path, png).map_err(|source| EvidenceError::Io {
        path: path.clone(),
        source,
    })?;

    info!("screenshot captured: {}", path.display());
    Ok(path)
}

/// Delete artifacts in `dir` older than `days`. Best-effort: unreadable
/// entries are skipped, a missing directory deletes nothing. Returns
/// the number of files removed.
pub fn cleanup_older_than(dir: &Path, days: u64) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    let cutoff = SystemTime::now() - Duration::from_secs(days * 24 * 60 * 60);

    let mut deleted = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        if modified < cutoff && std::fs::remove_file(&path).is_ok() {
            deleted += 1;
        }
    }

    info!("deleted {deleted} screenshots older than {days} days");
    deleted
}

/// Keep file names portable: anything outside `[A-Za-z0-9_-]` becomes
/// an underscore.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn file_names_carry_prefix_name_and_timestamp() {
        let at = Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(
            file_name(Prefix::Failed, "login_standard_user", at),
            "FAILED_login_standard_user_2026-03-14_09-26-53.png"
        );
        assert_eq!(
            file_name(Prefix::Step, "add to cart: backpack", at),
            "STEP_add_to_cart__backpack_2026-03-14_09-26-53.png"
        );
    }

    #[test]
    fn cleanup_ignores_missing_directory() {
        assert_eq!(cleanup_older_than(Path::new("/no/such/dir"), 7), 0);
    }

    #[test]
    fn cleanup_deletes_files_older_than_the_cutoff() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("FAILED_old_2020-01-01_00-00-00.png");
        std::fs::write(&stale, b"png").unwrap();

        // A zero-day threshold makes everything already on disk stale.
        std::thread::sleep(Duration::from_millis(20));
        let deleted = cleanup_older_than(dir.path(), 0);

        assert_eq!(deleted, 1);
        assert!(!stale.exists());
    }

    #[test]
    fn cleanup_keeps_fresh_files() {
        let dir = tempfile::tempdir().unwrap();
        let fresh = dir.path().join("PASSED_new_2026-01-01_00-00-00.png");
        std::fs::write(&fresh, b"png").unwrap();

        let deleted = cleanup_older_than(dir.path(), 7);

        assert_eq!(deleted, 0);
        assert!(fresh.exists());
    }
}
