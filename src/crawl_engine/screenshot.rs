//! Failure screenshots
//!
//! When a screenshot directory is configured, a tab that failed navigation
//! or extraction is captured as a full-page PNG before it is closed.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::browser::BrowserTab;

/// File name for a failure capture: `<rfc3339>_<label>.png`, slashes
/// replaced so URLs can be used as labels.
#[must_use]
pub fn screenshot_file_name(timestamp: &chrono::DateTime<chrono::Utc>, label: &str) -> String {
    let label: String = label
        .chars()
        .map(|c| match c {
            '/' | '\\' => '-',
            c => c,
        })
        .collect();
    format!("{}_{}.png", timestamp.to_rfc3339(), label)
}

/// Capture `tab` into `dir`. Never fails the caller; problems are logged.
pub async fn capture_failure<T>(tab: &T, dir: &Path, label: &str) -> Option<PathBuf>
where
    T: BrowserTab + ?Sized,
{
    let png = match tab.screenshot().await {
        Ok(png) => png,
        Err(e) => {
            warn!("Failed to capture screenshot for {label}: {e}");
            return None;
        }
    };

    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!("Failed to create screenshot dir {}: {e}", dir.display());
        return None;
    }

    let path = dir.join(screenshot_file_name(&chrono::Utc::now(), label));
    match tokio::fs::write(&path, png).await {
        Ok(()) => {
            info!("Failure screenshot saved to {}", path.display());
            Some(path)
        }
        Err(e) => {
            warn!("Failed to write screenshot {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_screenshot_file_name_replaces_slashes() {
        let ts = chrono::Utc
            .with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        assert_eq!(
            screenshot_file_name(&ts, "https://letterboxd.com/film/heat/"),
            "2024-03-01T12:00:00+00:00_https:--letterboxd.com-film-heat-.png"
        );
    }
}
