//! End-of-run artifacts written to the output root
//!
//! - `failed_urls.txt`: failed URLs, sorted, one per line; read back by
//!   `--retry-failed` on the next run
//! - `crawl_report.json`: the full [`CrawlSummary`] as JSON
//! - `crawl_summary.md`: the same summary rendered as markdown

use crate::output::ledger::FailedUrl;
use crate::output::markdown::format_markdown_summary;
use crate::output::StatsSnapshot;
use crate::state::CrawlPhase;
use crate::GrabError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const FAILED_URLS_FILE: &str = "failed_urls.txt";
pub const REPORT_FILE: &str = "crawl_report.json";
pub const SUMMARY_FILE: &str = "crawl_summary.md";

/// Final result of a crawl
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub seed: String,
    pub output_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub phase: CrawlPhase,
    /// True if the crawl stopped through cancellation rather than draining
    pub cancelled: bool,
    /// Size of the visited set: every URL admitted, including those beyond depth
    pub urls_admitted: usize,
    pub stats: StatsSnapshot,
    pub failures: Vec<FailedUrl>,
    pub out_of_scope: Vec<String>,
}

/// Writes the failed-URL ledger, or removes a stale one when nothing failed
///
/// Returns the path of the file when one was written.
pub fn write_failed_urls(root: &Path, urls: &[String]) -> Result<Option<PathBuf>, GrabError> {
    let path = root.join(FAILED_URLS_FILE);

    if urls.is_empty() {
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::debug!("Removed stale {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(GrabError::Report { path, source }),
        }
        return Ok(None);
    }

    let mut sorted = urls.to_vec();
    sorted.sort();
    sorted.dedup();

    let mut content = sorted.join("\n");
    content.push('\n');

    write_file(&path, content.as_bytes())?;
    Ok(Some(path))
}

/// Loads the failed-URL ledger of a previous run
///
/// A missing file means there is nothing to retry. Blank lines and lines
/// starting with `#` are ignored.
pub fn load_failed_urls(root: &Path) -> Result<Vec<String>, GrabError> {
    let path = root.join(FAILED_URLS_FILE);

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(GrabError::Report { path, source }),
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Writes `crawl_report.json` and `crawl_summary.md`
pub fn write_report(root: &Path, summary: &CrawlSummary) -> Result<Vec<PathBuf>, GrabError> {
    let json_path = root.join(REPORT_FILE);
    let json = serde_json::to_vec_pretty(summary)?;
    write_file(&json_path, &json)?;

    let md_path = root.join(SUMMARY_FILE);
    write_file(&md_path, format_markdown_summary(summary).as_bytes())?;

    Ok(vec![json_path, md_path])
}

fn write_file(path: &Path, content: &[u8]) -> Result<(), GrabError> {
    std::fs::write(path, content).map_err(|source| GrabError::Report {
        path: path.to_path_buf(),
        source,
    })
}
