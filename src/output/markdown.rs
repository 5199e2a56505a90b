//! Markdown summary generation
//!
//! Renders a [`CrawlSummary`] as the human-readable `crawl_summary.md`
//! written next to the mirrored files.

use crate::output::CrawlSummary;
use crate::url::ResourceKind;

/// Maximum number of URLs listed per section
const MAX_LISTED_URLS: usize = 50;

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let stats = &summary.stats;
    let mut md = String::new();

    md.push_str("# Web Grabber Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", summary.seed));
    md.push_str(&format!(
        "- **Output Directory**: {}\n",
        summary.output_dir.display()
    ));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Finished**: {}\n",
        summary.finished_at.to_rfc3339()
    ));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n",
        summary.duration_seconds
    ));
    let status = if summary.cancelled {
        "cancelled"
    } else {
        "completed"
    };
    md.push_str(&format!("- **Status**: {}\n\n", status));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **URLs Admitted**: {}\n", summary.urls_admitted));
    md.push_str(&format!("- **Fetched**: {}\n", stats.fetched));
    md.push_str(&format!("- **Saved**: {}\n", stats.total_saved()));
    md.push_str(&format!("- **Retries**: {}\n", stats.retries));
    md.push_str(&format!(
        "- **Failures**: {} fetch, {} write\n\n",
        stats.fetch_failures, stats.write_failures
    ));

    // Saved resources by kind
    md.push_str("## Saved Resources\n\n");
    md.push_str("| Kind | Count |\n");
    md.push_str("|------|-------|\n");
    for kind in ResourceKind::ALL {
        md.push_str(&format!("| {} | {} |\n", kind, stats.saved(kind)));
    }
    md.push('\n');

    // Skips
    md.push_str("## Skipped URLs\n\n");
    md.push_str("| Reason | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Out of scope | {} |\n", stats.out_of_scope));
    md.push_str(&format!("| Beyond max depth | {} |\n", stats.depth_exceeded));
    md.push_str(&format!("| Invalid URL | {} |\n\n", stats.invalid_urls));

    if !summary.failures.is_empty() {
        md.push_str("## Failed URLs\n\n");
        md.push_str("| URL | Reason |\n");
        md.push_str("|-----|--------|\n");
        for failure in summary.failures.iter().take(MAX_LISTED_URLS) {
            md.push_str(&format!("| {} | {} |\n", failure.url, failure.reason));
        }
        push_overflow(&mut md, summary.failures.len());
    }

    if !summary.out_of_scope.is_empty() {
        md.push_str("## Out-of-Scope URLs\n\n");
        for url in summary.out_of_scope.iter().take(MAX_LISTED_URLS) {
            md.push_str(&format!("- {}\n", url));
        }
        push_overflow(&mut md, summary.out_of_scope.len());
    }

    md
}

fn push_overflow(md: &mut String, total: usize) {
    if total > MAX_LISTED_URLS {
        md.push_str(&format!("\n... and {} more\n\n", total - MAX_LISTED_URLS));
    } else {
        md.push('\n');
    }
}
