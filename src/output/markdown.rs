//! Markdown summary generation
//!
//! Renders a finished crawl report as a human-readable document: overall
//! statistics, the highest ranked pages, and one section per issue kind.

use crate::issues::IssueKind;
use crate::output::report::{CrawlReport, NodeReport};
use crate::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Number of pages shown in the ranking table
const TOP_PAGES: usize = 25;

/// Maximum entries listed per issue section
const ISSUE_LIST_LIMIT: usize = 50;

/// Writes a markdown summary of the report to `output_path`
pub fn generate_markdown_summary(report: &CrawlReport, output_path: &Path) -> Result<()> {
    let markdown = format_markdown_summary(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats the report as markdown
pub fn format_markdown_summary(report: &CrawlReport) -> String {
    let mut md = String::new();
    let summary = &report.summary;

    md.push_str(&format!("# Link Authority Report: {}\n\n", report.domain));

    md.push_str("## Overview\n\n");
    md.push_str(&format!("- **Seed**: {}\n", report.seed));
    md.push_str(&format!("- **Pages**: {}\n", summary.pages));
    md.push_str(&format!("- **Internal Links**: {}\n", summary.links));
    md.push_str(&format!(
        "- **Average Links per Page**: {:.2}\n",
        summary.avg_links
    ));
    md.push_str(&format!("- **External Links**: {}\n", summary.external_links));
    md.push_str(&format!("- **Failed Pages**: {}\n", summary.failed_pages));
    md.push_str(&format!(
        "- **PageRank**: alpha {:.2}, {} iterations{}\n\n",
        report.pagerank.alpha,
        report.pagerank.iterations,
        if report.pagerank.converged {
            ""
        } else {
            " (not converged)"
        }
    ));

    md.push_str("## Issues\n\n");
    md.push_str("| Issue | Pages |\n");
    md.push_str("|-------|-------|\n");
    md.push_str(&format!("| Orphan | {} |\n", summary.orphan_count));
    md.push_str(&format!("| Dead End | {} |\n", summary.dead_end_count));
    md.push_str(&format!(
        "| Low Authority | {} |\n\n",
        summary.low_authority_count
    ));

    md.push_str("## Top Pages\n\n");
    md.push_str("| Rank | Page | Score | In | Out |\n");
    md.push_str("|------|------|-------|----|-----|\n");
    for node in report.nodes.iter().take(TOP_PAGES) {
        md.push_str(&format!(
            "| {} | {} | {:.4} | {} | {} |\n",
            node.rank,
            page_label(node),
            node.score,
            node.links_in,
            node.links_out
        ));
    }
    md.push('\n');

    for (kind, heading) in [
        (IssueKind::Orphan, "Orphan Pages"),
        (IssueKind::DeadEnd, "Dead Ends"),
        (IssueKind::LowAuthority, "Low Authority Pages"),
    ] {
        let pages: Vec<&NodeReport> = report.pages_with(kind).collect();
        if pages.is_empty() {
            continue;
        }

        md.push_str(&format!("## {}\n\n", heading));
        if kind == IssueKind::LowAuthority {
            md.push_str(&format!(
                "Score below {:.4}.\n\n",
                summary.low_authority_threshold
            ));
        }
        for node in pages.iter().take(ISSUE_LIST_LIMIT) {
            match node.http_status {
                Some(code) if code >= 400 => {
                    md.push_str(&format!("- {} (HTTP {})\n", node.path, code))
                }
                _ => md.push_str(&format!("- {}\n", node.path)),
            }
        }
        if pages.len() > ISSUE_LIST_LIMIT {
            md.push_str(&format!(
                "- ... and {} more\n",
                pages.len() - ISSUE_LIST_LIMIT
            ));
        }
        md.push('\n');
    }

    md.push_str("---\n\n");
    md.push_str(&format!(
        "*Generated by Sumi-Rank at {}*\n",
        chrono::Utc::now().to_rfc3339()
    ));

    md
}

fn page_label(node: &NodeReport) -> String {
    match &node.title {
        Some(title) => format!("{} ({})", escape_cell(title), node.path),
        None => node.path.clone(),
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::report::{RankSummary, ReportSummary};
    use crate::state::FetchStatus;
    use tempfile::TempDir;

    fn node(rank: usize, path: &str, issues: Vec<IssueKind>) -> NodeReport {
        NodeReport {
            rank,
            url: format!("https://example.com{}", path),
            path: path.to_string(),
            title: Some(format!("Title | {}", path)),
            status: FetchStatus::Fetched,
            http_status: Some(200),
            score: 0.5 / rank as f64,
            links_in: 1,
            links_out: 1,
            issues,
        }
    }

    fn sample_report() -> CrawlReport {
        CrawlReport {
            seed: "https://example.com/".to_string(),
            domain: "example.com".to_string(),
            nodes: vec![
                node(1, "/", vec![]),
                node(2, "/about", vec![IssueKind::DeadEnd]),
                node(3, "/lost", vec![IssueKind::Orphan, IssueKind::LowAuthority]),
            ],
            edges: vec![],
            summary: ReportSummary {
                pages: 3,
                links: 2,
                avg_links: 0.67,
                orphan_count: 1,
                dead_end_count: 1,
                low_authority_count: 1,
                low_authority_threshold: 0.1667,
                ..Default::default()
            },
            pagerank: RankSummary {
                alpha: 0.85,
                iterations: 12,
                converged: true,
            },
        }
    }

    #[test]
    fn test_format_markdown_summary() {
        let md = format_markdown_summary(&sample_report());

        assert!(md.contains("# Link Authority Report: example.com"));
        assert!(md.contains("- **Pages**: 3"));
        assert!(md.contains("| Orphan | 1 |"));
        assert!(md.contains("## Dead Ends\n\n- /about"));
        assert!(md.contains("## Orphan Pages\n\n- /lost"));
        assert!(md.contains("Score below 0.1667"));
        assert!(md.contains("Title \\| /about"));
        assert!(!md.contains("not converged"));
    }

    #[test]
    fn test_generate_markdown_summary() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("summary.md");

        generate_markdown_summary(&sample_report(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Link Authority Report"));
    }
}
