//! Console summary of a finished crawl

use crate::issues::IssueKind;
use crate::output::report::CrawlReport;

/// Prints the report to stdout in a compact form
pub fn print_summary(report: &CrawlReport, top: usize) {
    let summary = &report.summary;

    println!("=== {} ===\n", report.domain);

    println!("Overview:");
    println!("  Pages crawled: {}", summary.pages);
    println!("  Internal links: {}", summary.links);
    println!("  Average links per page: {:.2}", summary.avg_links);
    println!("  External links: {}", summary.external_links);
    println!("  Failed pages: {}", summary.failed_pages);
    if !report.pagerank.converged {
        println!(
            "  PageRank did not converge after {} iterations",
            report.pagerank.iterations
        );
    }
    println!();

    println!("Top Pages:");
    for node in report.nodes.iter().take(top) {
        println!("  {:>3}. {:.4}  {}", node.rank, node.score, node.path);
    }
    println!();

    println!("Issues:");
    for (kind, count) in [
        (IssueKind::Orphan, summary.orphan_count),
        (IssueKind::DeadEnd, summary.dead_end_count),
        (IssueKind::LowAuthority, summary.low_authority_count),
    ] {
        println!("  {}: {}", kind, count);
    }
}
