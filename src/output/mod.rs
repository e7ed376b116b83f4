//! Output module for crawl reports
//!
//! This module handles:
//! - Assembling the final report from the scored graph
//! - Generating markdown summaries
//! - Printing a console summary

mod markdown;
mod report;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use report::{CrawlReport, EdgeReport, NodeReport, RankSummary, ReportSummary};
pub use stats::print_summary;
