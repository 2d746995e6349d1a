//! Analytics report generation.
//!
//! This module renders the bucketed analytics as a terminal table,
//! a Markdown document or JSON.

use crate::analytics::{Bucket, Granularity, Summary};
use crate::report::table::{format_table, money, Cell, Palette};
use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Context of one analytics run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub api_url: String,
    pub generated_at: DateTime<Utc>,
    pub granularity: Granularity,
    /// Reference instant the buckets were computed against.
    pub as_of: NaiveDateTime,
    pub sales_count: usize,
    pub purchases_count: usize,
    pub expenses_count: usize,
    /// Entries left out because their date was missing or malformed.
    pub skipped_entries: usize,
}

/// Complete analytics report.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub metadata: ReportMetadata,
    pub summary: Summary,
    pub buckets: Vec<Bucket>,
}

impl AnalyticsReport {
    pub fn new(metadata: ReportMetadata, buckets: Vec<Bucket>) -> Self {
        let summary = Summary::from_buckets(&buckets);
        Self {
            metadata,
            summary,
            buckets,
        }
    }
}

const BUCKET_HEADERS: [&str; 5] = ["Period", "Sales", "Purchases", "Expenses", "Profit"];

fn margin(summary: &Summary) -> String {
    match summary.margin_percent {
        Some(m) => format!("{}%", m),
        None => "n/a".to_string(),
    }
}

/// Generate the terminal table report.
pub fn generate_table_report(report: &AnalyticsReport, palette: &Palette) -> String {
    let mut output = String::new();
    let summary = &report.summary;

    output.push_str(&format!(
        "Analytics ({}) as of {}\n\n",
        report.metadata.granularity,
        report.metadata.as_of.format("%Y-%m-%d")
    ));

    let rows: Vec<Vec<Cell>> = report
        .buckets
        .iter()
        .map(|b| {
            vec![
                Cell::plain(b.label.clone()),
                Cell::plain(money(b.sales_total)),
                Cell::plain(money(b.purchases_total)),
                Cell::plain(money(b.expenses_total)),
                Cell::signed(b.profit),
            ]
        })
        .collect();
    output.push_str(&format_table(&BUCKET_HEADERS, &rows, palette));
    output.push('\n');

    let totals = vec![vec![
        Cell::plain("Total"),
        Cell::plain(money(summary.sales_total)),
        Cell::plain(money(summary.purchases_total)),
        Cell::plain(money(summary.expenses_total)),
        Cell::signed(summary.profit),
    ]];
    output.push_str(&format_table(&BUCKET_HEADERS, &totals, palette));
    output.push('\n');

    output.push_str(&format!("Margin:      {}\n", margin(summary)));
    if let Some(ref best) = summary.best_period {
        output.push_str(&format!("Best period: {}\n", best));
    }
    if report.metadata.skipped_entries > 0 {
        output.push_str(&format!(
            "Skipped:     {} entries without a usable date\n",
            report.metadata.skipped_entries
        ));
    }

    output
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AnalyticsReport) -> String {
    let mut output = String::new();

    output.push_str("# Stocktally Analytics\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_periods_section(
        report.metadata.granularity,
        &report.buckets,
    ));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Backend:** {}\n", metadata.api_url));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Granularity:** {}\n", metadata.granularity));
    section.push_str(&format!(
        "- **As of:** {}\n",
        metadata.as_of.format("%Y-%m-%d %H:%M:%S")
    ));
    section.push_str(&format!(
        "- **Records:** {} sales, {} purchases, {} expenses\n",
        metadata.sales_count, metadata.purchases_count, metadata.expenses_count
    ));
    if metadata.skipped_entries > 0 {
        section.push_str(&format!(
            "- **Skipped (no usable date):** {}\n",
            metadata.skipped_entries
        ));
    }
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(summary: &Summary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Sales | Purchases | Expenses | **Profit** | Margin |\n");
    section.push_str("|---:|---:|---:|---:|---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | **{}** | {} |\n\n",
        money(summary.sales_total),
        money(summary.purchases_total),
        money(summary.expenses_total),
        money(summary.profit),
        margin(summary)
    ));

    if let Some(ref best) = summary.best_period {
        section.push_str(&format!("Most profitable period: **{}**\n\n", best));
    }

    section
}

/// Generate the per-period table.
fn generate_periods_section(granularity: Granularity, buckets: &[Bucket]) -> String {
    let mut section = String::new();

    section.push_str(&format!("## By Period ({})\n\n", granularity));
    section.push_str("| Period | Sales | Purchases | Expenses | Profit |\n");
    section.push_str("|:---|---:|---:|---:|---:|\n");

    for bucket in buckets {
        let marker = if bucket.profit < Decimal::ZERO { " 🔻" } else { "" };
        section.push_str(&format!(
            "| {} | {} | {} | {} | {}{} |\n",
            bucket.label,
            money(bucket.sales_total),
            money(bucket.purchases_total),
            money(bucket.expenses_total),
            money(bucket.profit),
            marker
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    format!(
        "---\n\n*Report generated by stocktally {}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AnalyticsReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
