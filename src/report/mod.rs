//! Report rendering for analytics and listings.

pub mod generator;
pub mod table;

pub use generator::{
    generate_json_report, generate_markdown_report, generate_table_report, AnalyticsReport,
    ReportMetadata,
};
pub use table::{render_listing_json, render_table, Palette, TableRow};
