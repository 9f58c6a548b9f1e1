//! Campaign reporting: chart datasets, rule-based insights, the built-in
//! analysis, dashboard snapshots and PDF export.

pub mod charts;
pub mod dashboard;
pub mod insights;
pub mod pdf;
pub mod summary;

pub use charts::{ChartData, ChartKind};
pub use dashboard::{ChartPanel, DashboardSnapshot};
pub use insights::insights_for;
pub use pdf::{render_pdf, ReportContent, ReportScope};
pub use summary::{built_in_analysis, Analysis, AnalysisSource};
