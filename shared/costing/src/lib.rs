//! # Dealsight Costing
//! 
//! Classification and cost estimation over extracted inventory records.
//! Every function here is pure: breakdowns and summaries are derived views
//! recomputed on demand from records and configuration.
//! 
//! - **classification**: complexity tier, deployment type, record multipliers
//! - **calculator**: per-record `CostBreakdown` for a deal context
//! - **aggregator**: `PortfolioCostSummary` totals, ranking, tier groups

pub mod aggregator;
pub mod calculator;
pub mod classification;

pub use aggregator::CostAggregator;
pub use calculator::CostCalculator;
pub use classification::{Classification, ClassificationEngine};
