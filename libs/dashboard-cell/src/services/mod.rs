pub mod aggregator;

pub use aggregator::{StatsAggregator, DEFAULT_RECENT_LIMIT};
