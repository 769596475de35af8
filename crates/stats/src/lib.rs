//! Profile statistics for buyers and sellers.
//!
//! Statistics are computed on demand from the order store rather than
//! maintained incrementally; profile pages are read rarely enough that
//! a scan per request is the simpler trade.

pub mod error;
pub mod model;
pub mod service;

pub use error::{Result, StatsError};
pub use model::{BuyerStats, ProductStat, SellerStats};
pub use service::ProfileStatsService;
