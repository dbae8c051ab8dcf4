//! Wall statistics library.
//!
//! Fetches a VK wall's posts since a given date through the paginated
//! `wall.get` endpoint, buckets them into yearly, monthly, daily or hourly
//! statistics, and exports selected post fields to CSV.

pub mod aggregator;
pub mod api;
pub mod cache;
pub mod config;
pub mod constants;
pub mod export;
pub mod fetcher;
pub mod links;
pub mod models;
pub mod period;
pub mod wall;

pub use aggregator::{aggregate, statistic_for_period};
pub use cache::WallCache;
pub use export::Field;
pub use fetcher::{Fetcher, PostSource};
pub use links::get_links;
pub use models::{Post, Statistic};
pub use period::{change_period, Granularity, Period};
pub use wall::Wall;
