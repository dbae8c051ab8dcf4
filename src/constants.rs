//! Shared constants used across the application.

/// Number of posts requested per `wall.get` page. The API caps it at 100.
pub const PAGE_SIZE: u64 = 100;

/// User agent string sent with API requests.
pub const USER_AGENT: &str = concat!("wall-stats/", env!("CARGO_PKG_VERSION"));
