use std::io::Write;

use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveTime, TimeZone};
use tracing::debug;

use crate::aggregator::aggregate;
use crate::export::{write_csv, Field};
use crate::fetcher::PostSource;
use crate::models::{sort_newest_first, Post, Statistic};
use crate::period::{local_timestamp, Granularity};

const CUTOFF_FORMAT: &str = "%d.%m.%Y";

/// Timestamp of local midnight on a `DD.MM.YYYY` date, or 0 when the date is
/// absent or cannot be parsed.
#[must_use]
pub fn parse_cutoff(date: Option<&str>) -> i64 {
    parse_cutoff_in(date, &Local)
}

/// [`parse_cutoff`] in an explicit time zone.
pub fn parse_cutoff_in<Tz: TimeZone>(date: Option<&str>, tz: &Tz) -> i64 {
    date.and_then(|date| NaiveDate::parse_from_str(date.trim(), CUTOFF_FORMAT).ok())
        .map_or(0, |day| local_timestamp(tz, day.and_time(NaiveTime::MIN)))
}

/// A user's or group's wall and its lazily fetched posts.
#[derive(Debug, Clone)]
pub struct Wall {
    owner_id: i64,
    cutoff_date: Option<String>,
    posts: Option<Vec<Post>>,
}

impl Wall {
    /// Create a wall for a non-negative numeric `id`. Group walls are
    /// addressed by the negated id.
    #[must_use]
    pub fn new(id: i64, cutoff_date: Option<String>, group: bool) -> Self {
        Self {
            owner_id: if group { -id } else { id },
            cutoff_date,
            posts: None,
        }
    }

    #[must_use]
    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    #[must_use]
    pub fn cutoff_date(&self) -> Option<&str> {
        self.cutoff_date.as_deref()
    }

    /// Earliest publication time of interest, Unix seconds.
    #[must_use]
    pub fn cutoff(&self) -> i64 {
        parse_cutoff(self.cutoff_date())
    }

    /// Posts already loaded, if any.
    #[must_use]
    pub fn cached_posts(&self) -> Option<&[Post]> {
        self.posts.as_deref()
    }

    /// Install posts without fetching. They are sorted newest first.
    pub fn preload(&mut self, mut posts: Vec<Post>) {
        sort_newest_first(&mut posts);
        self.posts = Some(posts);
    }

    /// The wall's posts, newest first. The first call fetches them from
    /// `source`; later calls return the stored collection.
    pub async fn posts(&mut self, source: &dyn PostSource) -> &[Post] {
        if self.posts.is_none() {
            let cutoff = self.cutoff();
            debug!(owner_id = self.owner_id, cutoff, "Loading wall posts");
            let mut posts = source.fetch_posts(self.owner_id, cutoff).await;
            sort_newest_first(&mut posts);
            self.posts = Some(posts);
        }
        self.posts.as_deref().unwrap_or_default()
    }

    /// Per-period statistics, latest period first, counted back from now.
    pub async fn statistics(
        &mut self,
        source: &dyn PostSource,
        granularity: Granularity,
    ) -> Vec<Statistic> {
        let now = Local::now();
        aggregate(self.posts(source).await, granularity, &now)
    }

    /// Write the chosen fields of every post as CSV.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `writer` fails.
    pub async fn write_csv<W: Write + Send>(
        &mut self,
        source: &dyn PostSource,
        fields: &[Field],
        writer: W,
    ) -> Result<()> {
        write_csv(self.posts(source).await, fields, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_init_wall_for_user() {
        let wall = Wall::new(1234, None, false);
        assert_eq!(wall.owner_id(), 1234);
        assert_eq!(wall.cutoff_date(), None);
        assert_eq!(wall.cutoff(), 0);
        assert!(wall.cached_posts().is_none());
    }

    #[test]
    fn test_init_wall_for_group() {
        let wall = Wall::new(1234, Some("1".to_string()), true);
        assert_eq!(wall.owner_id(), -1234);
        assert_eq!(wall.cutoff_date(), Some("1"));
    }

    #[test]
    fn test_parse_cutoff() {
        assert_eq!(parse_cutoff_in(Some("01.01.2021"), &Utc), 1_609_459_200);
        assert_eq!(parse_cutoff_in(Some(" 12.12.2012 "), &Utc), 1_355_270_400);
    }

    #[test]
    fn test_parse_cutoff_uses_local_midnight() {
        let cutoff = parse_cutoff(Some("12.12.2012"));
        let expected = Local
            .with_ymd_and_hms(2012, 12, 12, 0, 0, 0)
            .earliest()
            .unwrap()
            .timestamp();
        assert_eq!(cutoff, expected);
    }

    #[test]
    fn test_wrong_cutoff_is_zero() {
        assert_eq!(parse_cutoff(Some("abc")), 0);
        assert_eq!(parse_cutoff(Some("12.1")), 0);
        assert_eq!(parse_cutoff(Some("31.02.2021")), 0);
        assert_eq!(parse_cutoff(Some("")), 0);
        assert_eq!(parse_cutoff(None), 0);
    }
}
