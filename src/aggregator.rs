//! Backward sweep of date-sorted posts into per-period statistics.

use std::fmt;

use chrono::{DateTime, TimeZone};
use tracing::debug;

use crate::models::{Post, Statistic};
use crate::period::{Granularity, Period};

/// Summarize the leading run of `posts` published at or after `start`.
///
/// `posts` must be sorted newest first; the scan stops at the first post
/// older than `start`.
#[must_use]
pub fn statistic_for_period(posts: &[Post], period: &str, start: i64) -> Statistic {
    let (mut count, mut likes, mut comments, mut reposts) = (0usize, 0u64, 0u64, 0u64);
    for post in posts.iter().take_while(|post| post.date >= start) {
        count += 1;
        likes += post.likes;
        comments += post.comments;
        reposts += post.reposts;
    }
    Statistic::from_totals(period, count, likes, comments, reposts)
}

/// Bucket newest-first `posts` into consecutive periods ending at `now`.
///
/// Periods are emitted latest first and cover every post exactly once; the
/// last one holds the oldest post. Periods with no posts between busy ones
/// are emitted with a zero count.
#[must_use]
pub fn aggregate<Tz>(posts: &[Post], granularity: Granularity, now: &DateTime<Tz>) -> Vec<Statistic>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let tz = now.timezone();
    let mut period = Period::current(granularity, now);
    let mut offset = 0;
    let mut statistics = Vec::new();

    while offset < posts.len() {
        let statistic = statistic_for_period(&posts[offset..], period.label(), period.start());
        offset += statistic.post_count;
        statistics.push(statistic);
        period = period.previous(&tz);
    }

    debug!(
        granularity = %granularity,
        posts = posts.len(),
        periods = statistics.len(),
        "Aggregated posts"
    );

    statistics
}
