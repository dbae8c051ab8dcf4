use serde::Serialize;

use crate::api::{PostId, RawPost};
use crate::links::extract_links;

/// A wall post, normalized from the API payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: PostId,
    /// Publication time, Unix seconds.
    pub date: i64,
    pub text: String,
    pub attachment_count: usize,
    /// One entry per attachment; `None` when no URL was found in it.
    pub links: Vec<Option<String>>,
    pub likes: u64,
    pub comments: u64,
    pub reposts: u64,
}

impl From<RawPost> for Post {
    fn from(raw: RawPost) -> Self {
        let attachments = raw.attachments.unwrap_or_default();
        Self {
            id: raw.id,
            date: raw.date,
            text: raw.text,
            attachment_count: attachments.len(),
            links: extract_links(&attachments),
            likes: raw.likes.unwrap_or_default().count,
            comments: raw.comments.count,
            reposts: raw.reposts.unwrap_or_default().count,
        }
    }
}

/// Sort posts by date, newest first. Posts sharing a date keep their order.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Post count and average engagement for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistic {
    pub period: String,
    pub post_count: usize,
    pub average_likes: f64,
    pub average_comments: f64,
    pub average_reposts: f64,
}

impl Statistic {
    /// Build a statistic from summed counters. All averages are zero when
    /// `post_count` is zero.
    #[must_use]
    pub fn from_totals(
        period: impl Into<String>,
        post_count: usize,
        likes: u64,
        comments: u64,
        reposts: u64,
    ) -> Self {
        let average = |total: u64| {
            if post_count == 0 {
                0.0
            } else {
                round2(total as f64 / post_count as f64)
            }
        };
        Self {
            period: period.into(),
            post_count,
            average_likes: average(likes),
            average_comments: average(comments),
            average_reposts: average(reposts),
        }
    }
}

/// Round to two decimals, halves to the even digit.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
