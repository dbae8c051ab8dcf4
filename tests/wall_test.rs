//! Integration tests for walls, their statistics and the wall cache.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use wall_stats::api::PostId;
use wall_stats::wall::parse_cutoff;
use wall_stats::{Field, Granularity, Post, PostSource, Wall, WallCache};

/// Serves a fixed set of posts and records every call.
struct StubSource {
    posts: Vec<Post>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(i64, i64)>>,
}

impl StubSource {
    fn new(posts: Vec<Post>) -> Self {
        Self {
            posts,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PostSource for StubSource {
    async fn fetch_posts(&self, owner_id: i64, cutoff: i64) -> Vec<Post> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((owner_id, cutoff));
        self.posts
            .iter()
            .filter(|post| post.date >= cutoff)
            .cloned()
            .collect()
    }
}

fn post(id: i64, date: i64, likes: u64) -> Post {
    Post {
        id: PostId::Int(id),
        date,
        text: format!("post {id}"),
        attachment_count: 0,
        links: Vec::new(),
        likes,
        comments: 1,
        reposts: 0,
    }
}

/// Posts spread over the last few days, deliberately out of order.
fn recent_posts() -> Vec<Post> {
    let now = Utc::now().timestamp();
    vec![
        post(1, now - 5 * 86_400, 10),
        post(2, now - 60, 4),
        post(3, now - 3 * 3_600, 6),
        post(4, now - 2 * 86_400, 0),
        post(5, now - 120, 2),
    ]
}

#[tokio::test]
async fn test_posts_are_fetched_once_and_sorted() {
    let source = StubSource::new(recent_posts());
    let mut wall = Wall::new(42, None, false);

    let ids: Vec<String> = wall
        .posts(&source)
        .await
        .iter()
        .map(|p| p.id.to_string())
        .collect();
    assert_eq!(ids, ["2", "5", "3", "4", "1"]);

    wall.posts(&source).await;
    wall.statistics(&source, Granularity::Day).await;
    wall.write_csv(&source, &[Field::Id], Vec::new())
        .await
        .unwrap();

    assert_eq!(source.calls(), 1);
    assert_eq!(*source.requests.lock().unwrap(), [(42, 0)]);
}

#[tokio::test]
async fn test_group_wall_requests_negative_owner_and_cutoff() {
    let source = StubSource::new(Vec::new());
    let mut wall = Wall::new(42, Some("01.01.2021".to_string()), true);

    assert!(wall.posts(&source).await.is_empty());

    let expected_cutoff = parse_cutoff(Some("01.01.2021"));
    assert!(expected_cutoff > 0);
    assert_eq!(*source.requests.lock().unwrap(), [(-42, expected_cutoff)]);
}

#[tokio::test]
async fn test_statistics_account_for_every_post() {
    let source = StubSource::new(recent_posts());
    let mut wall = Wall::new(1, None, false);

    for granularity in [
        Granularity::Year,
        Granularity::Month,
        Granularity::Day,
        Granularity::Hour,
    ] {
        let statistics = wall.statistics(&source, granularity).await;
        assert!(!statistics.is_empty());

        let total: usize = statistics.iter().map(|s| s.post_count).sum();
        assert_eq!(total, 5, "{granularity}");

        let likes: f64 = statistics
            .iter()
            .map(|s| s.average_likes * s.post_count as f64)
            .sum();
        assert!((likes - 22.0).abs() < 0.05, "{granularity}: {likes}");
    }

    // five days back at one bucket per day, plus the current one
    let daily = wall.statistics(&source, Granularity::Day).await;
    assert!((5..=7).contains(&daily.len()), "{}", daily.len());
    assert!(daily.iter().any(|s| s.post_count == 0));
}

#[tokio::test]
async fn test_empty_wall_has_no_statistics() {
    let source = StubSource::new(Vec::new());
    let mut wall = Wall::new(1, None, false);

    assert!(wall.statistics(&source, Granularity::Month).await.is_empty());
}

#[tokio::test]
async fn test_csv_export_to_file() {
    let source = StubSource::new(vec![post(7, 200, 3), post(8, 300, 5)]);
    let mut wall = Wall::new(1, None, false);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("posts.csv");
    let file = std::fs::File::create(&path).unwrap();
    wall.write_csv(&source, &[Field::Id, Field::Text, Field::Likes], file)
        .await
        .unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "id,text,likes\n8,post 8,5\n7,post 7,3\n");
}

#[tokio::test]
async fn test_cached_wall_reuses_fetched_posts() {
    let source = StubSource::new(recent_posts());
    let cache = WallCache::default();

    {
        let wall = cache.get(9, None, true);
        let mut wall = wall.lock().await;
        assert_eq!(wall.posts(&source).await.len(), 5);
    }
    {
        let wall = cache.get(9, None, true);
        let mut wall = wall.lock().await;
        assert_eq!(wall.owner_id(), -9);
        assert_eq!(wall.cached_posts().map(<[Post]>::len), Some(5));
        wall.statistics(&source, Granularity::Year).await;
    }

    assert_eq!(source.calls(), 1);

    cache.clear();
    let wall = cache.get(9, None, true);
    wall.lock().await.posts(&source).await;
    assert_eq!(source.calls(), 2);
}
