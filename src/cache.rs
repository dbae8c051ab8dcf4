//! Time-windowed cache of walls.
//!
//! Walls are keyed by owner id and cutoff date so repeated requests for the
//! same wall reuse its fetched posts. The whole cache is dropped once its
//! window expires, after which walls are fetched again on next use.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::Config;
use crate::wall::Wall;

/// A wall shared between callers of the cache.
pub type SharedWall = Arc<tokio::sync::Mutex<Wall>>;

type Key = (i64, Option<String>);

struct Entry {
    wall: SharedWall,
    last_used: Instant,
}

struct State {
    entries: HashMap<Key, Entry>,
    expires_at: Instant,
}

/// Bounded wall cache with a fixed lifetime.
pub struct WallCache {
    state: Mutex<State>,
    ttl: Duration,
    capacity: usize,
}

impl WallCache {
    /// Create a cache that clears itself every `ttl` and holds at most
    /// `capacity` walls, evicting the least recently used one when full.
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            state: Mutex::new(State {
                entries: HashMap::new(),
                expires_at: Instant::now() + ttl,
            }),
            ttl,
            capacity: capacity.max(1),
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_ttl, config.cache_capacity)
    }

    /// The cached wall for these arguments, created if missing.
    pub fn get(&self, id: i64, cutoff_date: Option<&str>, group: bool) -> SharedWall {
        self.get_at(id, cutoff_date, group, Instant::now())
    }

    fn get_at(&self, id: i64, cutoff_date: Option<&str>, group: bool, now: Instant) -> SharedWall {
        let owner_id = if group { -id } else { id };
        let key = (owner_id, cutoff_date.map(ToString::to_string));
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if now >= state.expires_at {
            if !state.entries.is_empty() {
                debug!(walls = state.entries.len(), "Wall cache expired, clearing");
            }
            state.entries.clear();
            state.expires_at = now + self.ttl;
        }

        if let Some(entry) = state.entries.get_mut(&key) {
            entry.last_used = now;
            return Arc::clone(&entry.wall);
        }

        if state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                state.entries.remove(&oldest);
            }
        }

        let wall = Arc::new(tokio::sync::Mutex::new(Wall::new(
            id,
            cutoff_date.map(ToString::to_string),
            group,
        )));
        state.entries.insert(
            key,
            Entry {
                wall: Arc::clone(&wall),
                last_used: now,
            },
        );
        wall
    }

    /// Number of walls currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clear();
    }
}

impl Default for WallCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300), 128) // 5 minute window
    }
}
