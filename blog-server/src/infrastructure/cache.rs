use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::domain::page::{Page, PageRequest};
use crate::domain::post::Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub feed: FeedKind,
    pub page: PageRequest,
}

impl CacheKey {
    pub fn global(page: PageRequest) -> Self {
        Self {
            feed: FeedKind::Global,
            page,
        }
    }
}

/// Rendered feed pages kept for a bounded time.
pub trait PageCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<Page<Post>>;
    fn set(&self, key: CacheKey, page: Page<Post>, ttl: Duration);
    fn clear(&self);
}

struct Entry {
    page: Page<Post>,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemoryPageCache {
    entries: DashMap<CacheKey, Entry>,
}

impl MemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PageCache for MemoryPageCache {
    fn get(&self, key: &CacheKey) -> Option<Page<Post>> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => return Some(entry.page.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    fn set(&self, key: CacheKey, page: Page<Post>, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        self.entries.insert(
            key,
            Entry {
                page,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn clear(&self) {
        self.entries.clear();
    }
}
