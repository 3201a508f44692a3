//! Process-wide, time-boxed store of successful readings.
//!
//! Entries are never evicted explicitly: an entry older than the TTL is simply
//! treated as absent and gets overwritten by the next successful resolution.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::model::WeatherReading;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub reading: WeatherReading,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.cached_at < ttl
    }
}

#[derive(Debug)]
pub struct ReadingCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ReadingCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: RwLock::new(HashMap::new()) }
    }

    pub async fn get(&self, key: &str) -> Option<WeatherReading> {
        self.get_at(key, Utc::now()).await
    }

    pub async fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<WeatherReading> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| entry.reading.clone())
    }

    pub async fn insert(&self, key: String, reading: WeatherReading) {
        self.insert_at(key, reading, Utc::now()).await
    }

    /// Last writer wins when concurrent resolutions race on the same key.
    pub async fn insert_at(&self, key: String, reading: WeatherReading, now: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        entries.insert(key, CacheEntry { reading, cached_at: now });
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(label: &str) -> WeatherReading {
        WeatherReading { is_demo: false, ..WeatherReading::demo(label, Utc::now()) }
    }

    #[tokio::test]
    async fn entry_is_served_within_ttl() {
        let cache = ReadingCache::new(Duration::minutes(5));
        let t0 = Utc::now();
        cache.insert_at("weather_Lima".into(), reading("Lima"), t0).await;

        let hit = cache.get_at("weather_Lima", t0 + Duration::seconds(299)).await;
        assert_eq!(hit.map(|r| r.location_label), Some("Lima".to_string()));
    }

    #[tokio::test]
    async fn entry_expires_at_ttl() {
        let cache = ReadingCache::new(Duration::minutes(5));
        let t0 = Utc::now();
        cache.insert_at("weather_Lima".into(), reading("Lima"), t0).await;

        assert!(cache.get_at("weather_Lima", t0 + Duration::minutes(5)).await.is_none());
        // Expired entries stay in the map until overwritten.
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn newer_insert_overwrites() {
        let cache = ReadingCache::new(Duration::minutes(5));
        let t0 = Utc::now();
        cache.insert_at("k".into(), reading("Old"), t0).await;
        cache.insert_at("k".into(), reading("New"), t0 + Duration::minutes(6)).await;

        let hit = cache.get_at("k", t0 + Duration::minutes(7)).await;
        assert_eq!(hit.map(|r| r.location_label), Some("New".to_string()));
    }

    #[tokio::test]
    async fn unknown_key_misses() {
        let cache = ReadingCache::new(Duration::minutes(5));
        assert!(cache.get("weather_Nowhere").await.is_none());
        assert!(cache.is_empty().await);
    }
}
