//! Short-lived memoization of reference lists.
//!
//! Dropdowns and invoices need the full student, teacher and class lists plus
//! the school record. They are fetched once and kept for
//! [`REFERENCE_TTL`]; a successful create, update or delete drops the entries
//! named by [`invalidations_for`] so the next read goes to the network.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use schoolsoft_core::{Class, School, Student, Teacher};
use tracing::debug;

use crate::api::{ApiClient, ApiError, Entity};

/// How long a reference list stays cached.
pub const REFERENCE_TTL: Duration = Duration::from_secs(10 * 60);

/// Cache key: one entry per reference list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKey {
    Students,
    Teachers,
    Classes,
    School,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum RefValue {
    Students(Arc<Vec<Student>>),
    Teachers(Arc<Vec<Teacher>>),
    Classes(Arc<Vec<Class>>),
    School(Arc<School>),
}

/// Where a lookup was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Network,
}

/// A reference value plus whether it was already cached.
#[derive(Debug, Clone)]
pub struct Lookup<T> {
    pub value: Arc<T>,
    pub source: Source,
}

impl<T> Lookup<T> {
    /// Whether the value came straight from the cache.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.source == Source::Cache
    }
}

/// Reference lists that must be dropped after a successful mutation of `entity`.
///
/// Payments change student fee balances, so they invalidate the student list.
/// Class rows carry the class teacher, so teacher saves drop the class list.
#[must_use]
pub const fn invalidations_for(entity: Entity) -> &'static [RefKey] {
    match entity {
        Entity::Student | Entity::Payment => &[RefKey::Students],
        Entity::Teacher => &[RefKey::Teachers, RefKey::Classes],
        Entity::Class => &[RefKey::Classes],
        Entity::School => &[RefKey::School],
        Entity::User => &[],
    }
}

/// Keyed TTL cache in front of the `*/all` endpoints.
///
/// Cheap to clone; clones share entries.
#[derive(Clone)]
pub struct ReferenceCache {
    client: ApiClient,
    cache: Cache<RefKey, RefValue>,
}

impl ReferenceCache {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self::with_ttl(client, REFERENCE_TTL)
    }

    /// Build a cache with a custom retention period.
    #[must_use]
    pub fn with_ttl(client: ApiClient, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(16).time_to_live(ttl).build();
        Self { client, cache }
    }

    /// Cached value for `key` without touching the network.
    pub async fn peek(&self, key: RefKey) -> Option<RefValue> {
        self.cache.get(&key).await
    }

    /// All students.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on a cache miss whose fetch fails.
    pub async fn students(&self) -> Result<Lookup<Vec<Student>>, ApiError> {
        self.lookup(
            RefKey::Students,
            |value| match value {
                RefValue::Students(list) => Some(list),
                _ => None,
            },
            RefValue::Students,
            || self.client.students_all(),
        )
        .await
    }

    /// All teachers.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on a cache miss whose fetch fails.
    pub async fn teachers(&self) -> Result<Lookup<Vec<Teacher>>, ApiError> {
        self.lookup(
            RefKey::Teachers,
            |value| match value {
                RefValue::Teachers(list) => Some(list),
                _ => None,
            },
            RefValue::Teachers,
            || self.client.teachers_all(),
        )
        .await
    }

    /// All classes.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on a cache miss whose fetch fails.
    pub async fn classes(&self) -> Result<Lookup<Vec<Class>>, ApiError> {
        self.lookup(
            RefKey::Classes,
            |value| match value {
                RefValue::Classes(list) => Some(list),
                _ => None,
            },
            RefValue::Classes,
            || self.client.classes_all(),
        )
        .await
    }

    /// The school settings record.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on a cache miss whose fetch fails.
    pub async fn school(&self) -> Result<Lookup<School>, ApiError> {
        self.lookup(
            RefKey::School,
            |value| match value {
                RefValue::School(school) => Some(school),
                _ => None,
            },
            RefValue::School,
            || self.client.school(),
        )
        .await
    }

    /// Drop one entry.
    pub async fn invalidate(&self, key: RefKey) {
        debug!(?key, "Invalidating reference list");
        self.cache.invalidate(&key).await;
    }

    /// Drop every entry affected by a successful mutation of `entity`.
    pub async fn invalidate_after_mutation(&self, entity: Entity) {
        for key in invalidations_for(entity) {
            self.invalidate(*key).await;
        }
    }

    /// Drop everything (e.g. after logout).
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    async fn lookup<T, F, Fut>(
        &self,
        key: RefKey,
        extract: fn(RefValue) -> Option<Arc<T>>,
        wrap: fn(Arc<T>) -> RefValue,
        fetch: F,
    ) -> Result<Lookup<T>, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if let Some(value) = self.cache.get(&key).await.and_then(extract) {
            debug!(?key, "Reference cache hit");
            return Ok(Lookup {
                value,
                source: Source::Cache,
            });
        }

        debug!(?key, "Reference cache miss");
        let value = Arc::new(fetch().await?);
        self.cache.insert(key, wrap(Arc::clone(&value))).await;

        Ok(Lookup {
            value,
            source: Source::Network,
        })
    }
}

impl std::fmt::Debug for ReferenceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceCache")
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}
