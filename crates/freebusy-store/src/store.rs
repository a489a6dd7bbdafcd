use tracing::{debug, trace};

use freebusy_types::{Resource, ResourceId};

use crate::engine::{Engine, ReadTransaction, UpdateTransaction};
use crate::error::{StoreError, StoreResult};

/// Collection holding the latest record per identifier.
const COLLECTION: &str = "freebusy/resources";

/// Persists the most recent state of each resource, keyed by identifier.
///
/// `save` uses optimistic conflict detection: the latest stored record is
/// read, compared, and replaced inside one exclusive engine transaction, so
/// two concurrent saves for the same identifier cannot both observe the
/// pre-write state. The store adds no locking, versioning, or retries of
/// its own — the engine's transaction serialization is the sole
/// correctness mechanism.
pub struct ResourceStore<E> {
    engine: E,
}

impl<E: Engine> ResourceStore<E> {
    /// Create a store over the given engine.
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// The underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Persist `resource` iff it is the most recent state for its id.
    ///
    /// Fails with [`StoreError::ZeroId`] for the sentinel identifier and
    /// with [`StoreError::Conflict`] when a strictly later `since` is
    /// already stored; an equal timestamp overwrites (last writer wins).
    /// A stored record that no longer decodes surfaces as
    /// [`StoreError::Corrupt`].
    pub fn save(&self, resource: &Resource) -> StoreResult<()> {
        if resource.id.is_zero() {
            return Err(StoreError::ZeroId);
        }
        let key = resource.id.to_bytes();
        let payload = resource.to_binary();
        debug!(id = %resource.id, status = %resource.status, "saving resource");

        self.engine.update(COLLECTION, |tx: &mut dyn UpdateTransaction| {
            if let Some(raw) = tx.get(&key)? {
                let latest = Resource::from_binary(&raw).map_err(StoreError::Corrupt)?;
                if latest.since > resource.since {
                    trace!(id = %resource.id, "rejecting stale save");
                    return Err(StoreError::Conflict {
                        stored: latest.since,
                        submitted: resource.since,
                    });
                }
            }
            tx.put(&key, &payload)?;
            Ok(())
        })
    }

    /// The most recent state of the resource with the given identifier.
    ///
    /// An absent identifier is not an error: the zero-value resource is
    /// returned. The sentinel identifier fails with [`StoreError::ZeroId`].
    pub fn get(&self, id: &ResourceId) -> StoreResult<Resource> {
        if id.is_zero() {
            return Err(StoreError::ZeroId);
        }
        let key = id.to_bytes();
        trace!(%id, "reading resource");

        let mut found = Resource::zero();
        self.engine.view::<StoreError, _>(COLLECTION, |tx: &dyn ReadTransaction| {
            if let Some(raw) = tx.get(&key)? {
                found = Resource::from_binary(&raw).map_err(StoreError::Corrupt)?;
            }
            Ok(())
        })?;
        Ok(found)
    }
}

impl<E: std::fmt::Debug> std::fmt::Debug for ResourceStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStore")
            .field("engine", &self.engine)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineError;
    use crate::error::{is_conflict, is_zero_value};
    use crate::memory::MemoryEngine;
    use chrono::{DateTime, Duration, FixedOffset};
    use freebusy_types::Status;
    use std::sync::Arc;
    use std::thread;

    fn since(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    fn resource(status: Status, rfc3339: &str) -> Resource {
        Resource {
            id: ResourceId::generate().unwrap(),
            status,
            since: since(rfc3339),
            friendly_name: String::new(),
        }
    }

    fn new_store() -> ResourceStore<MemoryEngine> {
        ResourceStore::new(MemoryEngine::new())
    }

    // ------------------------------------------------------------------
    // Save / Get basics
    // ------------------------------------------------------------------

    #[test]
    fn save_then_get() {
        let store = new_store();
        let r = resource(Status::BUSY, "2016-05-12T15:09:00-07:00");
        store.save(&r).unwrap();
        assert_eq!(store.get(&r.id).unwrap(), r);
    }

    #[test]
    fn get_absent_returns_zero_resource() {
        let store = new_store();
        let id = ResourceId::generate().unwrap();
        assert_eq!(store.get(&id).unwrap(), Resource::zero());
    }

    #[test]
    fn save_rejects_sentinel_id() {
        let store = new_store();
        let mut r = resource(Status::BUSY, "2016-05-12T15:09:00-07:00");
        r.id = ResourceId::zero();
        let err = store.save(&r).unwrap_err();
        assert!(err.is_zero_value());
        assert!(is_zero_value(&err));
    }

    #[test]
    fn get_rejects_sentinel_id() {
        let store = new_store();
        let err = store.get(&ResourceId::zero()).unwrap_err();
        assert!(err.is_zero_value());
    }

    #[test]
    fn save_is_idempotent() {
        let store = new_store();
        let r = resource(Status::OCCUPIED, "2016-05-12T15:09:00-07:00");
        for _ in 0..5 {
            store.save(&r).unwrap();
        }
        assert_eq!(store.get(&r.id).unwrap(), r);
        assert_eq!(store.engine().record_count(COLLECTION), 1);
    }

    #[test]
    fn friendly_name_is_not_persisted() {
        // The binary record deliberately excludes the name.
        let store = new_store();
        let mut r = resource(Status::BUSY, "2016-05-12T15:09:00-07:00");
        r.friendly_name = "Conference Room A".into();
        store.save(&r).unwrap();
        assert!(store.get(&r.id).unwrap().friendly_name.is_empty());
    }

    // ------------------------------------------------------------------
    // Conflict handling
    // ------------------------------------------------------------------

    #[test]
    fn stale_save_is_a_conflict_and_keeps_newer_state() {
        let store = new_store();
        let r1 = resource(Status::BUSY, "2016-05-12T15:09:01-07:00");
        store.save(&r1).unwrap();

        let mut r2 = r1.clone();
        r2.status = Status::FREE;
        r2.since = since("2016-05-12T15:09:00-07:00");
        let err = store.save(&r2).unwrap_err();
        assert!(err.is_conflict());
        assert!(is_conflict(&err));
        assert!(!is_zero_value(&err));

        assert_eq!(store.get(&r1.id).unwrap(), r1);
    }

    #[test]
    fn equal_timestamp_overwrites() {
        // Last writer with an equal-or-later timestamp wins.
        let store = new_store();
        let r1 = resource(Status::BUSY, "2016-05-12T15:09:00-07:00");
        store.save(&r1).unwrap();

        let mut r2 = r1.clone();
        r2.status = Status::OCCUPIED;
        store.save(&r2).unwrap();
        assert_eq!(store.get(&r1.id).unwrap().status, Status::OCCUPIED);
    }

    #[test]
    fn newer_save_replaces_older() {
        let store = new_store();
        let r1 = resource(Status::FREE, "2016-05-12T16:25:00-07:00");
        store.save(&r1).unwrap();

        let mut r2 = r1.clone();
        r2.status = Status::BUSY;
        r2.since = since("2016-05-12T16:25:01-07:00");
        store.save(&r2).unwrap();
        assert_eq!(store.get(&r1.id).unwrap(), r2);
    }

    #[test]
    fn conflict_compares_instants_across_offsets() {
        let store = new_store();
        let r1 = resource(Status::BUSY, "2016-05-12T15:09:00-07:00");
        store.save(&r1).unwrap();

        // Same instant expressed in UTC: not a conflict, overwrites.
        let mut r2 = r1.clone();
        r2.since = since("2016-05-12T22:09:00Z");
        store.save(&r2).unwrap();

        // One second earlier in UTC: conflict.
        let mut r3 = r1.clone();
        r3.since = since("2016-05-12T22:08:59Z");
        assert!(store.save(&r3).unwrap_err().is_conflict());
    }

    // ------------------------------------------------------------------
    // Corrupt records
    // ------------------------------------------------------------------

    #[test]
    fn corrupt_stored_record_is_not_a_conflict() {
        let store = new_store();
        let r = resource(Status::BUSY, "2016-05-12T15:09:00-07:00");

        store
            .engine()
            .update::<EngineError, _>(COLLECTION, |tx| {
                tx.put(&r.id.to_bytes(), b"garbage")
            })
            .unwrap();

        let err = store.save(&r).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
        assert!(!is_conflict(&err));
        assert!(!is_zero_value(&err));

        let err = store.get(&r.id).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn corrupt_record_aborts_the_save_transaction() {
        let store = new_store();
        let r = resource(Status::BUSY, "2016-05-12T15:09:00-07:00");

        store
            .engine()
            .update::<EngineError, _>(COLLECTION, |tx| {
                tx.put(&r.id.to_bytes(), b"garbage")
            })
            .unwrap();
        store.save(&r).unwrap_err();

        // The garbage record must still be there: the failed save wrote
        // nothing.
        store
            .engine()
            .view::<EngineError, _>(COLLECTION, |tx| {
                assert_eq!(tx.get(&r.id.to_bytes())?, Some(b"garbage".to_vec()));
                Ok(())
            })
            .unwrap();
    }

    // ------------------------------------------------------------------
    // Concurrency
    // ------------------------------------------------------------------

    #[test]
    fn concurrent_saves_keep_only_the_latest() {
        let store = Arc::new(new_store());
        let id = ResourceId::generate().unwrap();
        let base = since("2016-05-12T16:25:00-07:00");

        let versions: Vec<Resource> = (0..16i64)
            .map(|i| Resource {
                id,
                status: Status::from_raw((i % 3) as u8),
                since: base + Duration::seconds(i),
                friendly_name: String::new(),
            })
            .collect();
        let latest = versions.last().unwrap().clone();

        let handles: Vec<_> = versions
            .into_iter()
            .map(|r| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    // A save may lose the race to a newer version; that
                    // conflict is the expected outcome, anything else is not.
                    if let Err(e) = store.save(&r) {
                        assert!(e.is_conflict(), "unexpected error: {e}");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }

        assert_eq!(store.get(&id).unwrap(), latest);
    }

    #[test]
    fn concurrent_saves_for_different_ids_are_independent() {
        let store = Arc::new(new_store());
        let resources: Vec<Resource> = (0..8)
            .map(|_| resource(Status::BUSY, "2016-05-12T15:09:00-07:00"))
            .collect();

        let handles: Vec<_> = resources
            .iter()
            .cloned()
            .map(|r| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.save(&r).unwrap())
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }

        for r in &resources {
            assert_eq!(store.get(&r.id).unwrap(), *r);
        }
    }
}
