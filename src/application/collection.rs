use crate::domain::ports::SharedStore;
use crate::domain::record::Record;
use crate::error::{DeskError, Outcome, StorageFault};
use serde_json::Value;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::{debug, warn};

/// In-memory view of one snapshot.
pub(crate) struct Snapshot<T> {
    pub records: Vec<T>,
    /// Stored entries that did not decode as `T`. They are written back
    /// untouched after the decoded records.
    rejected: Vec<Value>,
    /// False when the stored snapshot exists but could not be read. Writes
    /// are then withheld so a partial session view never replaces it.
    writable: bool,
}

impl<T: Record> Snapshot<T> {
    fn empty(writable: bool) -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
            writable,
        }
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    fn encode(&self) -> serde_json::Result<Vec<u8>> {
        let mut entries = self
            .records
            .iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<_>>>()?;
        entries.extend(self.rejected.iter().cloned());
        serde_json::to_vec(&entries)
    }
}

/// A locked snapshot plus the faults hit while loading it.
pub(crate) struct Loaded<'a, T> {
    pub snapshot: MappedMutexGuard<'a, Snapshot<T>>,
    pub faults: Vec<StorageFault>,
}

/// Owns the session copy of one record type and its persisted snapshot.
///
/// The snapshot is read once, on first access; every mutation rewrites the
/// whole snapshot. The mutex is held across the write, so passes on the same
/// collection never interleave.
pub struct Collection<T: Record> {
    store: SharedStore,
    state: Mutex<Option<Snapshot<T>>>,
}

impl<T: Record> Collection<T> {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            state: Mutex::new(None),
        }
    }

    pub(crate) async fn open(&self) -> Loaded<'_, T> {
        let mut slot = self.state.lock().await;
        let mut faults = Vec::new();
        if slot.is_none() {
            *slot = Some(self.load(&mut faults).await);
        }
        let snapshot = MutexGuard::map(slot, |slot| {
            slot.get_or_insert_with(|| Snapshot::empty(false))
        });
        Loaded { snapshot, faults }
    }

    async fn load(&self, faults: &mut Vec<StorageFault>) -> Snapshot<T> {
        match self.store.get(T::KEY).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<Value>>(&bytes) {
                Ok(entries) => {
                    let snapshot = Self::decode(entries, faults);
                    debug!(
                        key = T::KEY,
                        count = snapshot.records.len(),
                        rejected = snapshot.rejected.len(),
                        "Loaded snapshot"
                    );
                    snapshot
                }
                Err(e) => {
                    let err = DeskError::from(e);
                    warn!(key = T::KEY, error = %err, "Snapshot is unreadable, starting empty");
                    faults.push(StorageFault::new(T::KEY, &err));
                    Snapshot::empty(false)
                }
            },
            Ok(None) => {
                let snapshot = Snapshot {
                    records: T::seed(),
                    rejected: Vec::new(),
                    writable: true,
                };
                debug!(key = T::KEY, count = snapshot.records.len(), "Seeding snapshot");
                faults.extend(self.persist(&snapshot).await);
                snapshot
            }
            Err(err) => {
                warn!(key = T::KEY, error = %err, "Snapshot could not be read, starting empty");
                faults.push(StorageFault::new(T::KEY, &err));
                Snapshot::empty(false)
            }
        }
    }

    /// Decodes entry by entry; a bad entry is set aside with a fault instead
    /// of hiding the whole collection.
    fn decode(entries: Vec<Value>, faults: &mut Vec<StorageFault>) -> Snapshot<T> {
        let mut snapshot = Snapshot::empty(true);
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<T>(entry.clone()) {
                Ok(record) => snapshot.records.push(record),
                Err(e) => {
                    warn!(key = T::KEY, index, error = %e, "Skipping unreadable record");
                    faults.push(StorageFault {
                        key: T::KEY.to_string(),
                        message: format!("skipped unreadable record #{}: {}", index, e),
                    });
                    snapshot.rejected.push(entry);
                }
            }
        }
        snapshot
    }

    /// Writes the whole snapshot. Failures are logged and returned, never
    /// raised.
    pub(crate) async fn persist(&self, snapshot: &Snapshot<T>) -> Option<StorageFault> {
        if !snapshot.writable {
            let fault = StorageFault {
                key: T::KEY.to_string(),
                message: "write skipped: stored snapshot could not be loaded".to_string(),
            };
            warn!(key = T::KEY, "{}", fault.message);
            return Some(fault);
        }
        let result = match snapshot.encode() {
            Ok(bytes) => self.store.set(T::KEY, bytes).await,
            Err(e) => Err(DeskError::from(e)),
        };
        match result {
            Ok(()) => None,
            Err(err) => {
                warn!(key = T::KEY, error = %err, "Failed to persist snapshot");
                Some(StorageFault::new(T::KEY, &err))
            }
        }
    }

    pub async fn list(&self) -> Outcome<Vec<T>> {
        let Loaded { snapshot, faults } = self.open().await;
        Outcome::with_faults(snapshot.records.clone(), faults)
    }

    pub async fn get(&self, id: &str) -> Outcome<Option<T>> {
        let Loaded { snapshot, faults } = self.open().await;
        let found = snapshot.records.iter().find(|r| r.id() == id).cloned();
        Outcome::with_faults(found, faults)
    }

    pub async fn insert(&self, record: T) -> Outcome<T> {
        let Loaded {
            mut snapshot,
            mut faults,
        } = self.open().await;
        snapshot.records.push(record.clone());
        faults.extend(self.persist(&snapshot).await);
        debug!(key = T::KEY, id = %record.id(), "Inserted record");
        Outcome::with_faults(record, faults)
    }

    /// Replaces the record with the same id, or appends it. One write.
    pub async fn upsert(&self, record: T) -> Outcome<T> {
        let Loaded {
            mut snapshot,
            mut faults,
        } = self.open().await;
        let id = record.id().into_owned();
        match snapshot.position(&id) {
            Some(index) => snapshot.records[index] = record.clone(),
            None => snapshot.records.push(record.clone()),
        }
        faults.extend(self.persist(&snapshot).await);
        debug!(key = T::KEY, id = %id, "Upserted record");
        Outcome::with_faults(record, faults)
    }

    /// Applies `f` to the record in place and persists. `None` when the id
    /// is unknown, in which case nothing is written.
    pub async fn modify(&self, id: &str, f: impl FnOnce(&mut T)) -> Outcome<Option<T>> {
        let Loaded {
            mut snapshot,
            mut faults,
        } = self.open().await;
        let Some(index) = snapshot.position(id) else {
            debug!(key = T::KEY, id, "Record not found");
            return Outcome::with_faults(None, faults);
        };
        f(&mut snapshot.records[index]);
        let updated = snapshot.records[index].clone();
        faults.extend(self.persist(&snapshot).await);
        Outcome::with_faults(Some(updated), faults)
    }

    pub async fn update(&self, id: &str, patch: T::Patch) -> Outcome<Option<T>> {
        self.modify(id, |record| record.apply(patch)).await
    }

    pub async fn remove(&self, id: &str) -> Outcome<bool> {
        self.remove_where(|r| r.id() == id).await.map(|n| n > 0)
    }

    /// Removes every matching record. Removing nothing is not an error and
    /// writes nothing.
    pub async fn remove_where(&self, pred: impl Fn(&T) -> bool) -> Outcome<usize> {
        let Loaded {
            mut snapshot,
            mut faults,
        } = self.open().await;
        let before = snapshot.records.len();
        snapshot.records.retain(|r| !pred(r));
        let removed = before - snapshot.records.len();
        if removed > 0 {
            faults.extend(self.persist(&snapshot).await);
            debug!(key = T::KEY, removed, "Removed records");
        }
        Outcome::with_faults(removed, faults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::class::{Class, ClassPatch};
    use crate::domain::ports::KeyValueStore;
    use crate::infrastructure::in_memory::InMemoryStore;
    use std::sync::Arc;

    fn class(id: &str, teacher_id: &str) -> Class {
        Class {
            id: id.to_string(),
            name: format!("Class {}", id),
            subject: "Art".to_string(),
            teacher_id: teacher_id.to_string(),
            schedule: String::new(),
            room: String::new(),
        }
    }

    #[tokio::test]
    async fn test_seeds_and_persists_when_absent() {
        let store = InMemoryStore::new();
        let classes: Collection<Class> = Collection::new(Arc::new(store.clone()));

        let listed = classes.list().await;
        assert!(listed.is_clean());
        assert_eq!(listed.value, Class::seed());

        let bytes = store.get("classes").await.unwrap().unwrap();
        let stored: Vec<Class> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(stored, Class::seed());
    }

    #[tokio::test]
    async fn test_existing_empty_snapshot_is_not_reseeded() {
        let store = InMemoryStore::new();
        store.set("classes", b"[]".to_vec()).await.unwrap();
        let classes: Collection<Class> = Collection::new(Arc::new(store));
        assert!(classes.list().await.value.is_empty());
    }

    #[tokio::test]
    async fn test_update_in_place_keeps_position() {
        let store = InMemoryStore::new();
        let classes: Collection<Class> = Collection::new(Arc::new(store));
        classes.insert(class("a", "t")).await;

        let updated = classes
            .update(
                "2",
                ClassPatch {
                    room: Some("Annex".to_string()),
                    ..Default::default()
                },
            )
            .await
            .value
            .unwrap();
        assert_eq!(updated.room, "Annex");

        let ids: Vec<_> = classes.list().await.value.into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["1", "2", "3", "a"]);
    }

    #[tokio::test]
    async fn test_not_found_leaves_collection_unchanged() {
        let store = InMemoryStore::new();
        let classes: Collection<Class> = Collection::new(Arc::new(store));
        let before = classes.list().await.value;

        assert_eq!(classes.update("missing", ClassPatch::default()).await.value, None);
        assert!(!classes.remove("missing").await.value);
        assert_eq!(classes.remove_where(|c| c.teacher_id == "nobody").await.value, 0);

        assert_eq!(classes.list().await.value, before);
    }

    #[tokio::test]
    async fn test_write_fault_keeps_in_memory_effect() {
        let store = InMemoryStore::new();
        let classes: Collection<Class> = Collection::new(Arc::new(store.clone()));
        classes.list().await;

        store.set_simulate_write_error(true);
        let outcome = classes.insert(class("x", "1")).await;
        assert_eq!(outcome.faults.len(), 1);
        assert_eq!(outcome.faults[0].key, "classes");
        assert_eq!(outcome.value.id, "x");

        // The session still sees the record even though the write failed.
        assert!(classes.get("x").await.value.is_some());
    }

    #[tokio::test]
    async fn test_unreadable_snapshot_is_never_overwritten() {
        let store = InMemoryStore::new();
        store.set("classes", b"{not json".to_vec()).await.unwrap();
        let classes: Collection<Class> = Collection::new(Arc::new(store.clone()));

        let listed = classes.list().await;
        assert!(listed.value.is_empty());
        assert_eq!(listed.faults.len(), 1);

        let outcome = classes.insert(class("x", "1")).await;
        assert_eq!(outcome.faults.len(), 1);
        assert_eq!(
            store.get("classes").await.unwrap(),
            Some(b"{not json".to_vec())
        );
    }

    #[tokio::test]
    async fn test_read_fault_reported_once() {
        let store = InMemoryStore::new();
        store.set_simulate_read_error(true);
        let classes: Collection<Class> = Collection::new(Arc::new(store.clone()));

        assert_eq!(classes.list().await.faults.len(), 1);
        store.set_simulate_read_error(false);
        // The session copy is already loaded; the store is not consulted again.
        assert!(classes.list().await.is_clean());
    }

    #[tokio::test]
    async fn test_bad_record_is_set_aside_and_kept() {
        let store = InMemoryStore::new();
        let bad = r#"{"id":"b","name":7}"#;
        store
            .set(
                "classes",
                format!(r#"[{{"id":"a","name":"Choir"}},{}]"#, bad).into_bytes(),
            )
            .await
            .unwrap();
        let classes: Collection<Class> = Collection::new(Arc::new(store.clone()));

        let listed = classes.list().await;
        assert_eq!(listed.value.len(), 1);
        assert_eq!(listed.faults.len(), 1);
        assert!(listed.faults[0].message.contains("#1"));

        // Writes still go through and carry the unreadable entry along.
        assert!(classes.insert(class("c", "1")).await.is_clean());
        let bytes = store.get("classes").await.unwrap().unwrap();
        let stored: Vec<Value> = serde_json::from_slice(&bytes).unwrap();
        let ids: Vec<_> = stored.iter().map(|v| v["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
        assert_eq!(stored[2]["name"], 7);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let classes: Collection<Class> = Collection::new(Arc::new(InMemoryStore::new()));
        classes.upsert(class("1", "9")).await;
        classes.upsert(class("z", "9")).await;

        let all = classes.list().await.value;
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].teacher_id, "9");
        assert_eq!(all[3].id, "z");
    }
}
