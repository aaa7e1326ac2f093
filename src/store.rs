//! The activity store: the canonical activity list, mirrored to a blob on
//! every mutation.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::{
    Activity, ActivityPatch, CategoryCounts, CategoryFilter, NewActivity, Stats,
};
use crate::query;
use crate::seed;
use crate::storage::BlobStore;
use crate::validation;

pub const DEFAULT_STORAGE_KEY: &str = "extracurriculars";

/// What to do when the stored blob exists but does not parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CorruptPolicy {
    #[default]
    Fail,
    Reseed,
}

impl FromStr for CorruptPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "reseed" => Ok(Self::Reseed),
            _ => Err(format!("Invalid corrupt-storage policy: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub key: String,
    pub on_corrupt: CorruptPolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_string(),
            on_corrupt: CorruptPolicy::default(),
        }
    }
}

pub struct ActivityStore<B: BlobStore> {
    blob: B,
    options: StoreOptions,
    activities: Vec<Activity>,
    is_loading: bool,
}

impl<B: BlobStore> ActivityStore<B> {
    /// Creates an unloaded store. It reports `is_loading() == true` and an
    /// empty list until [`load`](Self::load) runs or the first mutation
    /// triggers it.
    pub fn new(blob: B, options: StoreOptions) -> Self {
        Self {
            blob,
            options,
            activities: Vec::new(),
            is_loading: true,
        }
    }

    pub fn open(blob: B, options: StoreOptions) -> Result<Self> {
        let mut store = Self::new(blob, options);
        store.load()?;
        Ok(store)
    }

    /// Reads the stored activities, seeding the blob with example records when
    /// nothing is stored yet. Does nothing once loaded.
    pub fn load(&mut self) -> Result<()> {
        if !self.is_loading {
            return Ok(());
        }

        let key = self.options.key.clone();
        let activities = match self.blob.read(&key)? {
            Some(raw) => match serde_json::from_str::<Vec<Activity>>(&raw) {
                Ok(activities) => {
                    tracing::debug!(key = %key, count = activities.len(), "Loaded activities");
                    activities
                }
                Err(source) => match self.options.on_corrupt {
                    CorruptPolicy::Fail => return Err(StoreError::Corrupt { key, source }),
                    CorruptPolicy::Reseed => {
                        tracing::warn!(key = %key, error = %source, "Stored activities unreadable, reseeding");
                        self.seed()?
                    }
                },
            },
            None => {
                tracing::info!(key = %key, "No stored activities, writing example records");
                self.seed()?
            }
        };

        warn_on_duplicate_ids(&activities);
        self.activities = activities;
        self.is_loading = false;
        Ok(())
    }

    fn seed(&mut self) -> Result<Vec<Activity>> {
        let activities = seed::default_activities(Utc::now());
        self.write_blob(&activities)?;
        Ok(activities)
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn get(&self, id: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id == id)
    }

    pub fn blob(&self) -> &B {
        &self.blob
    }

    pub fn add(&mut self, new: NewActivity) -> Result<Activity> {
        self.load()?;

        let activity = new.into_activity(Uuid::new_v4().to_string(), Utc::now());
        let mut next = Vec::with_capacity(self.activities.len() + 1);
        next.push(activity.clone());
        next.extend(self.activities.iter().cloned());
        self.commit(next)?;

        tracing::info!(id = %activity.id, name = %activity.name, "Activity added");
        Ok(activity)
    }

    /// Adds every record with a single write. The resulting order matches
    /// calling [`add`](Self::add) for each in turn, so the last record ends
    /// up first. Nothing is added if the write fails.
    pub fn add_many(&mut self, batch: Vec<NewActivity>) -> Result<Vec<Activity>> {
        self.load()?;
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let created_at = Utc::now();
        let added: Vec<Activity> = batch
            .into_iter()
            .map(|new| new.into_activity(Uuid::new_v4().to_string(), created_at))
            .collect();
        let mut next = Vec::with_capacity(self.activities.len() + added.len());
        next.extend(added.iter().rev().cloned());
        next.extend(self.activities.iter().cloned());
        self.commit(next)?;

        tracing::info!(count = added.len(), "Activities added");
        Ok(added)
    }

    /// Validates `new` before adding it.
    pub fn add_validated(&mut self, new: NewActivity) -> Result<Activity> {
        new.validate()?;
        self.add(new)
    }

    /// Merges `patch` over the activity with `id`. An unknown id changes
    /// nothing, though the list is still written back.
    pub fn update(&mut self, id: &str, patch: ActivityPatch) -> Result<()> {
        self.load()?;

        let mut next = self.activities.clone();
        match next.iter_mut().find(|a| a.id == id) {
            Some(activity) => {
                patch.apply(activity);
                tracing::info!(id = %id, "Activity updated");
            }
            None => tracing::debug!(id = %id, "Update skipped, activity not found"),
        }
        self.commit(next)
    }

    /// Validates the patched fields and the resulting date range before
    /// updating.
    pub fn update_validated(&mut self, id: &str, patch: ActivityPatch) -> Result<()> {
        self.load()?;
        patch.validate()?;

        if let Some(existing) = self.get(id) {
            let mut merged = existing.clone();
            patch.clone().apply(&mut merged);
            validation::validate_dates(merged.start_date, merged.end_date, merged.is_ongoing)?;
        }
        self.update(id, patch)
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        self.load()?;

        let next: Vec<Activity> = self
            .activities
            .iter()
            .filter(|a| a.id != id)
            .cloned()
            .collect();
        if next.len() < self.activities.len() {
            tracing::info!(id = %id, "Activity deleted");
        } else {
            tracing::debug!(id = %id, "Delete skipped, activity not found");
        }
        self.commit(next)
    }

    pub fn toggle_sync(&mut self, id: &str) -> Result<()> {
        self.load()?;

        let Some(current) = self.get(id).map(|a| a.linked_in_synced) else {
            tracing::debug!(id = %id, "Sync toggle skipped, activity not found");
            return Ok(());
        };
        self.update(
            id,
            ActivityPatch {
                linked_in_synced: Some(!current),
                ..ActivityPatch::default()
            },
        )
    }

    /// Marks every unsynced activity as synced and returns how many changed.
    pub fn sync_all(&mut self) -> Result<usize> {
        self.load()?;

        let mut changed = 0;
        let next: Vec<Activity> = self
            .activities
            .iter()
            .cloned()
            .map(|mut a| {
                if !a.linked_in_synced {
                    a.linked_in_synced = true;
                    changed += 1;
                }
                a
            })
            .collect();
        if changed > 0 {
            self.commit(next)?;
        }

        tracing::info!(changed, "Marked activities for LinkedIn sync");
        Ok(changed)
    }

    pub fn filter_by_category(&self, filter: CategoryFilter) -> Vec<&Activity> {
        query::filter_by_category(&self.activities, filter)
    }

    pub fn search(&self, query: Option<&str>) -> Vec<&Activity> {
        query::search(&self.activities, query)
    }

    pub fn counts_by_category(&self) -> CategoryCounts {
        query::counts_by_category(&self.activities)
    }

    pub fn stats(&self) -> Stats {
        query::stats(&self.activities)
    }

    /// Writes `next` to the blob and only then replaces the in-memory list.
    fn commit(&mut self, next: Vec<Activity>) -> Result<()> {
        self.write_blob(&next)?;
        self.activities = next;
        Ok(())
    }

    fn write_blob(&mut self, activities: &[Activity]) -> Result<()> {
        let raw = serde_json::to_string(activities).map_err(StoreError::Serialize)?;
        self.blob.write(&self.options.key, &raw)?;
        Ok(())
    }
}

fn warn_on_duplicate_ids(activities: &[Activity]) {
    let mut seen = HashSet::new();
    for activity in activities {
        if !seen.insert(activity.id.as_str()) {
            tracing::warn!(id = %activity.id, "Duplicate activity id in stored data");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::models::Category;
    use crate::storage::MemoryBlobStore;

    fn chess_club() -> NewActivity {
        NewActivity {
            name: "Chess Club".to_string(),
            organization: "HS".to_string(),
            role: "Member".to_string(),
            category: Category::Clubs,
            start_date: "2023-01".parse().unwrap(),
            end_date: None,
            is_ongoing: true,
            description: "Plays competitive chess weekly.".to_string(),
            hours: None,
        }
    }

    fn empty_store() -> ActivityStore<MemoryBlobStore> {
        let blob = MemoryBlobStore::with_blob(DEFAULT_STORAGE_KEY, "[]");
        ActivityStore::open(blob, StoreOptions::default()).unwrap()
    }

    fn stored(store: &ActivityStore<MemoryBlobStore>) -> Vec<Activity> {
        let raw = store.blob().read(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    struct ReadOnlyBlobStore(MemoryBlobStore);

    impl BlobStore for ReadOnlyBlobStore {
        fn read(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
            self.0.read(key)
        }

        fn write(&mut self, key: &str, _value: &str) -> std::result::Result<(), StorageError> {
            Err(StorageError::Io {
                path: key.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    #[test]
    fn new_store_is_loading_until_loaded() {
        let mut store = ActivityStore::new(MemoryBlobStore::new(), StoreOptions::default());
        assert!(store.is_loading());
        assert!(store.activities().is_empty());

        store.load().unwrap();
        assert!(!store.is_loading());
        assert_eq!(store.activities().len(), 3);
    }

    #[test]
    fn missing_blob_is_seeded_and_persisted() {
        let store = ActivityStore::open(MemoryBlobStore::new(), StoreOptions::default()).unwrap();
        let ids: Vec<&str> = store.activities().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(stored(&store), store.activities());
    }

    #[test]
    fn existing_blob_is_loaded_without_seeding() {
        let store = empty_store();
        assert!(store.activities().is_empty());
        assert!(stored(&store).is_empty());
    }

    #[test]
    fn first_mutation_triggers_load() {
        let mut store = ActivityStore::new(MemoryBlobStore::new(), StoreOptions::default());
        store.add(chess_club()).unwrap();
        assert!(!store.is_loading());
        assert_eq!(store.activities().len(), 4);
        assert_eq!(store.activities()[0].name, "Chess Club");
    }

    #[test]
    fn corrupt_blob_fails_by_default() {
        let blob = MemoryBlobStore::with_blob(DEFAULT_STORAGE_KEY, "{not json");
        let err = ActivityStore::open(blob, StoreOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn corrupt_blob_reseeds_when_configured() {
        let blob = MemoryBlobStore::with_blob(DEFAULT_STORAGE_KEY, "{not json");
        let options = StoreOptions {
            on_corrupt: CorruptPolicy::Reseed,
            ..StoreOptions::default()
        };
        let store = ActivityStore::open(blob, options).unwrap();
        assert_eq!(store.activities().len(), 3);
        assert_eq!(stored(&store).len(), 3);
    }

    #[test]
    fn add_assigns_store_fields_and_prepends() {
        let mut store = empty_store();
        let first = store.add(chess_club()).unwrap();

        let before = Utc::now();
        let mut second_fields = chess_club();
        second_fields.name = "Math Olympiad".to_string();
        let second = store.add(second_fields.clone()).unwrap();
        let after = Utc::now();

        assert_ne!(first.id, second.id);
        assert!(!second.linked_in_synced);
        assert!(second.created_at >= before && second.created_at <= after);

        let found = store.get(&second.id).unwrap();
        assert_eq!(found.name, second_fields.name);
        assert_eq!(found.organization, second_fields.organization);
        assert_eq!(found.role, second_fields.role);
        assert_eq!(found.category, second_fields.category);
        assert_eq!(found.start_date, second_fields.start_date);
        assert_eq!(found.is_ongoing, second_fields.is_ongoing);
        assert_eq!(found.description, second_fields.description);
        assert_eq!(found.hours, second_fields.hours);

        let ids: Vec<&str> = store.activities().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
        assert_eq!(stored(&store), store.activities());
    }

    #[test]
    fn add_drops_end_date_for_ongoing_activity() {
        let mut store = empty_store();
        let mut fields = chess_club();
        fields.end_date = Some("2024-05".parse().unwrap());
        let activity = store.add(fields).unwrap();
        assert_eq!(activity.end_date, None);
    }

    #[test]
    fn delete_adjusts_size_only_for_existing_ids() {
        let mut store = empty_store();
        let a = store.add(chess_club()).unwrap();
        store.add(chess_club()).unwrap();
        assert_eq!(store.activities().len(), 2);

        store.delete("missing").unwrap();
        assert_eq!(store.activities().len(), 2);

        store.delete(&a.id).unwrap();
        assert_eq!(store.activities().len(), 1);
        assert!(store.get(&a.id).is_none());
        assert_eq!(stored(&store).len(), 1);
    }

    #[test]
    fn update_changes_only_patched_fields() {
        let mut store = empty_store();
        let original = store.add(chess_club()).unwrap();

        store
            .update(
                &original.id,
                ActivityPatch {
                    hours: Some(Some(10.0)),
                    ..ActivityPatch::default()
                },
            )
            .unwrap();

        let updated = store.get(&original.id).unwrap();
        assert_eq!(updated.hours, Some(10.0));
        let mut expected = original.clone();
        expected.hours = Some(10.0);
        assert_eq!(*updated, expected);
    }

    #[test]
    fn update_leaves_stale_end_date_alone_when_dates_untouched() {
        let mut activity = seed::default_activities(Utc::now()).remove(0);
        activity.end_date = Some("2024-01".parse().unwrap());
        let raw = serde_json::to_string(&vec![activity.clone()]).unwrap();
        let mut store = ActivityStore::open(
            MemoryBlobStore::with_blob(DEFAULT_STORAGE_KEY, raw),
            StoreOptions::default(),
        )
        .unwrap();

        store
            .update(
                &activity.id,
                ActivityPatch {
                    role: Some("President".to_string()),
                    ..ActivityPatch::default()
                },
            )
            .unwrap();
        assert_eq!(store.get(&activity.id).unwrap().end_date, activity.end_date);
    }

    #[test]
    fn update_unknown_id_is_silent_noop() {
        let mut store = empty_store();
        store.add(chess_club()).unwrap();
        let before = store.activities().to_vec();

        store
            .update(
                "missing",
                ActivityPatch {
                    name: Some("Renamed".to_string()),
                    ..ActivityPatch::default()
                },
            )
            .unwrap();
        assert_eq!(store.activities(), before.as_slice());
    }

    #[test]
    fn toggle_sync_twice_restores_flag() {
        let mut store = empty_store();
        let activity = store.add(chess_club()).unwrap();

        store.toggle_sync(&activity.id).unwrap();
        assert!(store.get(&activity.id).unwrap().linked_in_synced);
        store.toggle_sync(&activity.id).unwrap();
        assert!(!store.get(&activity.id).unwrap().linked_in_synced);

        store.toggle_sync("missing").unwrap();
        assert_eq!(store.activities().len(), 1);
    }

    #[test]
    fn sync_all_marks_every_activity() {
        let mut store = ActivityStore::open(MemoryBlobStore::new(), StoreOptions::default()).unwrap();
        assert_eq!(store.stats().synced, 2);

        assert_eq!(store.sync_all().unwrap(), 1);
        assert!(store.activities().iter().all(|a| a.linked_in_synced));
        assert!(stored(&store).iter().all(|a| a.linked_in_synced));

        assert_eq!(store.sync_all().unwrap(), 0);
    }

    #[test]
    fn validated_add_rejects_short_description() {
        let mut store = empty_store();
        let mut fields = chess_club();
        fields.description = "chess".to_string();

        let err = store.add_validated(fields).unwrap_err();
        match err {
            StoreError::Validation(validation) => assert!(validation.has_field("description")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.activities().is_empty());
    }

    #[test]
    fn validated_update_checks_merged_dates() {
        let mut store = empty_store();
        let activity = store.add(chess_club()).unwrap();

        let err = store
            .update_validated(
                &activity.id,
                ActivityPatch {
                    is_ongoing: Some(false),
                    end_date: Some(Some("2022-01".parse().unwrap())),
                    ..ActivityPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.get(&activity.id).unwrap().is_ongoing);
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let inner = MemoryBlobStore::with_blob(DEFAULT_STORAGE_KEY, "[]");
        let mut store =
            ActivityStore::open(ReadOnlyBlobStore(inner), StoreOptions::default()).unwrap();

        let err = store.add(chess_club()).unwrap_err();
        assert!(matches!(err, StoreError::Storage(StorageError::Io { .. })));
        assert!(store.activities().is_empty());
    }

    #[test]
    fn add_many_matches_sequential_adds_in_one_write() {
        let mut store = empty_store();
        let existing = store.add(chess_club()).unwrap();

        let mut debate = chess_club();
        debate.name = "Debate".to_string();
        let mut yearbook = chess_club();
        yearbook.name = "Yearbook".to_string();
        let added = store.add_many(vec![debate, yearbook]).unwrap();
        assert_eq!(added.len(), 2);
        assert_ne!(added[0].id, added[1].id);

        let names: Vec<&str> = store.activities().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Yearbook", "Debate", "Chess Club"]);
        assert_eq!(store.activities()[2].id, existing.id);
        assert_eq!(stored(&store), store.activities());

        assert!(store.add_many(Vec::new()).unwrap().is_empty());
        assert_eq!(store.activities().len(), 3);
    }

    #[test]
    fn failed_batch_write_adds_nothing() {
        let inner = MemoryBlobStore::with_blob(DEFAULT_STORAGE_KEY, "[]");
        let mut store =
            ActivityStore::open(ReadOnlyBlobStore(inner), StoreOptions::default()).unwrap();

        let err = store.add_many(vec![chess_club(), chess_club()]).unwrap_err();
        assert!(matches!(err, StoreError::Storage(StorageError::Io { .. })));
        assert!(store.activities().is_empty());
    }

    #[test]
    fn views_reflect_current_list() {
        let mut store = empty_store();
        store.add(chess_club()).unwrap();
        let mut volunteer = chess_club();
        volunteer.name = "Food Drive".to_string();
        volunteer.category = Category::Volunteer;
        store.add(volunteer).unwrap();

        assert_eq!(store.filter_by_category(CategoryFilter::All).len(), 2);
        assert_eq!(
            store
                .filter_by_category(CategoryFilter::Only(Category::Volunteer))
                .len(),
            1
        );
        assert_eq!(store.search(Some("food")).len(), 1);
        let counts = store.counts_by_category();
        assert_eq!(counts.all, 2);
        assert_eq!(counts.clubs, 1);
        assert_eq!(counts.volunteer, 1);
    }

    #[test]
    fn corrupt_policy_parses() {
        assert_eq!("fail".parse::<CorruptPolicy>(), Ok(CorruptPolicy::Fail));
        assert_eq!("Reseed".parse::<CorruptPolicy>(), Ok(CorruptPolicy::Reseed));
        assert!("ignore".parse::<CorruptPolicy>().is_err());
    }
}
