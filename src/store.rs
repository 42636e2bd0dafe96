/// Persistent application store.
///
/// Owns the user profile and the block list for the whole session. Every
/// mutation writes the affected value back to the key-value slot before it
/// returns; write failures are logged, never returned.
use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db;
use crate::types::{
    BlockId, NewTimeBlock, Priority, PriorityDomain, PriorityId, TimeBlock, TimeBlockPatch,
    UserProfile, clamp_weight,
};

pub const PROFILE_KEY: &str = "userProfile";
pub const BLOCKS_KEY: &str = "timeBlocks";

pub struct Store {
    db: Connection,
    profile: UserProfile,
    blocks: Vec<TimeBlock>,
}

impl Store {
    /// Reads the persisted profile and blocks, falling back to defaults for
    /// absent or undecodable values.
    pub fn load(db: Connection) -> Self {
        let profile: UserProfile = load_or_default(PROFILE_KEY, &db);
        let blocks: Vec<TimeBlock> = load_or_default(BLOCKS_KEY, &db);
        info!(
            onboarded = profile.has_completed_onboarding,
            priorities = profile.priorities.len(),
            blocks = blocks.len(),
            "store loaded"
        );
        Self {
            db,
            profile,
            blocks,
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn blocks(&self) -> &[TimeBlock] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&TimeBlock> {
        self.blocks.iter().find(|block| block.id == id)
    }

    /// Appends a block under a fresh id. Times and overlap are the caller's
    /// responsibility.
    pub fn add_time_block(&mut self, fields: NewTimeBlock) -> BlockId {
        let mut id = Uuid::new_v4();
        while self.block(id).is_some() {
            id = Uuid::new_v4();
        }
        self.blocks.push(TimeBlock {
            id,
            start_time: fields.start_time,
            end_time: fields.end_time,
            title: fields.title,
            category: fields.category,
            status: fields.status.unwrap_or_default(),
        });
        debug!(%id, "time block added");
        self.save_blocks();
        id
    }

    /// Applies `patch` to the block with `id`. Unknown ids are ignored;
    /// returns whether a block matched.
    pub fn update_time_block(&mut self, id: BlockId, patch: TimeBlockPatch) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|block| block.id == id) else {
            debug!(%id, "update ignored, no such block");
            return false;
        };
        patch.apply(block);
        debug!(%id, "time block updated");
        self.save_blocks();
        true
    }

    /// Removes the block with `id`; returns whether one was removed.
    pub fn delete_time_block(&mut self, id: BlockId) -> bool {
        let before = self.blocks.len();
        self.blocks.retain(|block| block.id != id);
        if self.blocks.len() == before {
            debug!(%id, "delete ignored, no such block");
            return false;
        }
        debug!(%id, "time block deleted");
        self.save_blocks();
        true
    }

    pub fn clear_time_blocks(&mut self) {
        self.blocks.clear();
        debug!("time blocks cleared");
        self.save_blocks();
    }

    /// Marks onboarding as done with the final priority list.
    ///
    /// The flag, priorities and audit stamp are replaced as one snapshot and
    /// persisted with a single write. Returns `false` without touching
    /// anything when onboarding was already completed.
    pub fn complete_onboarding(&mut self, priorities: Vec<Priority>) -> bool {
        if self.profile.has_completed_onboarding {
            warn!("onboarding already completed, ignoring");
            return false;
        }
        self.profile = UserProfile {
            has_completed_onboarding: true,
            priorities,
            last_priority_audit: Some(Utc::now()),
        };
        info!(
            priorities = self.profile.priorities.len(),
            "onboarding completed"
        );
        self.save_profile();
        true
    }

    pub fn add_priority(&mut self, domain: PriorityDomain, name: impl Into<String>) -> PriorityId {
        let priority = Priority::new(domain, name);
        let id = priority.id;
        self.profile.priorities.push(priority);
        debug!(%id, %domain, "priority added");
        self.save_profile();
        id
    }

    pub fn set_priority_weight(&mut self, id: PriorityId, weight: i64) -> bool {
        let Some(priority) = self.profile.priorities.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        priority.weight = clamp_weight(weight);
        debug!(%id, weight = priority.weight, "priority weight changed");
        self.save_profile();
        true
    }

    pub fn remove_priority(&mut self, id: PriorityId) -> bool {
        let before = self.profile.priorities.len();
        self.profile.priorities.retain(|p| p.id != id);
        if self.profile.priorities.len() == before {
            return false;
        }
        debug!(%id, "priority removed");
        self.save_profile();
        true
    }

    fn save_profile(&self) {
        persist(PROFILE_KEY, &self.profile, &self.db);
    }

    fn save_blocks(&self) {
        persist(BLOCKS_KEY, &self.blocks, &self.db);
    }
}

fn load_or_default<T: DeserializeOwned + Default>(key: &str, conn: &Connection) -> T {
    match db::get_json(key, conn) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(err) => {
            warn!(key, error = %err, "persisted state unreadable, using defaults");
            T::default()
        }
    }
}

fn persist<T: Serialize + ?Sized>(key: &str, value: &T, conn: &Connection) {
    if let Err(err) = db::put_json(key, value, conn) {
        warn!(key, error = %err, "failed to persist state");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::types::{BlockCategory, BlockStatus};

    fn empty_store() -> Store {
        Store::load(db::init_in_memory().expect("in-memory db"))
    }

    fn block(title: &str, start: &str, end: &str) -> NewTimeBlock {
        NewTimeBlock::planned(title, BlockCategory::Focus, start, end)
    }

    #[test]
    fn fresh_store_uses_defaults() {
        let store = empty_store();
        assert_eq!(store.profile(), &UserProfile::default());
        assert!(store.blocks().is_empty());
    }

    #[test]
    fn added_blocks_have_distinct_ids() {
        let mut store = empty_store();
        let ids = (0..25)
            .map(|i| store.add_time_block(block(&format!("block {i}"), "08:00", "09:00")))
            .collect::<HashSet<_>>();
        assert_eq!(ids.len(), 25);
        assert_eq!(store.blocks().len(), 25);
        let stored = store.blocks().iter().map(|b| b.id).collect::<HashSet<_>>();
        assert_eq!(stored, ids);
    }

    #[test]
    fn missing_status_defaults_to_planned() {
        let mut store = empty_store();
        let id = store.add_time_block(NewTimeBlock {
            status: None,
            ..block("Inbox", "10:00", "11:00")
        });
        assert_eq!(store.block(id).map(|b| b.status), Some(BlockStatus::Planned));
    }

    #[test]
    fn update_changes_only_status() {
        let mut store = empty_store();
        let id = store.add_time_block(block("Deep Work", "07:00", "09:00"));
        let before = store.block(id).cloned().expect("block exists");

        assert!(store.update_time_block(id, TimeBlockPatch::status(BlockStatus::Completed)));

        let after = store.block(id).cloned().expect("block exists");
        assert_eq!(after.status, BlockStatus::Completed);
        assert_eq!(
            TimeBlock {
                status: before.status,
                ..after
            },
            before
        );
    }

    #[test]
    fn update_with_unknown_id_leaves_blocks_unchanged() {
        let mut store = empty_store();
        store.add_time_block(block("Deep Work", "07:00", "09:00"));
        let before = store.blocks().to_vec();

        assert!(!store.update_time_block(
            Uuid::new_v4(),
            TimeBlockPatch::status(BlockStatus::Completed)
        ));
        assert_eq!(store.blocks(), before.as_slice());
    }

    #[test]
    fn delete_removes_exactly_one_and_is_idempotent() {
        let mut store = empty_store();
        let keep = store.add_time_block(block("Keep", "07:00", "08:00"));
        let drop = store.add_time_block(block("Drop", "08:00", "09:00"));

        assert!(store.delete_time_block(drop));
        assert_eq!(store.blocks().len(), 1);
        assert_eq!(store.blocks()[0].id, keep);

        assert!(!store.delete_time_block(drop));
        assert_eq!(store.blocks().len(), 1);
    }

    #[test]
    fn complete_onboarding_replaces_profile_in_one_write() {
        let mut store = empty_store();
        let priorities = vec![
            Priority::new(PriorityDomain::You, "Health").with_weight(5),
            Priority::new(PriorityDomain::Work, "Career"),
        ];

        assert!(store.complete_onboarding(priorities.clone()));

        assert!(store.profile().has_completed_onboarding);
        assert_eq!(store.profile().priorities, priorities);
        assert!(store.profile().last_priority_audit.is_some());

        let persisted: UserProfile = db::get_json(PROFILE_KEY, &store.db)
            .expect("query")
            .expect("profile persisted");
        assert_eq!(&persisted, store.profile());
    }

    #[test]
    fn onboarding_flag_never_resets() {
        let mut store = empty_store();
        store.complete_onboarding(vec![Priority::new(PriorityDomain::You, "Sleep")]);
        let audit = store.profile().last_priority_audit;

        assert!(!store.complete_onboarding(Vec::new()));
        assert!(store.profile().has_completed_onboarding);
        assert_eq!(store.profile().priorities.len(), 1);
        assert_eq!(store.profile().last_priority_audit, audit);
    }

    #[test]
    fn priorities_can_be_edited_after_onboarding() {
        let mut store = empty_store();
        store.complete_onboarding(Vec::new());
        let id = store.add_priority(PriorityDomain::Relationships, "Family");
        assert!(store.set_priority_weight(id, 12));
        assert_eq!(store.profile().priorities[0].weight, 5);
        assert!(store.remove_priority(id));
        assert!(!store.remove_priority(id));
        assert!(store.profile().has_completed_onboarding);
    }

    #[test]
    fn state_survives_restart() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("dayplan.db");

        let (profile, blocks) = {
            let mut store = Store::load(db::init(&path).expect("open db"));
            store.complete_onboarding(vec![Priority::new(PriorityDomain::Work, "Ship")]);
            let id = store.add_time_block(block("Deep Work", "07:00", "09:00"));
            store.add_time_block(block("Lunch", "12:00", "13:00"));
            store.update_time_block(id, TimeBlockPatch::status(BlockStatus::Distracted));
            (store.profile().clone(), store.blocks().to_vec())
        };

        let reloaded = Store::load(db::init(&path).expect("reopen db"));
        assert_eq!(reloaded.profile(), &profile);
        assert_eq!(reloaded.blocks(), blocks.as_slice());
    }

    #[test]
    fn malformed_persisted_state_falls_back_to_defaults() {
        let conn = db::init_in_memory().expect("db");
        db::put_json(PROFILE_KEY, "not a profile", &conn).expect("put");
        db::put_json(BLOCKS_KEY, &serde_json::json!({"oops": 1}), &conn).expect("put");

        let store = Store::load(conn);
        assert_eq!(store.profile(), &UserProfile::default());
        assert!(store.blocks().is_empty());
    }

    #[test]
    fn clear_empties_and_persists() {
        let mut store = empty_store();
        store.add_time_block(block("A", "07:00", "08:00"));
        store.clear_time_blocks();
        assert!(store.blocks().is_empty());
        let persisted: Vec<TimeBlock> = db::get_json(BLOCKS_KEY, &store.db)
            .expect("query")
            .expect("blocks persisted");
        assert!(persisted.is_empty());
    }
}
