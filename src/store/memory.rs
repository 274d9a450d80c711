//! In-memory store for the CLI, demos and tests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::{
    AnchorId, AnchorPoint, DistanceTriple, NewPosition, PositionEstimate, PositionId,
    PositionQuery, TagId, TagRecord, TripleData, TripleId,
};
use crate::store::{AnchorRegistry, DistanceStore, PositionStore, StoreError, StoreResult, TagRegistry};
use crate::utils::config::ConfigError;

/// Anchors and tags of one workshop, as loaded from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteFixture {
    #[serde(default)]
    pub anchors: Vec<AnchorPoint>,
    #[serde(default)]
    pub tags: Vec<TagRecord>,
}

impl SiteFixture {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(ConfigError::from)
    }
}

#[derive(Debug, Default)]
struct State {
    anchors: HashMap<AnchorId, AnchorPoint>,
    tags: HashMap<TagId, TagRecord>,
    triples: HashMap<TagId, DistanceTriple>,
    positions: Vec<PositionEstimate>,
    next_triple_id: u32,
    next_position_id: u32,
}

/// Thread-safe store keeping everything in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    fail_triple_writes: RwLock<bool>,
    fail_position_writes: RwLock<bool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a fixture, rejecting duplicate ids, anchor names or tag codes
    pub fn from_fixture(fixture: SiteFixture) -> StoreResult<Self> {
        let store = Self::new();
        for anchor in fixture.anchors {
            store.add_anchor(anchor)?;
        }
        for tag in fixture.tags {
            store.add_tag(tag)?;
        }
        Ok(store)
    }

    pub fn add_anchor(&self, anchor: AnchorPoint) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.anchors.contains_key(&anchor.id) {
            return Err(StoreError::Constraint(format!("duplicate anchor id {}", anchor.id)));
        }
        if state.anchors.values().any(|a| a.name == anchor.name) {
            return Err(StoreError::Constraint(format!("duplicate anchor name '{}'", anchor.name)));
        }
        state.anchors.insert(anchor.id, anchor);
        Ok(())
    }

    pub fn add_tag(&self, tag: TagRecord) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.tags.contains_key(&tag.id) {
            return Err(StoreError::Constraint(format!("duplicate tag id {}", tag.id)));
        }
        if state.tags.values().any(|t| t.code == tag.code) {
            return Err(StoreError::Constraint(format!("duplicate tag code '{}'", tag.code)));
        }
        state.tags.insert(tag.id, tag);
        Ok(())
    }

    /// Make subsequent triple upserts fail
    pub fn simulate_triple_write_failure(&self, enable: bool) {
        if let Ok(mut flag) = self.fail_triple_writes.write() {
            *flag = enable;
        }
    }

    /// Make subsequent position inserts fail
    pub fn simulate_position_write_failure(&self, enable: bool) {
        if let Ok(mut flag) = self.fail_position_writes.write() {
            *flag = enable;
        }
    }

    pub fn triple_count(&self) -> usize {
        self.read().map(|s| s.triples.len()).unwrap_or(0)
    }

    pub fn position_count(&self) -> usize {
        self.read().map(|s| s.positions.len()).unwrap_or(0)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn flag(flag: &RwLock<bool>) -> bool {
        flag.read().map(|f| *f).unwrap_or(false)
    }
}

impl AnchorRegistry for InMemoryStore {
    fn anchor_by_id(&self, id: AnchorId) -> StoreResult<Option<AnchorPoint>> {
        Ok(self.read()?.anchors.get(&id).cloned())
    }

    fn anchor_by_name(&self, name: &str) -> StoreResult<Option<AnchorPoint>> {
        Ok(self.read()?.anchors.values().find(|a| a.name == name).cloned())
    }
}

impl TagRegistry for InMemoryStore {
    fn tag_by_code(&self, code: &str) -> StoreResult<Option<TagRecord>> {
        Ok(self.read()?.tags.values().find(|t| t.code == code).cloned())
    }

    fn tag_by_id(&self, id: TagId) -> StoreResult<Option<TagRecord>> {
        Ok(self.read()?.tags.get(&id).cloned())
    }

    fn touch_last_communication(&self, id: TagId, at: DateTime<Utc>) -> StoreResult<()> {
        let mut state = self.write()?;
        let tag = state
            .tags
            .get_mut(&id)
            .ok_or_else(|| StoreError::Constraint(format!("unknown tag id {}", id)))?;
        tag.last_communication = Some(at);
        Ok(())
    }
}

impl DistanceStore for InMemoryStore {
    fn triple_by_tag(&self, tag: TagId) -> StoreResult<Option<DistanceTriple>> {
        Ok(self.read()?.triples.get(&tag).cloned())
    }

    fn upsert_triple(&self, data: TripleData) -> StoreResult<DistanceTriple> {
        if Self::flag(&self.fail_triple_writes) {
            return Err(StoreError::Unavailable("simulated triple write failure".to_string()));
        }

        let mut state = self.write()?;
        if !state.tags.contains_key(&data.tag) {
            return Err(StoreError::Constraint(format!("unknown tag id {}", data.tag)));
        }

        if let Some(existing) = state.triples.get_mut(&data.tag) {
            existing.slots = data.slots;
            return Ok(existing.clone());
        }

        state.next_triple_id += 1;
        let triple = DistanceTriple {
            id: TripleId(state.next_triple_id),
            tag: data.tag,
            slots: data.slots,
        };
        state.triples.insert(data.tag, triple.clone());
        Ok(triple)
    }
}

impl PositionStore for InMemoryStore {
    fn insert_position(&self, position: NewPosition) -> StoreResult<PositionEstimate> {
        if Self::flag(&self.fail_position_writes) {
            return Err(StoreError::Unavailable("simulated position write failure".to_string()));
        }

        let mut state = self.write()?;
        state.next_position_id += 1;
        let estimate = PositionEstimate {
            id: PositionId(state.next_position_id),
            tag: position.tag,
            x: position.x,
            y: position.y,
            zone: position.zone,
            timestamp: position.timestamp,
        };
        state.positions.push(estimate.clone());
        Ok(estimate)
    }

    fn positions(&self, query: &PositionQuery) -> StoreResult<Vec<PositionEstimate>> {
        let state = self.read()?;
        let mut matching: Vec<PositionEstimate> = state
            .positions
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        matching.truncate(query.limit);
        Ok(matching)
    }
}
