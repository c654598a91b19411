//! Named captures and their persistence as one JSON list in a key-value store.

use crate::error::{LabError, LabResult};
use crate::sample::Trajectory;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Storage key holding the entire recording list.
pub const RECORDINGS_KEY: &str = "lyapunov.recordings";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InitialState {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl From<[f64; 3]> for InitialState {
    fn from(v: [f64; 3]) -> Self {
        Self {
            x: v[0],
            y: v[1],
            z: v[2],
        }
    }
}

/// An immutable, named capture of a trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub id: String,
    pub name: String,
    /// Creation time in milliseconds since the epoch.
    pub timestamp: f64,
    pub data: Trajectory,
    /// Seconds, `data.len() * dt` at capture time.
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<InitialState>,
}

impl Recording {
    pub fn new(id: String, name: String, timestamp: f64, data: Trajectory, dt: f64) -> Self {
        let duration = data.len() as f64 * dt;
        Self {
            id,
            name,
            timestamp,
            data,
            duration,
            parameters: None,
            initial_state: None,
        }
    }

    pub fn with_parameters(mut self, parameters: BTreeMap<String, f64>) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn with_initial_state(mut self, state: InitialState) -> Self {
        self.initial_state = Some(state);
        self
    }

    pub fn sample_count(&self) -> usize {
        self.data.len()
    }
}

/// Minimal string key-value storage, the shape of browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> LabResult<()>;
    fn remove(&mut self, key: &str) -> LabResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> LabResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> LabResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Recording list persisted wholesale under a single key.
pub struct RecordingLibrary<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> RecordingLibrary<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, RECORDINGS_KEY)
    }

    pub fn with_key(store: S, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All stored recordings. A missing or unreadable list reads as empty.
    pub fn list(&self) -> Vec<Recording> {
        let Some(raw) = self.store.get(&self.key) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(recordings) => recordings,
            Err(err) => {
                log::warn!("discarding unreadable recording list `{}`: {}", self.key, err);
                Vec::new()
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Recording> {
        self.list().into_iter().find(|r| r.id == id)
    }

    /// Inserts a recording, replacing any stored one with the same id.
    pub fn save(&mut self, recording: Recording) -> LabResult<()> {
        let mut recordings = self.list();
        match recordings.iter_mut().find(|r| r.id == recording.id) {
            Some(existing) => *existing = recording,
            None => recordings.push(recording),
        }
        self.write(&recordings)
    }

    /// Returns whether a recording was removed.
    pub fn delete(&mut self, id: &str) -> LabResult<bool> {
        Ok(self.delete_many(&[id])? > 0)
    }

    /// Removes every recording whose id is listed; returns how many went.
    pub fn delete_many(&mut self, ids: &[&str]) -> LabResult<usize> {
        let doomed: HashSet<&str> = ids.iter().copied().collect();
        let mut recordings = self.list();
        let before = recordings.len();
        recordings.retain(|r| !doomed.contains(r.id.as_str()));
        let removed = before - recordings.len();
        if removed > 0 {
            self.write(&recordings)?;
        }
        Ok(removed)
    }

    pub fn clear(&mut self) -> LabResult<()> {
        self.store.remove(&self.key)
    }

    /// An id derived from the creation timestamp, suffixed when taken.
    pub fn next_id(&self, timestamp: f64) -> String {
        let taken: HashSet<String> = self.list().into_iter().map(|r| r.id).collect();
        let base = format!("rec_{}", timestamp.max(0.0).round() as u64);
        if !taken.contains(&base) {
            return base;
        }
        (1..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| !taken.contains(candidate))
            .unwrap_or(base)
    }

    fn write(&mut self, recordings: &[Recording]) -> LabResult<()> {
        let raw = serde_json::to_string(recordings)
            .map_err(|err| LabError::Store(format!("cannot encode recordings: {err}")))?;
        self.store.set(&self.key, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::{InitialState, KeyValueStore, MemoryStore, Recording, RecordingLibrary, RECORDINGS_KEY};
    use crate::sample::Sample;
    use std::collections::BTreeMap;

    fn recording(id: &str, n: usize) -> Recording {
        let data = (0..n)
            .map(|i| Sample::from_xyz(i as f64, -(i as f64), 0.5).with_time(i as f64 * 0.01))
            .collect();
        Recording::new(id.into(), format!("run {id}"), 1_700_000_000_000.0, data, 0.01)
    }

    #[test]
    fn duration_follows_sample_count() {
        let r = recording("a", 250);
        assert_eq!(r.sample_count(), 250);
        assert!((r.duration - 2.5).abs() < 1e-12);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let r = recording("a", 1).with_initial_state(InitialState::from([1.0, 2.0, 3.0]));
        let json = serde_json::to_value(&r).expect("serialize");
        assert_eq!(json["initialState"]["y"], 2.0);
        assert!(json.get("parameters").is_none());
        assert_eq!(json["data"][0]["x"], 0.0);
    }

    #[test]
    fn save_list_and_replace() {
        let mut library = RecordingLibrary::new(MemoryStore::new());
        assert!(library.list().is_empty());
        library.save(recording("a", 3)).expect("save");
        library.save(recording("b", 4)).expect("save");
        let mut renamed = recording("a", 5);
        renamed.name = "renamed".into();
        library.save(renamed).expect("save");

        let all = library.list();
        assert_eq!(all.len(), 2);
        let a = library.get("a").expect("a");
        assert_eq!(a.name, "renamed");
        assert_eq!(a.sample_count(), 5);
        assert!(library.get("zzz").is_none());
    }

    #[test]
    fn delete_single_and_bulk() {
        let mut library = RecordingLibrary::new(MemoryStore::new());
        for id in ["a", "b", "c", "d"] {
            library.save(recording(id, 2)).expect("save");
        }
        assert!(library.delete("b").expect("delete"));
        assert!(!library.delete("b").expect("delete"));
        assert_eq!(library.delete_many(&["a", "d", "missing"]).expect("delete"), 2);
        let remaining: Vec<String> = library.list().into_iter().map(|r| r.id).collect();
        assert_eq!(remaining, vec!["c".to_string()]);
        library.clear().expect("clear");
        assert!(library.list().is_empty());
    }

    #[test]
    fn corrupt_store_reads_as_empty() {
        let mut store = MemoryStore::new();
        store.set(RECORDINGS_KEY, "{not json".into()).expect("set");
        let mut library = RecordingLibrary::new(store);
        assert!(library.list().is_empty());
        // Saving over a corrupt list starts a fresh one.
        library.save(recording("fresh", 1)).expect("save");
        assert_eq!(library.list().len(), 1);
    }

    #[test]
    fn next_id_avoids_collisions() {
        let mut library = RecordingLibrary::new(MemoryStore::new());
        let first = library.next_id(42.0);
        assert_eq!(first, "rec_42");
        library.save(recording(&first, 1)).expect("save");
        let second = library.next_id(42.0);
        assert_eq!(second, "rec_42_1");
    }

    #[test]
    fn optional_metadata_round_trips() {
        let params = BTreeMap::from([("rho".to_string(), 28.0), ("sigma".to_string(), 10.0)]);
        let r = recording("p", 10)
            .with_parameters(params.clone())
            .with_initial_state(InitialState { x: 1.0, y: 1.0, z: 1.0 });
        let mut library = RecordingLibrary::new(MemoryStore::new());
        library.save(r.clone()).expect("save");
        let loaded = library.get("p").expect("stored");
        assert_eq!(loaded, r);
        assert_eq!(loaded.parameters, Some(params));
    }
}
