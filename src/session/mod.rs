//! Session state shared between the command path and the event path.
//!
//! Two locks guard the state: one inside [`StoppointIdMap`] for protocol numbering and one for
//! stoppoint and variable object records. They are never held together, and never held while
//! calling into an engine.

pub mod id_map;
pub mod stoppoint;
pub mod varobj;

pub use id_map::StoppointIdMap;
pub use stoppoint::{StoppointInfo, WatchInfo};
pub use varobj::{child_name, VarObjKind, VarObject};

use crate::config::Config;
use crate::engine::{StoppointHandle, VarFormat};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct SessionState {
    stoppoints: BTreeMap<u32, StoppointInfo>,
    var_objects: BTreeMap<String, VarObject>,
    var_counter: u64,
}

#[derive(Debug)]
pub struct Session {
    ids: StoppointIdMap,
    state: Mutex<SessionState>,
    thread_group: String,
    var_format: VarFormat,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            ids: StoppointIdMap::new(config.max_stoppoint_id),
            state: Mutex::default(),
            thread_group: config.thread_group.clone(),
            var_format: config.var_format,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn ids(&self) -> &StoppointIdMap {
        &self.ids
    }

    pub fn thread_group(&self) -> &str {
        &self.thread_group
    }

    /// Format of new variable objects.
    pub fn default_var_format(&self) -> VarFormat {
        self.var_format
    }

    // ------------------------------------ stoppoints ---------------------------------------------

    /// Insert or replace a stoppoint record.
    pub fn record_stoppoint(&self, info: StoppointInfo) {
        self.lock().stoppoints.insert(info.id, info);
    }

    /// Atomically merge into an existing record or insert a new one.
    /// Return resulting record and true if record was created.
    pub fn merge_stoppoint(
        &self,
        id: u32,
        create: impl FnOnce() -> StoppointInfo,
        merge: impl FnOnce(&mut StoppointInfo),
    ) -> (StoppointInfo, bool) {
        let mut state = self.lock();
        match state.stoppoints.get_mut(&id) {
            Some(info) => {
                merge(info);
                (info.clone(), false)
            }
            None => {
                let info = create();
                state.stoppoints.insert(id, info.clone());
                (info, true)
            }
        }
    }

    pub fn stoppoint(&self, id: u32) -> Option<StoppointInfo> {
        self.lock().stoppoints.get(&id).cloned()
    }

    pub fn stoppoint_by_handle(&self, handle: StoppointHandle) -> Option<StoppointInfo> {
        let id = self.ids.get(handle)?;
        self.stoppoint(id)
    }

    /// Mutate a record, return updated copy or `None` if no such record.
    pub fn update_stoppoint(
        &self,
        id: u32,
        f: impl FnOnce(&mut StoppointInfo),
    ) -> Option<StoppointInfo> {
        let mut state = self.lock();
        let info = state.stoppoints.get_mut(&id)?;
        f(info);
        Some(info.clone())
    }

    pub fn delete_stoppoint(&self, id: u32) -> Option<StoppointInfo> {
        self.lock().stoppoints.remove(&id)
    }

    /// Remove a stoppoint record and then its id mapping.
    /// Return protocol id of removed stoppoint, `None` if handle is unknown.
    pub fn forget_stoppoint(&self, handle: StoppointHandle) -> Option<u32> {
        let id = self.ids.get(handle)?;
        self.delete_stoppoint(id);
        self.ids.remove(handle);
        Some(id)
    }

    /// Return all stoppoint records ordered by protocol id.
    pub fn stoppoints(&self) -> Vec<StoppointInfo> {
        self.lock().stoppoints.values().cloned().collect()
    }

    // ------------------------------------ variable objects ---------------------------------------

    /// Generate unique variable object name `var<N>`.
    pub fn next_var_name(&self) -> String {
        let mut state = self.lock();
        state.var_counter += 1;
        format!("var{}", state.var_counter)
    }

    /// Insert or replace variable object.
    pub fn add_var(&self, var: VarObject) {
        self.lock().var_objects.insert(var.name.clone(), var);
    }

    pub fn var(&self, name: &str) -> Option<VarObject> {
        self.lock().var_objects.get(name).cloned()
    }

    /// Delete variable object by exact name.
    pub fn delete_var(&self, name: &str) -> Option<VarObject> {
        self.lock().var_objects.remove(name)
    }

    pub fn update_var(&self, name: &str, f: impl FnOnce(&mut VarObject)) -> Option<VarObject> {
        let mut state = self.lock();
        let var = state.var_objects.get_mut(name)?;
        f(var);
        Some(var.clone())
    }

    /// Return names of all variable objects.
    pub fn var_names(&self) -> Vec<String> {
        self.lock().var_objects.keys().cloned().collect()
    }

    pub fn var_count(&self) -> usize {
        self.lock().var_objects.len()
    }
}
