use crate::engine::{NativeId, StoppointHandle, StoppointKind};
use crate::error::Error;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
struct IdMapInner {
    forward: HashMap<(NativeId, StoppointKind), u32>,
    reverse: BTreeMap<u32, StoppointHandle>,
    /// Next protocol id, ids are never reused.
    next_id: u32,
}

/// Bidirectional map between engine native stoppoint handles and protocol-visible numbers.
///
/// Shared between the command path and the event path, every operation is atomic.
#[derive(Debug)]
pub struct StoppointIdMap {
    inner: Mutex<IdMapInner>,
    max_id: u32,
}

impl StoppointIdMap {
    /// Create an empty map, `max_id` is the largest id that may be allocated.
    pub fn new(max_id: u32) -> Self {
        Self {
            inner: Mutex::new(IdMapInner {
                forward: HashMap::new(),
                reverse: BTreeMap::new(),
                next_id: 1,
            }),
            max_id,
        }
    }

    fn lock(&self) -> MutexGuard<'_, IdMapInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return protocol id of a native handle, allocate the next one if handle is unknown.
    pub fn get_or_create(&self, handle: StoppointHandle) -> Result<u32, Error> {
        let mut inner = self.lock();
        let key = (handle.native_id, handle.kind);
        if let Some(id) = inner.forward.get(&key) {
            return Ok(*id);
        }

        let id = inner.next_id;
        if id == 0 || id > self.max_id {
            return Err(Error::IdExhausted(self.max_id));
        }
        inner.next_id = id.checked_add(1).unwrap_or(0);
        inner.forward.insert(key, id);
        inner.reverse.insert(id, handle);
        Ok(id)
    }

    /// Return protocol id of a native handle, `None` if never allocated (or removed).
    pub fn get(&self, handle: StoppointHandle) -> Option<u32> {
        self.lock()
            .forward
            .get(&(handle.native_id, handle.kind))
            .copied()
    }

    /// Return native handle known by protocol id.
    pub fn native_of(&self, id: u32) -> Option<StoppointHandle> {
        self.lock().reverse.get(&id).copied()
    }

    /// Remove a mapping. Return false if there was no such mapping.
    pub fn remove(&self, handle: StoppointHandle) -> bool {
        let mut inner = self.lock();
        match inner.forward.remove(&(handle.native_id, handle.kind)) {
            Some(id) => {
                inner.reverse.remove(&id);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
