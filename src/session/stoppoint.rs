use crate::engine::{LocationMetadata, NativeId, StoppointHandle, StoppointKind, ThreadId};
use crate::mi::record::{addr_string, Results, Value};

pub(crate) const UNKNOWN: &str = "??";

/// Watch expression and access mode of a watchpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchInfo {
    pub expression: String,
    pub read: bool,
    pub write: bool,
}

impl WatchInfo {
    /// Result key of a watchpoint creation record.
    pub fn result_key(&self) -> &'static str {
        match (self.read, self.write) {
            (true, true) => "hw-awpt",
            (true, false) => "hw-rwpt",
            _ => "wpt",
        }
    }

    /// Stop reason of a triggered watchpoint.
    pub fn trigger_reason(&self) -> &'static str {
        match (self.read, self.write) {
            (true, true) => "access-watchpoint-trigger",
            (true, false) => "read-watchpoint-trigger",
            _ => "watchpoint-trigger",
        }
    }
}

/// Breakpoint or watchpoint as known to the protocol layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoppointInfo {
    pub native_id: NativeId,
    pub kind: StoppointKind,
    /// Protocol-visible number.
    pub id: u32,
    /// Delete on hit.
    pub one_shot: bool,
    pub enabled: bool,
    pub pending: bool,
    pub ignore_count: u32,
    pub condition: Option<String>,
    pub thread: Option<ThreadId>,
    pub hit_count: u32,
    /// Location as given by a user (or synthesized for engine created breakpoints).
    pub original_location: String,
    pub thread_group: String,
    pub location: LocationMetadata,
    /// Set for watchpoints only.
    pub watch: Option<WatchInfo>,
}

impl StoppointInfo {
    pub fn new(handle: StoppointHandle, id: u32, thread_group: &str) -> Self {
        Self {
            native_id: handle.native_id,
            kind: handle.kind,
            id,
            one_shot: false,
            enabled: true,
            pending: false,
            ignore_count: 0,
            condition: None,
            thread: None,
            hit_count: 0,
            original_location: String::new(),
            thread_group: thread_group.to_string(),
            location: LocationMetadata::default(),
            watch: None,
        }
    }

    pub fn handle(&self) -> StoppointHandle {
        StoppointHandle {
            native_id: self.native_id,
            kind: self.kind,
        }
    }

    pub fn disposition(&self) -> &'static str {
        if self.one_shot {
            "del"
        } else {
            "keep"
        }
    }

    /// Full source path, `??` if unknown.
    pub fn fullname(&self) -> String {
        fullname(self.location.path.as_deref(), self.location.file.as_deref())
    }

    /// Build `bkpt` tuple.
    pub fn to_tuple(&self) -> Results {
        let mut bkpt = Results::new()
            .with("number", self.id.to_string())
            .with("type", self.kind.to_string())
            .with("disp", self.disposition())
            .with("enabled", if self.enabled { "y" } else { "n" });
        if self.pending {
            bkpt.push(
                "pending",
                Value::List(vec![self.original_location.as_str().into()]),
            );
        }
        bkpt.push(
            "thread-groups",
            Value::List(vec![self.thread_group.as_str().into()]),
        );
        bkpt.push("times", self.hit_count.to_string());
        if let Some(thread) = self.thread {
            bkpt.push("thread", thread.to_string());
        }
        if let Some(cond) = &self.condition {
            bkpt.push("cond", cond.as_str());
        }
        if self.ignore_count != 0 {
            bkpt.push("ignore", self.ignore_count.to_string());
        }

        match &self.watch {
            Some(watch) => {
                bkpt.push("what", watch.expression.as_str());
            }
            None => {
                let loc = &self.location;
                bkpt.push("addr", loc.address.map(addr_string).unwrap_or_else(unknown));
                bkpt.push("func", loc.function.clone().unwrap_or_else(unknown));
                bkpt.push("file", loc.file.clone().unwrap_or_else(unknown));
                bkpt.push("fullname", self.fullname());
                bkpt.push(
                    "line",
                    loc.line.map(|l| l.to_string()).unwrap_or_else(unknown),
                );
                bkpt.push("original-location", self.original_location.as_str());
            }
        }
        bkpt
    }

    /// Build `{number,exp}` tuple of a watchpoint.
    pub fn watch_tuple(&self) -> Results {
        let exp = self
            .watch
            .as_ref()
            .map(|w| w.expression.clone())
            .unwrap_or_else(unknown);
        Results::new()
            .with("number", self.id.to_string())
            .with("exp", exp)
    }
}

pub(crate) fn unknown() -> String {
    UNKNOWN.to_string()
}

pub(crate) fn fullname(path: Option<&str>, file: Option<&str>) -> String {
    match (path, file) {
        (Some(path), Some(file)) => format!("{}/{file}", path.trim_end_matches('/')),
        (None, Some(file)) => file.to_string(),
        _ => unknown(),
    }
}
