//! Debugging engine interface.
//!
//! Adapter never inspects a debugee by itself, all domain operations (breakpoint creation,
//! value evaluation, thread listing) are delegated to an [`Engine`] implementation. Engine objects
//! are identified by opaque native handles, protocol-visible numbering is owned by the
//! [`crate::session`] layer.

use std::fmt;
use strum_macros::{Display, EnumString, IntoStaticStr};

/// Engine own breakpoint or watchpoint identifier.
pub type NativeId = u32;

/// Engine thread identifier (index id, as shown to a user).
pub type ThreadId = u64;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, IntoStaticStr)]
pub enum StoppointKind {
    #[strum(serialize = "breakpoint")]
    Breakpoint,
    #[strum(serialize = "watchpoint")]
    Watchpoint,
}

/// Native handle of a breakpoint or watchpoint.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StoppointHandle {
    pub native_id: NativeId,
    pub kind: StoppointKind,
}

impl StoppointHandle {
    pub fn breakpoint(native_id: NativeId) -> Self {
        Self {
            native_id,
            kind: StoppointKind::Breakpoint,
        }
    }

    pub fn watchpoint(native_id: NativeId) -> Self {
        Self {
            native_id,
            kind: StoppointKind::Watchpoint,
        }
    }
}

/// Place where a breakpoint should be set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakpointLocation {
    Address(u64),
    Line { file: String, line: u64 },
    FileFunction { file: String, function: String },
    Function(String),
}

impl fmt::Display for BreakpointLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakpointLocation::Address(addr) => write!(f, "*{addr:#x}"),
            BreakpointLocation::Line { file, line } => write!(f, "{file}:{line}"),
            BreakpointLocation::FileFunction { file, function } => write!(f, "{file}:{function}"),
            BreakpointLocation::Function(function) => f.write_str(function),
        }
    }
}

/// Source and address information of a stoppoint first location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationMetadata {
    pub address: Option<u64>,
    pub function: Option<String>,
    pub file: Option<String>,
    /// Directory of the source file.
    pub path: Option<String>,
    pub line: Option<u64>,
    /// Number of resolved locations.
    pub locations: u32,
}

/// Engine-observed state of a stoppoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoppointState {
    pub enabled: bool,
    pub hit_count: u32,
    pub ignore_count: u32,
    pub condition: Option<String>,
    pub one_shot: bool,
    pub thread: Option<ThreadId>,
}

/// Memory region that a watch expression refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchTarget {
    pub address: u64,
    pub size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameInfo {
    pub level: u32,
    pub address: u64,
    pub function: Option<String>,
    pub file: Option<String>,
    pub path: Option<String>,
    pub line: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Breakpoint(NativeId),
    Watchpoint(NativeId),
    Trace,
    PlanComplete,
    Signal(i32),
    Exception(String),
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopEvent {
    /// Thread that caused the stop.
    pub thread: ThreadId,
    pub reason: StopReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoppointEvent {
    Added,
    Removed,
    LocationsAdded(u32),
    LocationsResolved,
    Enabled,
    Disabled,
    CommandChanged,
    ConditionChanged,
    IgnoreChanged,
    AutoContinueChanged,
    ThreadChanged,
}

/// Shared library or executable known to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    pub target_name: String,
    pub host_name: String,
    pub symbols_loaded: bool,
    pub symbols_path: Option<String>,
    pub load_address: Option<u64>,
    pub size: u64,
}

/// Unsolicited engine notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Running,
    Stopped(StopEvent),
    Suspended,
    Exited(i32),
    Stoppoint {
        handle: StoppointHandle,
        event: StoppointEvent,
    },
    ModulesLoaded(Vec<Module>),
    ModulesUnloaded(Vec<Module>),
}

/// Display format of a value.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    EnumString,
    Display,
    IntoStaticStr,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum VarFormat {
    #[strum(serialize = "binary")]
    Binary,
    #[strum(serialize = "octal")]
    Octal,
    #[strum(serialize = "decimal")]
    Decimal,
    #[strum(serialize = "hexadecimal")]
    Hexadecimal,
    #[default]
    #[strum(serialize = "natural")]
    Natural,
}

/// Opaque engine value handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueHandle(pub u64);

/// Result of resolving a variable expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedValue {
    pub handle: ValueHandle,
    /// True if value was produced by expression evaluation, not by variable or register lookup.
    pub evaluated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueInfo {
    /// Value rendered in requested format.
    pub value: String,
    pub type_name: String,
    pub children: u32,
    pub in_scope: bool,
    pub thread: ThreadId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildValue {
    /// Member name, empty for unnamed members (like array elements in some engines).
    pub name: String,
    pub handle: ValueHandle,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("no target selected")]
    NoTarget,
    #[error("no frame selected")]
    NoFrame,
    #[error("invalid engine handle")]
    InvalidHandle,
    #[error("{0}")]
    Message(String),
}

/// Engine-facing collaborator.
///
/// Implementations must be thread safe: command path and event translator call engine
/// concurrently.
pub trait Engine: Send + Sync {
    /// Create a breakpoint. Return native handle of created breakpoint.
    ///
    /// # Arguments
    ///
    /// * `location`: breakpoint place
    fn create_breakpoint(
        &self,
        location: &BreakpointLocation,
    ) -> Result<StoppointHandle, EngineError>;

    /// Create a watchpoint on a memory region.
    ///
    /// # Arguments
    ///
    /// * `address`: region start address
    /// * `size`: region size in bytes
    /// * `read`: trigger on data reads
    /// * `write`: trigger on data writes
    fn create_watchpoint(
        &self,
        address: u64,
        size: usize,
        read: bool,
        write: bool,
    ) -> Result<StoppointHandle, EngineError>;

    /// Resolve watch expression into a memory region.
    fn watch_target(&self, expression: &str) -> Result<WatchTarget, EngineError>;

    /// Return a handle if stoppoint with this native id still exists.
    fn find_stoppoint(&self, native_id: NativeId, kind: StoppointKind) -> Option<StoppointHandle>;

    fn delete_stoppoint(&self, handle: StoppointHandle) -> Result<(), EngineError>;

    fn set_enabled(&self, handle: StoppointHandle, enabled: bool) -> Result<(), EngineError>;

    fn set_condition(
        &self,
        handle: StoppointHandle,
        condition: Option<&str>,
    ) -> Result<(), EngineError>;

    fn set_ignore_count(&self, handle: StoppointHandle, count: u32) -> Result<(), EngineError>;

    fn set_one_shot(&self, handle: StoppointHandle, one_shot: bool) -> Result<(), EngineError>;

    fn set_thread(
        &self,
        handle: StoppointHandle,
        thread: Option<ThreadId>,
    ) -> Result<(), EngineError>;

    fn stoppoint_state(&self, handle: StoppointHandle) -> Result<StoppointState, EngineError>;

    fn hit_count(&self, handle: StoppointHandle) -> Result<u32, EngineError> {
        Ok(self.stoppoint_state(handle)?.hit_count)
    }

    fn location_metadata(&self, handle: StoppointHandle)
        -> Result<LocationMetadata, EngineError>;

    /// Return ids of all live threads.
    fn threads(&self) -> Vec<ThreadId>;

    fn selected_thread(&self) -> Option<ThreadId>;

    /// Return frame at `level` of a thread call stack, `None` if thread has no such frame.
    fn frame(&self, thread: ThreadId, level: u32) -> Option<FrameInfo>;

    /// Continue debugee execution.
    fn resume(&self) -> Result<(), EngineError>;

    /// Resolve an expression into a value. Variables and registers (`$name`) are looked up first,
    /// expression evaluation is a fallback.
    ///
    /// # Arguments
    ///
    /// * `expression`: variable name, register or expression
    /// * `thread`: thread context, selected thread if `None`
    /// * `frame`: frame number, selected frame if `None`
    fn resolve_value(
        &self,
        expression: &str,
        thread: Option<ThreadId>,
        frame: Option<u32>,
    ) -> Result<ResolvedValue, EngineError>;

    fn value_info(&self, value: ValueHandle, format: VarFormat) -> Result<ValueInfo, EngineError>;

    /// Return true if value changed since last check.
    fn value_changed(&self, value: ValueHandle) -> bool;

    fn value_child(&self, value: ValueHandle, index: u32) -> Result<ChildValue, EngineError>;

    fn assign_value(&self, value: ValueHandle, text: &str) -> Result<(), EngineError>;

    /// Block until next engine notification. Return `None` when notification stream is closed.
    fn next_notification(&self) -> Option<Notification>;
}
