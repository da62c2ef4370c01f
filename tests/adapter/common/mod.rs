use bugstalker_mi::engine::{
    BreakpointLocation, ChildValue, Engine, EngineError, FrameInfo, LocationMetadata, NativeId,
    Notification, ResolvedValue, StoppointHandle, StoppointKind, StoppointState, ThreadId,
    ValueHandle, ValueInfo, VarFormat, WatchTarget,
};
use bugstalker_mi::{Adapter, Config};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

pub type CreateHook = Box<dyn Fn(StoppointHandle) + Send + Sync>;

#[derive(Clone, Debug)]
pub struct MockStoppoint {
    pub state: StoppointState,
    pub metadata: LocationMetadata,
    pub watch: Option<(u64, usize, bool, bool)>,
}

#[derive(Clone, Debug, Default)]
pub struct MockValue {
    pub value: String,
    pub type_name: String,
    pub children: Vec<(String, u64)>,
}

#[derive(Default)]
pub struct MockState {
    next_breakpoint: NativeId,
    next_watchpoint: NativeId,
    pub stoppoints: BTreeMap<(NativeId, StoppointKind), MockStoppoint>,
    /// Locations without any code address.
    pub unresolved: HashSet<String>,
    pub threads: Vec<ThreadId>,
    pub selected: Option<ThreadId>,
    pub frames: HashMap<ThreadId, FrameInfo>,
    pub resumed: u32,
    next_value: u64,
    pub values: HashMap<u64, MockValue>,
    /// Variable name to value handle.
    pub variables: HashMap<String, u64>,
    /// Expression text to evaluation result.
    pub expressions: HashMap<String, String>,
    pub changed: HashSet<u64>,
}

impl MockState {
    /// Add a value, return its handle.
    pub fn add_value(&mut self, value: MockValue) -> u64 {
        self.next_value += 1;
        self.values.insert(self.next_value, value);
        self.next_value
    }

    pub fn add_variable(&mut self, name: &str, value: MockValue) -> u64 {
        let handle = self.add_value(value);
        self.variables.insert(name.to_string(), handle);
        handle
    }
}

/// In-memory engine. Notifications are pushed by tests with [`MockEngine::notify`].
pub struct MockEngine {
    pub state: Mutex<MockState>,
    sender: Mutex<Option<Sender<Notification>>>,
    receiver: Mutex<Receiver<Notification>>,
    on_create: Mutex<Option<CreateHook>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            state: Mutex::default(),
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(receiver),
            on_create: Mutex::new(None),
        }
    }
}

impl MockEngine {
    pub fn notify(&self, notification: Notification) {
        if let Some(sender) = self.sender.lock().unwrap().as_ref() {
            sender.send(notification).unwrap();
        }
    }

    /// Close notification stream, buffered notifications are still delivered.
    pub fn close(&self) {
        self.sender.lock().unwrap().take();
    }

    /// Call hook right after a stoppoint is created, as if engine notified concurrently.
    pub fn on_create(&self, hook: CreateHook) {
        *self.on_create.lock().unwrap() = Some(hook);
    }

    pub fn stoppoint(&self, handle: StoppointHandle) -> Option<MockStoppoint> {
        self.state
            .lock()
            .unwrap()
            .stoppoints
            .get(&(handle.native_id, handle.kind))
            .cloned()
    }

    pub fn stoppoint_count(&self) -> usize {
        self.state.lock().unwrap().stoppoints.len()
    }

    fn created(&self, handle: StoppointHandle) -> StoppointHandle {
        if let Some(hook) = self.on_create.lock().unwrap().as_ref() {
            hook(handle);
        }
        handle
    }

    fn with_stoppoint<T>(
        &self,
        handle: StoppointHandle,
        f: impl FnOnce(&mut MockStoppoint) -> T,
    ) -> Result<T, EngineError> {
        let mut state = self.state.lock().unwrap();
        state
            .stoppoints
            .get_mut(&(handle.native_id, handle.kind))
            .map(f)
            .ok_or(EngineError::InvalidHandle)
    }
}

fn breakpoint_metadata(native_id: NativeId, location: &BreakpointLocation) -> LocationMetadata {
    let address = 0x401000 + native_id as u64 * 0x10;
    let (function, file, line) = match location {
        BreakpointLocation::Address(addr) => {
            return LocationMetadata {
                address: Some(*addr),
                locations: 1,
                ..LocationMetadata::default()
            }
        }
        BreakpointLocation::Line { file, line } => ("main".to_string(), file.clone(), *line),
        BreakpointLocation::FileFunction { file, function } => (function.clone(), file.clone(), 1),
        BreakpointLocation::Function(function) => (function.clone(), "main.c".to_string(), 1),
    };
    LocationMetadata {
        address: Some(address),
        function: Some(function),
        file: Some(file),
        path: Some("/src".to_string()),
        line: Some(line),
        locations: 1,
    }
}

fn format_value(value: &str, format: VarFormat) -> String {
    let Ok(n) = value.parse::<i64>() else {
        return value.to_string();
    };
    match format {
        VarFormat::Binary => format!("{n:#b}"),
        VarFormat::Octal => format!("{n:#o}"),
        VarFormat::Hexadecimal => format!("{n:#x}"),
        VarFormat::Decimal | VarFormat::Natural => n.to_string(),
    }
}

impl Engine for MockEngine {
    fn create_breakpoint(
        &self,
        location: &BreakpointLocation,
    ) -> Result<StoppointHandle, EngineError> {
        let handle = {
            let mut state = self.state.lock().unwrap();
            state.next_breakpoint += 1;
            let handle = StoppointHandle::breakpoint(state.next_breakpoint);
            let mut metadata = breakpoint_metadata(handle.native_id, location);
            if state.unresolved.contains(&location.to_string()) {
                metadata = LocationMetadata::default();
            }
            state.stoppoints.insert(
                (handle.native_id, handle.kind),
                MockStoppoint {
                    state: StoppointState {
                        enabled: true,
                        ..StoppointState::default()
                    },
                    metadata,
                    watch: None,
                },
            );
            handle
        };
        Ok(self.created(handle))
    }

    fn create_watchpoint(
        &self,
        address: u64,
        size: usize,
        read: bool,
        write: bool,
    ) -> Result<StoppointHandle, EngineError> {
        let handle = {
            let mut state = self.state.lock().unwrap();
            state.next_watchpoint += 1;
            let handle = StoppointHandle::watchpoint(state.next_watchpoint);
            state.stoppoints.insert(
                (handle.native_id, handle.kind),
                MockStoppoint {
                    state: StoppointState {
                        enabled: true,
                        ..StoppointState::default()
                    },
                    metadata: LocationMetadata {
                        address: Some(address),
                        locations: 1,
                        ..LocationMetadata::default()
                    },
                    watch: Some((address, size, read, write)),
                },
            );
            handle
        };
        Ok(self.created(handle))
    }

    fn watch_target(&self, expression: &str) -> Result<WatchTarget, EngineError> {
        let state = self.state.lock().unwrap();
        let handle = state
            .variables
            .get(expression)
            .ok_or_else(|| EngineError::Message(format!("no symbol '{expression}'")))?;
        Ok(WatchTarget {
            address: 0x601000 + *handle * 8,
            size: 4,
        })
    }

    fn find_stoppoint(&self, native_id: NativeId, kind: StoppointKind) -> Option<StoppointHandle> {
        let state = self.state.lock().unwrap();
        state
            .stoppoints
            .contains_key(&(native_id, kind))
            .then_some(StoppointHandle { native_id, kind })
    }

    fn delete_stoppoint(&self, handle: StoppointHandle) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        state
            .stoppoints
            .remove(&(handle.native_id, handle.kind))
            .map(|_| ())
            .ok_or(EngineError::InvalidHandle)
    }

    fn set_enabled(&self, handle: StoppointHandle, enabled: bool) -> Result<(), EngineError> {
        self.with_stoppoint(handle, |s| s.state.enabled = enabled)
    }

    fn set_condition(
        &self,
        handle: StoppointHandle,
        condition: Option<&str>,
    ) -> Result<(), EngineError> {
        let condition = condition.map(ToString::to_string);
        self.with_stoppoint(handle, |s| s.state.condition = condition)
    }

    fn set_ignore_count(&self, handle: StoppointHandle, count: u32) -> Result<(), EngineError> {
        self.with_stoppoint(handle, |s| s.state.ignore_count = count)
    }

    fn set_one_shot(&self, handle: StoppointHandle, one_shot: bool) -> Result<(), EngineError> {
        self.with_stoppoint(handle, |s| s.state.one_shot = one_shot)
    }

    fn set_thread(
        &self,
        handle: StoppointHandle,
        thread: Option<ThreadId>,
    ) -> Result<(), EngineError> {
        self.with_stoppoint(handle, |s| s.state.thread = thread)
    }

    fn stoppoint_state(&self, handle: StoppointHandle) -> Result<StoppointState, EngineError> {
        self.with_stoppoint(handle, |s| s.state.clone())
    }

    fn location_metadata(
        &self,
        handle: StoppointHandle,
    ) -> Result<LocationMetadata, EngineError> {
        self.with_stoppoint(handle, |s| s.metadata.clone())
    }

    fn threads(&self) -> Vec<ThreadId> {
        self.state.lock().unwrap().threads.clone()
    }

    fn selected_thread(&self) -> Option<ThreadId> {
        self.state.lock().unwrap().selected
    }

    fn frame(&self, thread: ThreadId, level: u32) -> Option<FrameInfo> {
        if level != 0 {
            return None;
        }
        self.state.lock().unwrap().frames.get(&thread).cloned()
    }

    fn resume(&self) -> Result<(), EngineError> {
        self.state.lock().unwrap().resumed += 1;
        Ok(())
    }

    fn resolve_value(
        &self,
        expression: &str,
        _: Option<ThreadId>,
        _: Option<u32>,
    ) -> Result<ResolvedValue, EngineError> {
        let mut state = self.state.lock().unwrap();
        if let Some(handle) = state.variables.get(expression) {
            return Ok(ResolvedValue {
                handle: ValueHandle(*handle),
                evaluated: false,
            });
        }
        let Some(result) = state.expressions.get(expression).cloned() else {
            return Err(EngineError::Message(format!(
                "use of undeclared identifier '{expression}'"
            )));
        };
        let handle = state.add_value(MockValue {
            value: result,
            type_name: "int".to_string(),
            children: vec![],
        });
        Ok(ResolvedValue {
            handle: ValueHandle(handle),
            evaluated: true,
        })
    }

    fn value_info(&self, value: ValueHandle, format: VarFormat) -> Result<ValueInfo, EngineError> {
        let state = self.state.lock().unwrap();
        let v = state.values.get(&value.0).ok_or(EngineError::InvalidHandle)?;
        Ok(ValueInfo {
            value: format_value(&v.value, format),
            type_name: v.type_name.clone(),
            children: v.children.len() as u32,
            in_scope: true,
            thread: state.selected.unwrap_or(1),
        })
    }

    fn value_changed(&self, value: ValueHandle) -> bool {
        self.state.lock().unwrap().changed.remove(&value.0)
    }

    fn value_child(&self, value: ValueHandle, index: u32) -> Result<ChildValue, EngineError> {
        let state = self.state.lock().unwrap();
        let v = state.values.get(&value.0).ok_or(EngineError::InvalidHandle)?;
        let (name, handle) = v
            .children
            .get(index as usize)
            .ok_or(EngineError::InvalidHandle)?;
        Ok(ChildValue {
            name: name.clone(),
            handle: ValueHandle(*handle),
        })
    }

    fn assign_value(&self, value: ValueHandle, text: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let v = state
            .values
            .get_mut(&value.0)
            .ok_or(EngineError::InvalidHandle)?;
        v.value = text.to_string();
        Ok(())
    }

    fn next_notification(&self) -> Option<Notification> {
        self.receiver.lock().unwrap().recv().ok()
    }
}

/// Output buffer shared with the adapter.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    /// Return written lines and clear the buffer.
    pub fn take_lines(&self) -> Vec<String> {
        let data = std::mem::take(&mut *self.0.lock().unwrap());
        String::from_utf8(data)
            .unwrap()
            .lines()
            .map(ToString::to_string)
            .collect()
    }
}

pub struct TestEnv {
    pub engine: Arc<MockEngine>,
    pub adapter: Adapter,
    pub out: SharedBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config(Config {
            prompt: false,
            ..Config::default()
        })
    }

    pub fn with_config(config: Config) -> Self {
        bugstalker_mi::log::disable();
        let engine = Arc::new(MockEngine::default());
        let out = SharedBuf::default();
        let adapter = Adapter::new(engine.clone(), &config, Box::new(out.clone()));
        Self {
            engine,
            adapter,
            out,
        }
    }

    /// Run a command line, return its result record.
    pub fn cmd(&self, line: &str) -> String {
        self.adapter
            .handle_line(line)
            .unwrap()
            .map(|r| r.to_string())
            .unwrap_or_default()
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.engine.state.lock().unwrap()
    }
}
