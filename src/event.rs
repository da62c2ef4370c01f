//! Engine notifications to out-of-band records.
//!
//! [`EventTranslator`] runs in its own thread, blocks on the engine notification stream and writes
//! `*`, `=` and `~` records. Stoppoint notifications are reconciled with the session state
//! shared with the command path: both sides may be first to observe a new stoppoint.

use crate::engine::{
    Engine, FrameInfo, Module, Notification, StopEvent, StopReason, StoppointHandle,
    StoppointEvent, StoppointKind, ThreadId,
};
use crate::error::Error;
use crate::mi::output::MiOutput;
use crate::mi::record::{addr_string, AsyncKind, AsyncRecord, Results};
use crate::session::stoppoint::{fullname, unknown};
use crate::session::{Session, StoppointInfo, WatchInfo};
use crate::{mi_debug, mi_error, mi_info, mi_warn, weak_error};
use nix::sys::signal::Signal;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Function where a thread creation trap is reported by some engines.
const THREAD_CLONE_FN: &str = "__pthread_clone";

/// Build `frame` tuple. With no frame only the level is known.
pub fn frame_tuple(frame: Option<&FrameInfo>, level: u32) -> Results {
    match frame {
        Some(frame) => Results::new()
            .with("level", frame.level.to_string())
            .with("addr", addr_string(frame.address))
            .with("func", frame.function.clone().unwrap_or_else(unknown))
            .with("file", frame.file.clone().unwrap_or_else(unknown))
            .with(
                "fullname",
                fullname(frame.path.as_deref(), frame.file.as_deref()),
            )
            .with(
                "line",
                frame.line.map(|l| l.to_string()).unwrap_or_else(unknown),
            ),
        None => Results::new()
            .with("level", level.to_string())
            .with("addr", unknown())
            .with("func", unknown())
            .with("file", unknown())
            .with("fullname", unknown())
            .with("line", unknown()),
    }
}

pub struct EventTranslator {
    engine: Arc<dyn Engine>,
    session: Arc<Session>,
    output: Arc<MiOutput>,
    known_threads: BTreeSet<ThreadId>,
    selected_thread: Option<ThreadId>,
}

impl EventTranslator {
    pub fn new(engine: Arc<dyn Engine>, session: Arc<Session>, output: Arc<MiOutput>) -> Self {
        Self {
            engine,
            session,
            output,
            known_threads: BTreeSet::new(),
            selected_thread: None,
        }
    }

    /// Translate notifications until the engine closes the notification stream.
    pub fn run(mut self) {
        while let Some(notification) = self.engine.next_notification() {
            if let Err(e) = self.handle(notification) {
                if e.is_fatal() {
                    mi_error!(target: "mi", "event translation stopped: {e:#}");
                    return;
                }
                mi_warn!(target: "mi", "notification dropped: {e:#}");
            }
        }
        mi_info!(target: "mi", "engine notification stream closed");
    }

    /// Translate a single notification.
    pub fn handle(&mut self, notification: Notification) -> Result<(), Error> {
        match notification {
            Notification::Running => self.emit(
                AsyncKind::Running,
                Results::new().with("thread-id", "all"),
            ),
            Notification::Stopped(event) => {
                self.sync_threads()?;
                self.stopped(event)
            }
            Notification::Suspended => {
                mi_debug!(target: "mi", "process suspended");
                Ok(())
            }
            Notification::Exited(code) => self.exited(code),
            Notification::Stoppoint { handle, event } => self.stoppoint(handle, event),
            Notification::ModulesLoaded(modules) => modules
                .iter()
                .try_for_each(|m| self.emit(AsyncKind::LibraryLoaded, module_results(m, true))),
            Notification::ModulesUnloaded(modules) => modules.iter().try_for_each(|m| {
                self.emit(AsyncKind::LibraryUnloaded, module_results(m, false))
            }),
        }
    }

    fn emit(&self, kind: AsyncKind, results: Results) -> Result<(), Error> {
        self.output.write_async(AsyncRecord::new(kind, results))?;
        Ok(())
    }

    fn thread_results(&self, thread: ThreadId) -> Results {
        Results::new()
            .with("id", thread.to_string())
            .with("group-id", self.session.thread_group())
    }

    /// Reconcile known threads with engine threads.
    fn sync_threads(&mut self) -> Result<(), Error> {
        let live: BTreeSet<ThreadId> = self.engine.threads().into_iter().collect();

        for thread in live.difference(&self.known_threads) {
            self.emit(AsyncKind::ThreadCreated, self.thread_results(*thread))?;
        }
        for thread in self.known_threads.difference(&live) {
            self.emit(AsyncKind::ThreadExited, self.thread_results(*thread))?;
        }
        self.known_threads = live;

        let selected = self.engine.selected_thread();
        if selected.is_some() && selected != self.selected_thread {
            if let Some(thread) = selected {
                self.emit(
                    AsyncKind::ThreadSelected,
                    Results::new().with("id", thread.to_string()),
                )?;
            }
        }
        self.selected_thread = selected;
        Ok(())
    }

    fn stopped(&mut self, event: StopEvent) -> Result<(), Error> {
        let thread = event.thread;
        let frame = self.engine.frame(thread, 0);
        let frame_results = frame_tuple(frame.as_ref(), 0);
        let thread_ids = |results: Results| {
            results
                .with("thread-id", thread.to_string())
                .with("stopped-threads", "all")
        };

        let results = match event.reason {
            StopReason::Breakpoint(native_id) => {
                let handle = StoppointHandle::breakpoint(native_id);
                match self.refresh_hits(handle) {
                    Some(info) => thread_ids(
                        Results::new()
                            .with("reason", "breakpoint-hit")
                            .with("disp", info.disposition())
                            .with("bkptno", info.id.to_string())
                            .with("frame", frame_results),
                    ),
                    None => {
                        mi_warn!(target: "mi", "hit of unknown breakpoint {native_id}");
                        thread_ids(Results::new().with("frame", frame_results))
                    }
                }
            }
            StopReason::Watchpoint(native_id) => {
                let handle = StoppointHandle::watchpoint(native_id);
                match self.refresh_hits(handle) {
                    Some(info) => {
                        let reason = info
                            .watch
                            .as_ref()
                            .map(WatchInfo::trigger_reason)
                            .unwrap_or("watchpoint-trigger");
                        thread_ids(
                            Results::new()
                                .with("reason", reason)
                                .with("wpt", info.watch_tuple())
                                .with("frame", frame_results),
                        )
                    }
                    None => {
                        mi_warn!(target: "mi", "hit of unknown watchpoint {native_id}");
                        thread_ids(Results::new().with("frame", frame_results))
                    }
                }
            }
            StopReason::Trace | StopReason::PlanComplete => match frame {
                Some(_) => thread_ids(
                    Results::new()
                        .with("reason", "end-stepping-range")
                        .with("frame", frame_results),
                ),
                None => thread_ids(Results::new().with("reason", "trace")),
            },
            StopReason::Signal(signo) => {
                let signal = Signal::try_from(signo).ok();
                match signal {
                    Some(Signal::SIGTRAP)
                        if frame.as_ref().and_then(|f| f.function.as_deref())
                            == Some(THREAD_CLONE_FN) =>
                    {
                        mi_debug!(target: "mi", "thread creation trap, resume");
                        self.engine.resume()?;
                        return Ok(());
                    }
                    Some(sig @ (Signal::SIGINT | Signal::SIGSTOP | Signal::SIGSEGV)) => thread_ids(
                        Results::new()
                            .with("reason", "signal-received")
                            .with("signal-name", sig.as_str())
                            .with("signal-meaning", signal_meaning(sig))
                            .with("frame", frame_results),
                    ),
                    Some(sig) => thread_ids(
                        Results::new()
                            .with("reason", "signal-received")
                            .with("signal-name", sig.as_str())
                            .with("frame", frame_results),
                    ),
                    None => thread_ids(
                        Results::new()
                            .with("reason", "signal-received")
                            .with("signal", signo.to_string())
                            .with("frame", frame_results),
                    ),
                }
            }
            StopReason::Exception(description) => thread_ids(
                Results::new()
                    .with("reason", "exception-received")
                    .with("exception", description)
                    .with("frame", frame_results),
            ),
            StopReason::Other => thread_ids(Results::new().with("frame", frame_results)),
        };

        self.emit(AsyncKind::Stopped, results)
    }

    /// Refresh hit count of a hit stoppoint, return its record.
    fn refresh_hits(&self, handle: StoppointHandle) -> Option<StoppointInfo> {
        let id = self.session.ids().get(handle)?;
        match weak_error!(self.engine.hit_count(handle), "read hit count:") {
            Some(hits) => self
                .session
                .update_stoppoint(id, |info| info.hit_count = hits),
            None => self.session.stoppoint(id),
        }
    }

    fn exited(&mut self, code: i32) -> Result<(), Error> {
        let threads = std::mem::take(&mut self.known_threads);
        for thread in threads {
            self.emit(AsyncKind::ThreadExited, self.thread_results(thread))?;
        }
        self.selected_thread = None;

        self.emit(
            AsyncKind::ThreadGroupExited,
            Results::new()
                .with("id", self.session.thread_group())
                .with("exit-code", code.to_string()),
        )?;

        let results = if code == 0 {
            Results::new().with("reason", "exited-normally")
        } else {
            Results::new()
                .with("reason", "exited")
                .with("exit-code", code.to_string())
        };
        self.emit(AsyncKind::Stopped, results)
    }

    fn stoppoint(&mut self, handle: StoppointHandle, event: StoppointEvent) -> Result<(), Error> {
        match event {
            StoppointEvent::Added => self.stoppoint_added(handle),
            StoppointEvent::Removed => {
                let Some(id) = self.session.forget_stoppoint(handle) else {
                    mi_debug!(
                        target: "mi",
                        "removed {} {} is unknown, ignore", handle.kind, handle.native_id
                    );
                    return Ok(());
                };
                self.emit(
                    AsyncKind::BreakpointDeleted,
                    Results::new().with("id", id.to_string()),
                )
            }
            StoppointEvent::LocationsAdded(count) => {
                let id = self.resolve_id(handle)?;
                self.output.write_console(format!(
                    "{count} location(s) added to breakpoint {id}\n"
                ))?;
                self.stoppoint_modified(handle, true)
            }
            StoppointEvent::LocationsResolved => self.stoppoint_modified(handle, true),
            StoppointEvent::Enabled
            | StoppointEvent::Disabled
            | StoppointEvent::CommandChanged
            | StoppointEvent::ConditionChanged
            | StoppointEvent::IgnoreChanged
            | StoppointEvent::AutoContinueChanged
            | StoppointEvent::ThreadChanged => self.stoppoint_modified(handle, false),
        }
    }

    fn resolve_id(&self, handle: StoppointHandle) -> Result<u32, Error> {
        self.session
            .ids()
            .get(handle)
            .ok_or(Error::UnresolvedStoppoint {
                native_id: handle.native_id,
                kind: handle.kind,
            })
    }

    fn stoppoint_added(&mut self, handle: StoppointHandle) -> Result<(), Error> {
        // engine is queried before any session lock is taken
        let state = self.engine.stoppoint_state(handle)?;
        let metadata = self.engine.location_metadata(handle)?;
        let id = self.session.ids().get_or_create(handle)?;

        let thread_group = self.session.thread_group().to_string();
        let (info, created) = self.session.merge_stoppoint(
            id,
            || {
                let mut info = StoppointInfo::new(handle, id, &thread_group);
                info.enabled = state.enabled;
                info.hit_count = state.hit_count;
                info.ignore_count = state.ignore_count;
                info.condition = state.condition.clone();
                info.one_shot = state.one_shot;
                info.thread = state.thread;
                match handle.kind {
                    StoppointKind::Breakpoint => {
                        info.original_location = format!(
                            "{}:{}",
                            metadata.file.as_deref().unwrap_or_default(),
                            metadata.line.unwrap_or_default()
                        );
                    }
                    StoppointKind::Watchpoint => {
                        let expression = format!("{:#010x}", metadata.address.unwrap_or_default());
                        info.original_location = expression.clone();
                        info.watch = Some(WatchInfo {
                            expression,
                            read: false,
                            write: true,
                        });
                    }
                }
                info.location = metadata.clone();
                info
            },
            |info| {
                info.enabled = state.enabled;
                info.hit_count = state.hit_count;
            },
        );

        let kind = if created {
            AsyncKind::BreakpointCreated
        } else {
            AsyncKind::BreakpointModified
        };
        self.emit(kind, Results::new().with("bkpt", info.to_tuple()))
    }

    fn stoppoint_modified(
        &mut self,
        handle: StoppointHandle,
        refresh_location: bool,
    ) -> Result<(), Error> {
        let id = self.resolve_id(handle)?;
        let state = self.engine.stoppoint_state(handle)?;
        let metadata = if refresh_location {
            weak_error!(self.engine.location_metadata(handle), "read locations:")
        } else {
            None
        };

        let info = self
            .session
            .update_stoppoint(id, |info| {
                info.enabled = state.enabled;
                info.hit_count = state.hit_count;
                if let Some(metadata) = metadata {
                    if metadata.locations > 0 {
                        info.pending = false;
                    }
                    info.location = metadata;
                }
            })
            .ok_or(Error::UnresolvedStoppoint {
                native_id: handle.native_id,
                kind: handle.kind,
            })?;

        self.emit(
            AsyncKind::BreakpointModified,
            Results::new().with("bkpt", info.to_tuple()),
        )
    }
}

fn signal_meaning(signal: Signal) -> &'static str {
    match signal {
        Signal::SIGINT => "Interrupt",
        Signal::SIGSTOP => "Stop",
        Signal::SIGSEGV => "Segmentation fault",
        _ => "",
    }
}

fn module_results(module: &Module, loaded: bool) -> Results {
    let mut results = Results::new()
        .with("id", module.target_name.as_str())
        .with("target-name", module.target_name.as_str())
        .with("host-name", module.host_name.as_str());
    if loaded {
        results.push("symbols-loaded", if module.symbols_loaded { "1" } else { "0" });
        if let Some(path) = &module.symbols_path {
            results.push("symbols-path", path.as_str());
        }
        results.push(
            "loaded_addr",
            module
                .load_address
                .map(addr_string)
                .unwrap_or_else(|| "-".to_string()),
        );
        results.push("size", module.size.to_string());
    }
    results
}
