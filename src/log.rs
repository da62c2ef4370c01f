use crate::config::Config;
use anyhow::Context;
use log::{LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

static ENABLED: AtomicBool = AtomicBool::new(true);

#[inline(always)]
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::SeqCst)
}

pub fn disable() {
    ENABLED.store(false, Ordering::SeqCst)
}

pub fn enable() {
    ENABLED.store(true, Ordering::SeqCst)
}

#[macro_export]
macro_rules! mi_info {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::log::is_enabled() {
            log::info!(target: $target, $($arg)+)
        }
    };
    ($($arg:tt)+) => {
        if $crate::log::is_enabled() {
            log::info!($($arg)+)
        }
    };
}

#[macro_export]
macro_rules! mi_warn {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::log::is_enabled() {
            log::warn!(target: $target, $($arg)+)
        }
    };
    ($($arg:tt)+) => {
        if $crate::log::is_enabled() {
            log::warn!($($arg)+)
        }
    };
}

#[macro_export]
macro_rules! mi_error {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::log::is_enabled() {
            log::error!(target: $target, $($arg)+)
        }
    };
    ($($arg:tt)+) => {
        if $crate::log::is_enabled() {
            log::error!($($arg)+)
        }
    };
}

#[macro_export]
macro_rules! mi_debug {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::log::is_enabled() {
            log::debug!(target: $target, $($arg)+)
        }
    };
    ($($arg:tt)+) => {
        if $crate::log::is_enabled() {
            log::debug!($($arg)+)
        }
    };
}

/// Global logger that forwards records into a replaceable backend.
/// Stdout is a protocol channel, so backends must never write to it.
pub struct LoggerSwitcher {
    backend: RwLock<Option<Box<dyn Log>>>,
}

pub static LOGGER_SWITCHER: Lazy<LoggerSwitcher> = Lazy::new(|| LoggerSwitcher {
    backend: RwLock::new(None),
});

impl LoggerSwitcher {
    /// Install (or replace) a logger backend.
    ///
    /// # Arguments
    ///
    /// * `logger`: new backend
    /// * `filter`: max level of records passed to backend
    pub fn switch(&self, logger: impl Log + 'static, filter: LevelFilter) {
        let mut backend = self.backend.write().unwrap_or_else(|e| e.into_inner());
        *backend = Some(Box::new(logger));
        drop(backend);

        // switcher may already be installed, it's fine
        _ = log::set_logger(&*LOGGER_SWITCHER);
        log::set_max_level(filter);
    }
}

impl Log for LoggerSwitcher {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let backend = self.backend.read().unwrap_or_else(|e| e.into_inner());
        backend.as_ref().map(|l| l.enabled(metadata)).unwrap_or(false)
    }

    fn log(&self, record: &Record) {
        let backend = self.backend.read().unwrap_or_else(|e| e.into_inner());
        if let Some(logger) = backend.as_ref() {
            logger.log(record);
        }
    }

    fn flush(&self) {
        let backend = self.backend.read().unwrap_or_else(|e| e.into_inner());
        if let Some(logger) = backend.as_ref() {
            logger.flush();
        }
    }
}

/// Logger that writes records into a regular file. Filtering is configured
/// from environment the same way as for `env_logger`.
pub struct FileLogger {
    inner: env_logger::Logger,
    file: Mutex<File>,
}

impl FileLogger {
    pub fn new(path: &Path) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file {}", path.display()))?;
        Ok(Self {
            inner: env_logger::Logger::from_default_env(),
            file: Mutex::new(file),
        })
    }

    pub fn filter(&self) -> LevelFilter {
        self.inner.filter()
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut line = format!("[{}] ", record.level());
        if let Some(module) = record.module_path() {
            line.push_str(module);
            line.push(' ');
        }

        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        _ = writeln!(file, "{line}{}", record.args());
    }

    fn flush(&self) {
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        _ = file.flush();
    }
}

/// Install logger backend according to configuration: a log file if one is configured,
/// stderr otherwise.
pub fn init(config: &Config) -> anyhow::Result<()> {
    match config.log_file.as_deref() {
        Some(path) => {
            let logger = FileLogger::new(path)?;
            let filter = logger.filter();
            LOGGER_SWITCHER.switch(logger, filter);
        }
        None => {
            let logger = env_logger::Logger::from_default_env();
            let filter = logger.filter();
            LOGGER_SWITCHER.switch(logger, filter);
        }
    }
    Ok(())
}
