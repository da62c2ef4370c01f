use crate::engine::{EngineError, NativeId, StoppointKind};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- generic errors --------------------------------------------
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("malformed command line: {0}")]
    Parsing(String),
    #[error("undefined command '{0}'")]
    UnknownCommand(String),
    #[error("command '{command}': {source}")]
    Command {
        command: String,
        #[source]
        source: Box<Error>,
    },

    // --------------------------------- argument errors -------------------------------------------
    #[error("argument '{0}' not found")]
    MissingArgument(&'static str),
    #[error("argument '{0}' has an invalid value '{1}'")]
    InvalidArgument(&'static str, String),
    #[error("arguments '{0}' and '{1}' must be specified together")]
    ArgumentPair(&'static str, &'static str),
    #[error("unknown variable format '{0}'")]
    UnknownVarFormat(String),

    // --------------------------------- identity errors -------------------------------------------
    #[error("breakpoint {0} not found")]
    StoppointNotFound(u32),
    #[error("breakpoint {0} has no valid engine handle")]
    InvalidHandle(u32),
    #[error("variable object '{0}' not found")]
    VarObjNotFound(String),

    // --------------------------------- engine errors ---------------------------------------------
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("breakpoint location '{0}' not found")]
    LocationNotFound(String),
    #[error("could not evaluate expression '{0}'")]
    Evaluation(String),

    // --------------------------------- notification errors ---------------------------------------
    #[error("{kind} with native id {native_id} is unknown to the session")]
    UnresolvedStoppoint {
        native_id: NativeId,
        kind: StoppointKind,
    },

    // --------------------------------- exhaustion errors -----------------------------------------
    #[error("stoppoint id limit ({0}) exhausted")]
    IdExhausted(u32),
}

impl Error {
    /// Return true if the adapter can't keep serving commands after this error.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::IO(_) => true,
            Error::Parsing(_) => false,
            Error::UnknownCommand(_) => false,
            Error::Command { source, .. } => source.is_fatal(),
            Error::MissingArgument(_) => false,
            Error::InvalidArgument(_, _) => false,
            Error::ArgumentPair(_, _) => false,
            Error::UnknownVarFormat(_) => false,
            Error::StoppointNotFound(_) => false,
            Error::InvalidHandle(_) => false,
            Error::VarObjNotFound(_) => false,
            Error::Engine(_) => false,
            Error::LocationNotFound(_) => false,
            Error::Evaluation(_) => false,
            Error::UnresolvedStoppoint { .. } => false,
            Error::IdExhausted(_) => false,
        }
    }

    /// Attach a command name to the error, record will look like `command '<name>': <error>`.
    pub fn in_command(self, command: impl Into<String>) -> Self {
        Error::Command {
            command: command.into(),
            source: Box::new(self),
        }
    }
}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "mi", "{:#}", e);
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "mi", concat!($msg, " {:#}"), e);
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!(log::warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(log::debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::debug, $res, $msg)
    };
}
