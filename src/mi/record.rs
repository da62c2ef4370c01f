//! MI output records.
//!
//! Every line written by the adapter is one of: a result record (`token^class,results`),
//! an async (out-of-band) record (`*stopped,...`, `=thread-created,...`), a stream record
//! (`~"text"`) or a prompt.

use std::fmt;
use strum_macros::{Display, IntoStaticStr};

/// MI value: a c-string constant, a tuple, or a list of values or results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Const(String),
    Tuple(Results),
    List(Vec<Value>),
    ResultList(Results),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Const(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Const(value)
    }
}

impl From<Results> for Value {
    fn from(value: Results) -> Self {
        Value::Tuple(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Const(c) => write!(f, "\"{}\"", escape(c)),
            Value::Tuple(results) => write!(f, "{{{results}}}"),
            Value::ResultList(results) => write!(f, "[{results}]"),
            Value::List(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i != 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Ordered list of `name=value` pairs. Names may repeat (like `child=` in a result list).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Results(Vec<(String, Value)>);

impl Results {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return first value with this name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

impl fmt::Display for Results {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(",")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

/// Escape text as a c-string content.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c.is_ascii_control() => escaped.push_str(&format!("\\{:03o}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Format address as `0x` and 16 hex digits.
pub fn addr_string(addr: u64) -> String {
    format!("{addr:#018x}")
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ResultClass {
    Done,
    Running,
    Connected,
    Error,
    Exit,
}

/// Reply to a command, exactly one per command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub token: Option<String>,
    pub class: ResultClass,
    pub results: Results,
}

impl ResultRecord {
    pub fn new(token: Option<String>, class: ResultClass, results: Results) -> Self {
        Self {
            token,
            class,
            results,
        }
    }

    pub fn done(token: Option<String>, results: Results) -> Self {
        Self::new(token, ResultClass::Done, results)
    }

    pub fn error(token: Option<String>, msg: impl Into<String>) -> Self {
        Self::new(
            token,
            ResultClass::Error,
            Results::new().with("msg", msg.into()),
        )
    }
}

impl fmt::Display for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(token) = &self.token {
            f.write_str(token)?;
        }
        write!(f, "^{}", self.class)?;
        if !self.results.is_empty() {
            write!(f, ",{}", self.results)?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum AsyncKind {
    Stopped,
    Running,
    ThreadCreated,
    ThreadExited,
    ThreadSelected,
    ThreadGroupExited,
    BreakpointCreated,
    BreakpointModified,
    BreakpointDeleted,
    LibraryLoaded,
    LibraryUnloaded,
}

impl AsyncKind {
    /// Exec records (`*`) report execution state, notify records (`=`) everything else.
    fn prefix(self) -> char {
        match self {
            AsyncKind::Stopped | AsyncKind::Running => '*',
            _ => '=',
        }
    }
}

/// Out-of-band notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncRecord {
    pub kind: AsyncKind,
    pub results: Results,
}

impl AsyncRecord {
    pub fn new(kind: AsyncKind, results: Results) -> Self {
        Self { kind, results }
    }
}

impl fmt::Display for AsyncRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.kind)?;
        if !self.results.is_empty() {
            write!(f, ",{}", self.results)?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StreamKind {
    Console,
    Target,
    Log,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord {
    pub kind: StreamKind,
    pub text: String,
}

impl fmt::Display for StreamRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            StreamKind::Console => '~',
            StreamKind::Target => '@',
            StreamKind::Log => '&',
        };
        write!(f, "{prefix}\"{}\"", escape(&self.text))
    }
}

/// Any output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Result(ResultRecord),
    Async(AsyncRecord),
    Stream(StreamRecord),
    Prompt,
}

impl From<ResultRecord> for Record {
    fn from(value: ResultRecord) -> Self {
        Record::Result(value)
    }
}

impl From<AsyncRecord> for Record {
    fn from(value: AsyncRecord) -> Self {
        Record::Async(value)
    }
}

impl From<StreamRecord> for Record {
    fn from(value: StreamRecord) -> Self {
        Record::Stream(value)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Result(r) => r.fmt(f),
            Record::Async(r) => r.fmt(f),
            Record::Stream(r) => r.fmt(f),
            Record::Prompt => f.write_str("(gdb)"),
        }
    }
}
