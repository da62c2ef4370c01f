use super::context::{is_quoted, strip_slashes, unquote, TokenContext};
use once_cell::sync::Lazy;
use regex::Regex;

static THREAD_GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^i(\d+)$").expect("valid regex"));

/// Capabilities of a string argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StringCaps {
    /// Accept a quoted (maybe multi-word) token and remove its quotes.
    pub quotes: bool,
    /// Accept a bare number.
    pub numbers: bool,
    /// Accept a path-like token (contains `/` or `\`).
    pub paths: bool,
}

impl StringCaps {
    pub const BARE: StringCaps = StringCaps {
        quotes: false,
        numbers: false,
        paths: false,
    };

    pub fn quotes(mut self) -> Self {
        self.quotes = true;
        self
    }

    pub fn numbers(mut self) -> Self {
        self.numbers = true;
        self
    }

    pub fn paths(mut self) -> Self {
        self.paths = true;
        self
    }
}

/// Type of values carried by options and lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Number,
    String,
    StringQuoted,
    StringQuotedNumber,
    StringQuotedNumberPath,
    ThreadGroup,
}

impl ValueType {
    fn schema(self) -> Schema {
        match self {
            ValueType::Number => Schema::Number,
            ValueType::String => Schema::String(StringCaps::BARE),
            ValueType::StringQuoted => Schema::String(StringCaps::BARE.quotes()),
            ValueType::StringQuotedNumber => Schema::String(StringCaps::BARE.quotes().numbers()),
            ValueType::StringQuotedNumberPath => {
                Schema::String(StringCaps::BARE.quotes().numbers().paths())
            }
            ValueType::ThreadGroup => Schema::ThreadGroup,
        }
    }
}

/// How much of value information should be printed (`--no-values`, `--all-values`,
/// `--simple-values`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrintValues {
    #[default]
    NoValues,
    AllValues,
    SimpleValues,
}

impl PrintValues {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "0" | "--no-values" => Some(PrintValues::NoValues),
            "1" | "--all-values" => Some(PrintValues::AllValues),
            "2" | "--simple-values" => Some(PrintValues::SimpleValues),
            _ => None,
        }
    }

    /// Return true if value of an object with `children` children should be printed.
    pub fn shows_value(self, children: u32) -> bool {
        match self {
            PrintValues::NoValues => false,
            PrintValues::AllValues => true,
            PrintValues::SimpleValues => children == 0,
        }
    }
}

/// Values of a found option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionValue(pub Vec<ArgValue>);

impl OptionValue {
    pub fn number(&self, idx: usize) -> Option<i64> {
        match self.0.get(idx)? {
            ArgValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn string(&self, idx: usize) -> Option<&str> {
        match self.0.get(idx)? {
            ArgValue::String(s) | ArgValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn thread_group(&self, idx: usize) -> Option<u32> {
        match self.0.get(idx)? {
            ArgValue::ThreadGroup(n) => Some(*n),
            _ => None,
        }
    }
}

/// Values collected by a list argument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListValue(pub Vec<ArgValue>);

impl ListValue {
    pub fn numbers(&self) -> Vec<i64> {
        self.0
            .iter()
            .filter_map(|v| match v {
                ArgValue::Number(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    pub fn strings(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter_map(|v| match v {
                ArgValue::String(s) | ArgValue::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Decoded argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Text(String),
    String(String),
    Number(i64),
    ThreadGroup(u32),
    PrintValues(PrintValues),
    Option(OptionValue),
    List(ListValue),
}

/// Declarative argument description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Schema {
    Text,
    String(StringCaps),
    Number,
    ThreadGroup,
    PrintValues,
    Option {
        short: Option<&'static str>,
        long: Option<&'static str>,
        arity: usize,
        value: ValueType,
    },
    List {
        value: ValueType,
        max: Option<usize>,
    },
}

/// Result of a single schema validation.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Outcome {
    Found(ArgValue),
    NotFound,
    /// Argument is present but can't be decoded, contains offending text.
    Invalid(String),
}

impl Schema {
    /// Positional schemas look at the front of the context only.
    pub(super) fn is_positional(&self) -> bool {
        !matches!(self, Schema::Option { .. })
    }

    /// Consume tokens of this argument from a context.
    pub(super) fn validate(&self, ctx: &mut TokenContext) -> Outcome {
        match self {
            Schema::Option {
                short,
                long,
                arity,
                value,
            } => validate_option(ctx, *short, *long, *arity, *value),
            Schema::List { value, max } => validate_list(ctx, *value, *max),
            Schema::Text => {
                let Some(front) = ctx.front() else {
                    return Outcome::NotFound;
                };
                let text = if is_quoted(front) {
                    let token = ctx.pop_front().unwrap_or_default();
                    unquote(&token)
                } else {
                    strip_slashes(ctx.take_remainder().trim())
                };
                Outcome::Found(ArgValue::Text(text))
            }
            Schema::String(caps) => {
                let Some(front) = ctx.front() else {
                    return Outcome::NotFound;
                };
                if caps.quotes && is_quoted(front) {
                    let token = ctx.pop_front().unwrap_or_default();
                    return Outcome::Found(ArgValue::String(unquote(&token)));
                }
                if !is_plain_string(front, *caps) {
                    return Outcome::Invalid(front.to_string());
                }
                let token = ctx.pop_front().unwrap_or_default();
                Outcome::Found(ArgValue::String(token))
            }
            Schema::Number => decode_front(ctx, |t| t.parse::<i64>().ok().map(ArgValue::Number)),
            Schema::ThreadGroup => {
                decode_front(ctx, |t| parse_thread_group(t).map(ArgValue::ThreadGroup))
            }
            Schema::PrintValues => {
                decode_front(ctx, |t| PrintValues::parse(t).map(ArgValue::PrintValues))
            }
        }
    }
}

fn decode_front(ctx: &mut TokenContext, decode: impl Fn(&str) -> Option<ArgValue>) -> Outcome {
    let Some(front) = ctx.front() else {
        return Outcome::NotFound;
    };
    match decode(front) {
        Some(value) => {
            ctx.pop_front();
            Outcome::Found(value)
        }
        None => Outcome::Invalid(front.to_string()),
    }
}

fn validate_option(
    ctx: &mut TokenContext,
    short: Option<&'static str>,
    long: Option<&'static str>,
    arity: usize,
    value: ValueType,
) -> Outcome {
    let short_flag = short.map(|s| format!("-{s}"));
    let long_flag = long.map(|l| format!("--{l}"));
    let candidates: Vec<&str> = short_flag
        .iter()
        .chain(long_flag.iter())
        .map(String::as_str)
        .collect();

    let Some(pos) = ctx.position(&candidates) else {
        return Outcome::NotFound;
    };
    let flag = ctx.remove(pos).unwrap_or_default();

    let nested = value.schema();
    let mut values = Vec::with_capacity(arity);
    for _ in 0..arity {
        let Some(token) = ctx.get(pos).map(ToString::to_string) else {
            return Outcome::Invalid(flag);
        };
        let mut single = TokenContext::from_tokens(vec![token.clone()]);
        match nested.validate(&mut single) {
            Outcome::Found(v) => {
                ctx.remove(pos);
                values.push(v);
            }
            _ => return Outcome::Invalid(format!("{flag} {token}")),
        }
    }

    Outcome::Found(ArgValue::Option(OptionValue(values)))
}

fn validate_list(ctx: &mut TokenContext, value: ValueType, max: Option<usize>) -> Outcome {
    let nested = value.schema();
    let mut values = vec![];
    while max.map_or(true, |max| values.len() < max) {
        match nested.validate(ctx) {
            Outcome::Found(v) => values.push(v),
            _ => break,
        }
    }

    if !values.is_empty() {
        return Outcome::Found(ArgValue::List(ListValue(values)));
    }
    match ctx.front() {
        None => Outcome::NotFound,
        Some(front) => Outcome::Invalid(front.to_string()),
    }
}

fn parse_thread_group(token: &str) -> Option<u32> {
    let caps = THREAD_GROUP_RE.captures(token)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Check whether a bare (not quoted) token may be a string argument.
fn is_plain_string(token: &str, caps: StringCaps) -> bool {
    if token.parse::<i64>().is_ok() {
        return caps.numbers;
    }
    if token.starts_with("--") || (token.len() == 2 && token.starts_with('-')) {
        return false;
    }
    if THREAD_GROUP_RE.is_match(token) {
        return false;
    }
    if token.contains('/') || token.contains('\\') {
        return caps.paths;
    }
    true
}
