//! Argument grammar of MI commands.
//!
//! Command declares its arguments as an [`ArgSet`]: an ordered list of typed argument schemas.
//! Validation consumes tokens from a [`TokenContext`] schema by schema, in declaration order,
//! so options must be declared before positional arguments that could swallow their tokens.
//!
//! Declaring an argument returns a typed [`ArgId`], it is later used to get a decoded value of
//! exactly declared type.

pub mod context;
pub mod value;

pub use context::TokenContext;
pub use value::{ArgValue, ListValue, OptionValue, PrintValues, StringCaps, ValueType};

use crate::error::Error;
use crate::mi_debug;
use std::marker::PhantomData;
use value::{Outcome, Schema};

/// Types that may be produced by an argument.
pub trait ArgType: Sized {
    fn extract(value: &ArgValue) -> Option<&Self>;
}

impl ArgType for String {
    fn extract(value: &ArgValue) -> Option<&Self> {
        match value {
            ArgValue::Text(s) | ArgValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl ArgType for i64 {
    fn extract(value: &ArgValue) -> Option<&Self> {
        match value {
            ArgValue::Number(n) => Some(n),
            _ => None,
        }
    }
}

impl ArgType for u32 {
    fn extract(value: &ArgValue) -> Option<&Self> {
        match value {
            ArgValue::ThreadGroup(n) => Some(n),
            _ => None,
        }
    }
}

impl ArgType for PrintValues {
    fn extract(value: &ArgValue) -> Option<&Self> {
        match value {
            ArgValue::PrintValues(pv) => Some(pv),
            _ => None,
        }
    }
}

impl ArgType for OptionValue {
    fn extract(value: &ArgValue) -> Option<&Self> {
        match value {
            ArgValue::Option(o) => Some(o),
            _ => None,
        }
    }
}

impl ArgType for ListValue {
    fn extract(value: &ArgValue) -> Option<&Self> {
        match value {
            ArgValue::List(l) => Some(l),
            _ => None,
        }
    }
}

/// Argument declaration. Value type `T` is fixed by a constructor.
#[derive(Debug, Clone)]
pub struct Arg<T> {
    name: &'static str,
    mandatory: bool,
    schema: Schema,
    _type: PhantomData<fn() -> T>,
}

impl<T> Arg<T> {
    fn with_schema(name: &'static str, mandatory: bool, schema: Schema) -> Self {
        Self {
            name,
            mandatory,
            schema,
            _type: PhantomData,
        }
    }

    pub fn optional(mut self) -> Self {
        self.mandatory = false;
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }
}

impl Arg<String> {
    /// Mandatory free text: a quoted token or all remaining tokens.
    pub fn text(name: &'static str) -> Self {
        Self::with_schema(name, true, Schema::Text)
    }

    /// Mandatory single string token.
    pub fn string(name: &'static str, caps: StringCaps) -> Self {
        Self::with_schema(name, true, Schema::String(caps))
    }
}

impl Arg<i64> {
    /// Mandatory integer.
    pub fn number(name: &'static str) -> Self {
        Self::with_schema(name, true, Schema::Number)
    }
}

impl Arg<u32> {
    /// Mandatory thread group (`i<N>`), value is a group number.
    pub fn thread_group(name: &'static str) -> Self {
        Self::with_schema(name, true, Schema::ThreadGroup)
    }
}

impl Arg<PrintValues> {
    /// Optional print values mode (`0|1|2` or `--no-values|--all-values|--simple-values`).
    pub fn print_values(name: &'static str) -> Self {
        Self::with_schema(name, false, Schema::PrintValues)
    }
}

impl Arg<OptionValue> {
    /// Optional short flag (`-name`) without values.
    pub fn short(name: &'static str) -> Self {
        Self::with_schema(
            name,
            false,
            Schema::Option {
                short: Some(name),
                long: None,
                arity: 0,
                value: ValueType::String,
            },
        )
    }

    /// Optional long flag (`--name`) without values.
    pub fn long(name: &'static str) -> Self {
        Self::with_schema(
            name,
            false,
            Schema::Option {
                short: None,
                long: Some(name),
                arity: 0,
                value: ValueType::String,
            },
        )
    }

    /// Add a long alias (`--alias`) to the flag.
    pub fn alias(mut self, alias: &'static str) -> Self {
        if let Schema::Option { ref mut long, .. } = self.schema {
            *long = Some(alias);
        }
        self
    }

    /// Flag takes `arity` values following it, each one decoded as `value`.
    pub fn takes(mut self, value: ValueType, arity: usize) -> Self {
        if let Schema::Option {
            value: ref mut v,
            arity: ref mut a,
            ..
        } = self.schema
        {
            *v = value;
            *a = arity;
        }
        self
    }
}

impl Arg<ListValue> {
    /// Mandatory list of values.
    pub fn list(name: &'static str, value: ValueType) -> Self {
        Self::with_schema(name, true, Schema::List { value, max: None })
    }

    /// Limit list length.
    pub fn max(mut self, n: usize) -> Self {
        if let Schema::List { ref mut max, .. } = self.schema {
            *max = Some(n);
        }
        self
    }
}

/// Typed key of a declared argument.
#[derive(Debug)]
pub struct ArgId<T> {
    idx: usize,
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for ArgId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArgId<T> {}

#[derive(Debug)]
struct Slot {
    name: &'static str,
    mandatory: bool,
    schema: Schema,
    found: bool,
    valid: bool,
    value: Option<ArgValue>,
}

/// Ordered collection of command arguments.
#[derive(Debug, Default)]
pub struct ArgSet {
    slots: Vec<Slot>,
}

impl ArgSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an argument. Arguments are validated in declaration order.
    pub fn add<T: ArgType>(&mut self, arg: Arg<T>) -> ArgId<T> {
        self.slots.push(Slot {
            name: arg.name,
            mandatory: arg.mandatory,
            schema: arg.schema,
            found: false,
            valid: false,
            value: None,
        });
        ArgId {
            idx: self.slots.len() - 1,
            _type: PhantomData,
        }
    }

    /// Validate all arguments against a context. Succeed if all mandatory arguments
    /// are found and valid. Tokens left in context after validation are ignored.
    pub fn parse_and_validate(&mut self, ctx: &mut TokenContext) -> Result<(), Error> {
        for slot in self.slots.iter_mut() {
            match slot.schema.validate(ctx) {
                Outcome::Found(value) => {
                    slot.found = true;
                    slot.valid = true;
                    slot.value = Some(value);
                }
                Outcome::NotFound if slot.mandatory => {
                    return Err(Error::MissingArgument(slot.name));
                }
                Outcome::NotFound => {}
                Outcome::Invalid(text) if slot.mandatory || !slot.schema.is_positional() => {
                    slot.found = true;
                    return Err(Error::InvalidArgument(slot.name, text));
                }
                Outcome::Invalid(_) => {}
            }
        }

        if !ctx.is_empty() {
            mi_debug!(target: "mi", "unconsumed arguments ignored: {}", ctx.remainder());
        }

        Ok(())
    }

    /// Return decoded argument value, `None` if argument not found.
    pub fn get<T: ArgType>(&self, id: &ArgId<T>) -> Option<&T> {
        self.slots
            .get(id.idx)
            .and_then(|slot| slot.value.as_ref())
            .and_then(T::extract)
    }

    pub fn found<T>(&self, id: &ArgId<T>) -> bool {
        self.slots.get(id.idx).map(|s| s.found).unwrap_or(false)
    }

    pub fn is_valid<T>(&self, id: &ArgId<T>) -> bool {
        self.slots.get(id.idx).map(|s| s.valid).unwrap_or(false)
    }
}
