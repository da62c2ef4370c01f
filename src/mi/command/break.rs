use crate::engine::StoppointHandle;
use crate::error::Error;
use crate::mi::args::{
    Arg, ArgId, ArgSet, ListValue, OptionValue, StringCaps, TokenContext, ValueType,
};
use crate::mi::command::{Context, MiCommand};
use crate::mi::parser::parse_location;
use crate::mi::record::Results;
use crate::session::{StoppointInfo, WatchInfo};
use crate::weak_error;

/// Resolve protocol id into a live engine handle.
fn resolve(ctx: &Context, arg: &'static str, id: i64) -> Result<(u32, StoppointHandle), Error> {
    let id = u32::try_from(id).map_err(|_| Error::InvalidArgument(arg, id.to_string()))?;
    let info = ctx
        .session
        .stoppoint(id)
        .ok_or(Error::StoppointNotFound(id))?;
    let handle = ctx
        .engine
        .find_stoppoint(info.native_id, info.kind)
        .ok_or(Error::InvalidHandle(id))?;
    Ok((id, handle))
}

fn to_u32(arg: &'static str, n: i64) -> Result<u32, Error> {
    u32::try_from(n).map_err(|_| Error::InvalidArgument(arg, n.to_string()))
}

/// Allocate protocol id for a just created engine stoppoint, engine stoppoint is deleted
/// if allocation fails.
fn allocate_id(ctx: &Context, handle: StoppointHandle) -> Result<u32, Error> {
    ctx.session.ids().get_or_create(handle).map_err(|e| {
        weak_error!(
            ctx.engine.delete_stoppoint(handle),
            "delete stoppoint without protocol id:"
        );
        e
    })
}

/// `break-insert [-t] [-d] [-f location] [-c condition] [-i count] [-p thread]
/// [--thread-group group] [location]`
pub struct BreakInsert {
    args: ArgSet,
    temporary: ArgId<OptionValue>,
    disabled: ArgId<OptionValue>,
    pending: ArgId<OptionValue>,
    condition: ArgId<OptionValue>,
    ignore: ArgId<OptionValue>,
    thread: ArgId<OptionValue>,
    thread_group: ArgId<OptionValue>,
    location: ArgId<String>,
    created: Option<StoppointInfo>,
}

impl BreakInsert {
    pub fn create() -> Box<dyn MiCommand> {
        let mut args = ArgSet::new();
        let temporary = args.add(Arg::short("t"));
        let disabled = args.add(Arg::short("d"));
        let pending = args.add(Arg::short("f").takes(ValueType::StringQuotedNumberPath, 1));
        let condition = args.add(Arg::short("c").takes(ValueType::StringQuoted, 1));
        let ignore = args.add(
            Arg::short("i")
                .alias("ignore-count")
                .takes(ValueType::Number, 1),
        );
        let thread = args.add(Arg::short("p").takes(ValueType::Number, 1));
        let thread_group = args.add(Arg::long("thread-group").takes(ValueType::ThreadGroup, 1));
        let location = args.add(
            Arg::string("location", StringCaps::BARE.quotes().numbers().paths()).optional(),
        );

        Box::new(Self {
            args,
            temporary,
            disabled,
            pending,
            condition,
            ignore,
            thread,
            thread_group,
            location,
            created: None,
        })
    }
}

impl MiCommand for BreakInsert {
    fn parse_args(&mut self, ctx: &mut TokenContext) -> Result<(), Error> {
        self.args.parse_and_validate(ctx)?;
        if !self.args.found(&self.location) && !self.args.found(&self.pending) {
            return Err(Error::MissingArgument("location"));
        }
        Ok(())
    }

    fn execute(&mut self, ctx: &Context) -> Result<(), Error> {
        let pending = self.args.found(&self.pending);
        let original = self
            .args
            .get(&self.location)
            .cloned()
            .or_else(|| {
                self.args
                    .get(&self.pending)
                    .and_then(|o| o.string(0))
                    .map(ToString::to_string)
            })
            .ok_or(Error::MissingArgument("location"))?;
        let location = parse_location(&original)?;

        let condition = self
            .args
            .get(&self.condition)
            .and_then(|o| o.string(0))
            .map(ToString::to_string);
        let ignore_count = match self.args.get(&self.ignore).and_then(|o| o.number(0)) {
            Some(n) => to_u32("i", n)?,
            None => 0,
        };
        let thread = match self.args.get(&self.thread).and_then(|o| o.number(0)) {
            Some(n) => Some(
                u64::try_from(n).map_err(|_| Error::InvalidArgument("p", n.to_string()))?,
            ),
            None => None,
        };
        let enabled = !self.args.found(&self.disabled);
        let one_shot = self.args.found(&self.temporary);

        let handle = ctx.engine.create_breakpoint(&location)?;
        let metadata = ctx.engine.location_metadata(handle)?;
        if !pending && metadata.locations == 0 {
            weak_error!(
                ctx.engine.delete_stoppoint(handle),
                "delete unresolved breakpoint:"
            );
            return Err(Error::LocationNotFound(original));
        }

        ctx.engine.set_enabled(handle, enabled)?;
        if let Some(cond) = condition.as_deref() {
            ctx.engine.set_condition(handle, Some(cond))?;
        }
        if ignore_count != 0 {
            ctx.engine.set_ignore_count(handle, ignore_count)?;
        }
        if thread.is_some() {
            ctx.engine.set_thread(handle, thread)?;
        }
        ctx.engine.set_one_shot(handle, one_shot)?;

        let id = allocate_id(ctx, handle)?;
        let state = ctx.engine.stoppoint_state(handle)?;

        let thread_group = match self.args.get(&self.thread_group).and_then(|o| o.thread_group(0)) {
            Some(group) => format!("i{group}"),
            None => ctx.session.thread_group().to_string(),
        };
        let info = StoppointInfo {
            one_shot,
            enabled: state.enabled,
            pending: pending && metadata.locations == 0,
            ignore_count,
            condition,
            thread,
            hit_count: state.hit_count,
            original_location: original,
            location: metadata,
            ..StoppointInfo::new(handle, id, &thread_group)
        };
        ctx.session.record_stoppoint(info.clone());
        self.created = Some(info);
        Ok(())
    }

    fn acknowledge(&mut self, _: &Context) -> Result<Results, Error> {
        let info = self
            .created
            .as_ref()
            .ok_or(Error::MissingArgument("location"))?;
        Ok(Results::new().with("bkpt", info.to_tuple()))
    }
}

/// Declare a mandatory list of stoppoint numbers.
fn number_list(args: &mut ArgSet) -> ArgId<ListValue> {
    args.add(Arg::list("breakpoint", ValueType::Number))
}

/// Resolve all listed stoppoints before touching any of them.
fn resolve_list(
    ctx: &Context,
    args: &ArgSet,
    list: &ArgId<ListValue>,
) -> Result<Vec<(u32, StoppointHandle)>, Error> {
    let numbers = args
        .get(list)
        .map(ListValue::numbers)
        .ok_or(Error::MissingArgument("breakpoint"))?;
    numbers
        .into_iter()
        .map(|n| resolve(ctx, "breakpoint", n))
        .collect()
}

/// `break-delete N...`
pub struct BreakDelete {
    args: ArgSet,
    numbers: ArgId<ListValue>,
}

impl BreakDelete {
    pub fn create() -> Box<dyn MiCommand> {
        let mut args = ArgSet::new();
        let numbers = number_list(&mut args);
        Box::new(Self { args, numbers })
    }
}

impl MiCommand for BreakDelete {
    fn parse_args(&mut self, ctx: &mut TokenContext) -> Result<(), Error> {
        self.args.parse_and_validate(ctx)
    }

    fn execute(&mut self, ctx: &Context) -> Result<(), Error> {
        for (_, handle) in resolve_list(ctx, &self.args, &self.numbers)? {
            ctx.engine.delete_stoppoint(handle)?;
            ctx.session.forget_stoppoint(handle);
        }
        Ok(())
    }

    fn acknowledge(&mut self, _: &Context) -> Result<Results, Error> {
        Ok(Results::new())
    }
}

/// Shared part of `break-enable` and `break-disable`.
struct Toggle {
    args: ArgSet,
    numbers: ArgId<ListValue>,
    enable: bool,
}

impl Toggle {
    fn new(enable: bool) -> Self {
        let mut args = ArgSet::new();
        let numbers = number_list(&mut args);
        Self {
            args,
            numbers,
            enable,
        }
    }

    fn execute(&self, ctx: &Context) -> Result<(), Error> {
        for (id, handle) in resolve_list(ctx, &self.args, &self.numbers)? {
            ctx.engine.set_enabled(handle, self.enable)?;
            ctx.session.update_stoppoint(id, |info| info.enabled = self.enable);
        }
        Ok(())
    }
}

/// `break-enable N...`
pub struct BreakEnable(Toggle);

impl BreakEnable {
    pub fn create() -> Box<dyn MiCommand> {
        Box::new(Self(Toggle::new(true)))
    }
}

impl MiCommand for BreakEnable {
    fn parse_args(&mut self, ctx: &mut TokenContext) -> Result<(), Error> {
        self.0.args.parse_and_validate(ctx)
    }

    fn execute(&mut self, ctx: &Context) -> Result<(), Error> {
        self.0.execute(ctx)
    }

    fn acknowledge(&mut self, _: &Context) -> Result<Results, Error> {
        Ok(Results::new())
    }
}

/// `break-disable N...`
pub struct BreakDisable(Toggle);

impl BreakDisable {
    pub fn create() -> Box<dyn MiCommand> {
        Box::new(Self(Toggle::new(false)))
    }
}

impl MiCommand for BreakDisable {
    fn parse_args(&mut self, ctx: &mut TokenContext) -> Result<(), Error> {
        self.0.args.parse_and_validate(ctx)
    }

    fn execute(&mut self, ctx: &Context) -> Result<(), Error> {
        self.0.execute(ctx)
    }

    fn acknowledge(&mut self, _: &Context) -> Result<Results, Error> {
        Ok(Results::new())
    }
}

/// `break-after N count`
pub struct BreakAfter {
    args: ArgSet,
    number: ArgId<i64>,
    count: ArgId<i64>,
}

impl BreakAfter {
    pub fn create() -> Box<dyn MiCommand> {
        let mut args = ArgSet::new();
        let number = args.add(Arg::number("number"));
        let count = args.add(Arg::number("count"));
        Box::new(Self {
            args,
            number,
            count,
        })
    }
}

impl MiCommand for BreakAfter {
    fn parse_args(&mut self, ctx: &mut TokenContext) -> Result<(), Error> {
        self.args.parse_and_validate(ctx)
    }

    fn execute(&mut self, ctx: &Context) -> Result<(), Error> {
        let number = *self
            .args
            .get(&self.number)
            .ok_or(Error::MissingArgument("number"))?;
        let count = *self
            .args
            .get(&self.count)
            .ok_or(Error::MissingArgument("count"))?;
        let count = to_u32("count", count)?;

        let (id, handle) = resolve(ctx, "number", number)?;
        ctx.engine.set_ignore_count(handle, count)?;
        ctx.session
            .update_stoppoint(id, |info| info.ignore_count = count);
        Ok(())
    }

    fn acknowledge(&mut self, _: &Context) -> Result<Results, Error> {
        Ok(Results::new())
    }
}

/// `break-condition N [expression]`, a missing expression clears the condition.
pub struct BreakCondition {
    args: ArgSet,
    number: ArgId<i64>,
    expression: ArgId<String>,
}

impl BreakCondition {
    fn new() -> Self {
        let mut args = ArgSet::new();
        let number = args.add(Arg::number("number"));
        let expression = args.add(Arg::text("expression").optional());
        Self {
            args,
            number,
            expression,
        }
    }

    pub fn create() -> Box<dyn MiCommand> {
        Box::new(Self::new())
    }
}

impl MiCommand for BreakCondition {
    fn parse_args(&mut self, ctx: &mut TokenContext) -> Result<(), Error> {
        self.args.parse_and_validate(ctx)?;
        // a quoted expression must be the last token
        if !ctx.is_empty() {
            return Err(Error::InvalidArgument("expression", ctx.remainder()));
        }
        Ok(())
    }

    fn execute(&mut self, ctx: &Context) -> Result<(), Error> {
        let number = *self
            .args
            .get(&self.number)
            .ok_or(Error::MissingArgument("number"))?;
        let condition = self
            .args
            .get(&self.expression)
            .filter(|cond| !cond.trim().is_empty())
            .cloned();

        let (id, handle) = resolve(ctx, "number", number)?;
        ctx.engine.set_condition(handle, condition.as_deref())?;
        ctx.session
            .update_stoppoint(id, |info| info.condition = condition);
        Ok(())
    }

    fn acknowledge(&mut self, _: &Context) -> Result<Results, Error> {
        Ok(Results::new())
    }
}

/// `break-watch [-a|-r] expression`
pub struct BreakWatch {
    args: ArgSet,
    access: ArgId<OptionValue>,
    read: ArgId<OptionValue>,
    expression: ArgId<String>,
    created: Option<StoppointInfo>,
}

impl BreakWatch {
    pub fn create() -> Box<dyn MiCommand> {
        let mut args = ArgSet::new();
        let access = args.add(Arg::short("a"));
        let read = args.add(Arg::short("r"));
        let expression = args.add(Arg::text("expression"));
        Box::new(Self {
            args,
            access,
            read,
            expression,
            created: None,
        })
    }
}

impl MiCommand for BreakWatch {
    fn parse_args(&mut self, ctx: &mut TokenContext) -> Result<(), Error> {
        self.args.parse_and_validate(ctx)
    }

    fn execute(&mut self, ctx: &Context) -> Result<(), Error> {
        let expression = self
            .args
            .get(&self.expression)
            .cloned()
            .ok_or(Error::MissingArgument("expression"))?;
        let access = self.args.found(&self.access);
        let read_only = self.args.found(&self.read);
        let watch = WatchInfo {
            expression,
            read: access || read_only,
            write: !read_only,
        };

        let target = ctx
            .engine
            .watch_target(&watch.expression)
            .map_err(|_| Error::Evaluation(watch.expression.clone()))?;
        let handle =
            ctx.engine
                .create_watchpoint(target.address, target.size, watch.read, watch.write)?;
        let id = allocate_id(ctx, handle)?;
        let state = ctx.engine.stoppoint_state(handle)?;

        let info = StoppointInfo {
            enabled: state.enabled,
            hit_count: state.hit_count,
            original_location: watch.expression.clone(),
            watch: Some(watch),
            ..StoppointInfo::new(handle, id, ctx.session.thread_group())
        };
        ctx.session.record_stoppoint(info.clone());
        self.created = Some(info);
        Ok(())
    }

    fn acknowledge(&mut self, _: &Context) -> Result<Results, Error> {
        let info = self
            .created
            .as_ref()
            .ok_or(Error::MissingArgument("expression"))?;
        let key = info
            .watch
            .as_ref()
            .map(WatchInfo::result_key)
            .unwrap_or("wpt");
        Ok(Results::new().with(key, info.watch_tuple()))
    }
}
