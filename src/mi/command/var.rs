use crate::engine::VarFormat;
use crate::error::Error;
use crate::mi::args::{
    Arg, ArgId, ArgSet, OptionValue, PrintValues, StringCaps, TokenContext, ValueType,
};
use crate::mi::command::{Context, MiCommand};
use crate::mi::record::{Results, Value};
use crate::muted_error;
use crate::session::{child_name, VarObjKind, VarObject};
use std::str::FromStr;

fn var_object(ctx: &Context, name: &str) -> Result<VarObject, Error> {
    ctx.session
        .var(name)
        .ok_or_else(|| Error::VarObjNotFound(name.to_string()))
}

/// Re-read value of a variable object, return updated object and true if it changed.
fn update(ctx: &Context, var: &VarObject) -> Result<(VarObject, bool), Error> {
    let mut var = var.clone();
    let changed = match var.kind {
        VarObjKind::ExpressionResult => {
            let resolved = ctx
                .engine
                .resolve_value(&var.expression, var.thread, var.frame)?;
            var.handle = resolved.handle;
            let info = ctx.engine.value_info(var.handle, var.format)?;
            var.refresh(info);
            true
        }
        VarObjKind::Plain => {
            if ctx.engine.value_changed(var.handle) {
                let info = ctx.engine.value_info(var.handle, var.format)?;
                var.refresh(info);
                true
            } else {
                false
            }
        }
    };
    ctx.session.add_var(var.clone());
    Ok((var, changed))
}

/// Update a variable object and its children listed earlier by `var-list-children`.
///
/// Changed objects are collected into `changes`, a changed parent is reported only if
/// none of its children are. Return true if anything in the tree changed.
fn update_tree(
    ctx: &Context,
    var: &VarObject,
    changes: &mut Vec<VarObject>,
) -> Result<bool, Error> {
    let (var, changed) = update(ctx, var)?;

    let mut children_changed = false;
    for index in 0..var.info.children {
        let Some(child) = muted_error!(ctx.engine.value_child(var.handle, index)) else {
            continue;
        };
        let Some(child) = ctx.session.var(&child_name(&var.name, &child.name, index)) else {
            continue;
        };
        if let Some(true) = muted_error!(update_tree(ctx, &child, changes)) {
            children_changed = true;
        }
    }

    if changed && !children_changed {
        changes.push(var);
    }
    Ok(changed || children_changed)
}

fn changelist(vars: &[VarObject], print: PrintValues) -> Results {
    Results::new().with(
        "changelist",
        Value::List(
            vars.iter()
                .map(|v| Value::Tuple(v.change_results(print.shows_value(v.info.children))))
                .collect(),
        ),
    )
}

/// `var-create [--thread N] [--frame N] {name|-} {frame-addr|*|@} expression`
pub struct VarCreate {
    args: ArgSet,
    thread: ArgId<OptionValue>,
    frame: ArgId<OptionValue>,
    name: ArgId<String>,
    frame_addr: ArgId<String>,
    expression: ArgId<String>,
    created: Option<VarObject>,
}

impl VarCreate {
    pub fn create() -> Box<dyn MiCommand> {
        let mut args = ArgSet::new();
        let thread = args.add(Arg::long("thread").takes(ValueType::Number, 1));
        let frame = args.add(Arg::long("frame").takes(ValueType::Number, 1));
        let name = args.add(Arg::string("name", StringCaps::BARE.quotes()));
        let frame_addr = args.add(Arg::string("frame-addr", StringCaps::BARE.numbers()));
        let expression = args.add(Arg::text("expression"));
        Box::new(Self {
            args,
            thread,
            frame,
            name,
            frame_addr,
            expression,
            created: None,
        })
    }
}

impl MiCommand for VarCreate {
    fn parse_args(&mut self, ctx: &mut TokenContext) -> Result<(), Error> {
        self.args.parse_and_validate(ctx)
    }

    fn execute(&mut self, ctx: &Context) -> Result<(), Error> {
        let name = self
            .args
            .get(&self.name)
            .ok_or(Error::MissingArgument("name"))?;
        let name = if name == "-" {
            ctx.session.next_var_name()
        } else {
            name.clone()
        };
        let expression = self
            .args
            .get(&self.expression)
            .cloned()
            .ok_or(Error::MissingArgument("expression"))?;
        let thread = match self.args.get(&self.thread).and_then(|o| o.number(0)) {
            Some(n) => Some(
                u64::try_from(n).map_err(|_| Error::InvalidArgument("thread", n.to_string()))?,
            ),
            None => None,
        };
        let frame = match self.args.get(&self.frame).and_then(|o| o.number(0)) {
            Some(n) => Some(
                u32::try_from(n).map_err(|_| Error::InvalidArgument("frame", n.to_string()))?,
            ),
            None => None,
        };
        if let Some(addr) = self.args.get(&self.frame_addr) {
            if addr != "*" && addr != "@" {
                crate::mi_debug!(target: "mi", "frame address {addr} ignored, selected frame used");
            }
        }

        let resolved = ctx.engine.resolve_value(&expression, thread, frame)?;
        let format = ctx.session.default_var_format();
        let info = ctx.engine.value_info(resolved.handle, format)?;

        let var = VarObject {
            name,
            expression,
            handle: resolved.handle,
            kind: if resolved.evaluated {
                VarObjKind::ExpressionResult
            } else {
                VarObjKind::Plain
            },
            format,
            thread,
            frame,
            parent: None,
            info,
        };
        ctx.session.add_var(var.clone());
        self.created = Some(var);
        Ok(())
    }

    fn acknowledge(&mut self, _: &Context) -> Result<Results, Error> {
        let var = self
            .created
            .as_ref()
            .ok_or(Error::MissingArgument("name"))?;
        Ok(var.create_results())
    }
}

/// `var-delete name`
pub struct VarDelete {
    args: ArgSet,
    name: ArgId<String>,
}

impl VarDelete {
    pub fn create() -> Box<dyn MiCommand> {
        let mut args = ArgSet::new();
        let name = args.add(Arg::string("name", StringCaps::BARE.quotes()));
        Box::new(Self { args, name })
    }
}

impl MiCommand for VarDelete {
    fn parse_args(&mut self, ctx: &mut TokenContext) -> Result<(), Error> {
        self.args.parse_and_validate(ctx)
    }

    fn execute(&mut self, ctx: &Context) -> Result<(), Error> {
        let name = self
            .args
            .get(&self.name)
            .ok_or(Error::MissingArgument("name"))?;
        if ctx.session.delete_var(name).is_none() {
            crate::mi_debug!(target: "mi", "variable object {name} not found, nothing to delete");
        }
        Ok(())
    }

    fn acknowledge(&mut self, _: &Context) -> Result<Results, Error> {
        Ok(Results::new())
    }
}

/// `var-update [print-values] {name|*}`
pub struct VarUpdate {
    args: ArgSet,
    print_values: ArgId<PrintValues>,
    name: ArgId<String>,
    changed: Vec<VarObject>,
}

impl VarUpdate {
    pub fn create() -> Box<dyn MiCommand> {
        let mut args = ArgSet::new();
        let print_values = args.add(Arg::print_values("print-values"));
        let name = args.add(Arg::string("name", StringCaps::BARE.quotes()));
        Box::new(Self {
            args,
            print_values,
            name,
            changed: vec![],
        })
    }
}

impl MiCommand for VarUpdate {
    fn parse_args(&mut self, ctx: &mut TokenContext) -> Result<(), Error> {
        self.args.parse_and_validate(ctx)
    }

    fn execute(&mut self, ctx: &Context) -> Result<(), Error> {
        let name = self
            .args
            .get(&self.name)
            .ok_or(Error::MissingArgument("name"))?;

        if name == "*" {
            for name in ctx.session.var_names() {
                // children are walked from their roots
                let Some(var) = ctx.session.var(&name).filter(|v| v.parent.is_none()) else {
                    continue;
                };
                // out of scope objects just stay unchanged
                muted_error!(update_tree(ctx, &var, &mut self.changed));
            }
            return Ok(());
        }

        let var = var_object(ctx, name)?;
        update_tree(ctx, &var, &mut self.changed)?;
        Ok(())
    }

    fn acknowledge(&mut self, _: &Context) -> Result<Results, Error> {
        let print = self
            .args
            .get(&self.print_values)
            .copied()
            .unwrap_or(PrintValues::NoValues);
        Ok(changelist(&self.changed, print))
    }
}

/// `var-assign name expression`
pub struct VarAssign {
    args: ArgSet,
    name: ArgId<String>,
    expression: ArgId<String>,
    assigned: Option<VarObject>,
}

impl VarAssign {
    pub fn create() -> Box<dyn MiCommand> {
        let mut args = ArgSet::new();
        let name = args.add(Arg::string("name", StringCaps::BARE.quotes()));
        let expression = args.add(Arg::text("expression"));
        Box::new(Self {
            args,
            name,
            expression,
            assigned: None,
        })
    }
}

impl MiCommand for VarAssign {
    fn parse_args(&mut self, ctx: &mut TokenContext) -> Result<(), Error> {
        self.args.parse_and_validate(ctx)
    }

    fn execute(&mut self, ctx: &Context) -> Result<(), Error> {
        let name = self
            .args
            .get(&self.name)
            .ok_or(Error::MissingArgument("name"))?;
        let expression = self
            .args
            .get(&self.expression)
            .ok_or(Error::MissingArgument("expression"))?;

        let mut var = var_object(ctx, name)?;
        ctx.engine.assign_value(var.handle, expression)?;
        let info = ctx.engine.value_info(var.handle, var.format)?;
        var.refresh(info);
        ctx.session.add_var(var.clone());
        self.assigned = Some(var);
        Ok(())
    }

    fn acknowledge(&mut self, _: &Context) -> Result<Results, Error> {
        let var = self
            .assigned
            .as_ref()
            .ok_or(Error::MissingArgument("name"))?;
        Ok(Results::new().with("value", var.info.value.as_str()))
    }
}

/// `var-set-format name format`
pub struct VarSetFormat {
    args: ArgSet,
    name: ArgId<String>,
    format: ArgId<String>,
    updated: Option<VarObject>,
}

impl VarSetFormat {
    pub fn create() -> Box<dyn MiCommand> {
        let mut args = ArgSet::new();
        let name = args.add(Arg::string("name", StringCaps::BARE.quotes()));
        let format = args.add(Arg::string("format", StringCaps::BARE));
        Box::new(Self {
            args,
            name,
            format,
            updated: None,
        })
    }
}

impl MiCommand for VarSetFormat {
    fn parse_args(&mut self, ctx: &mut TokenContext) -> Result<(), Error> {
        self.args.parse_and_validate(ctx)
    }

    fn execute(&mut self, ctx: &Context) -> Result<(), Error> {
        let name = self
            .args
            .get(&self.name)
            .ok_or(Error::MissingArgument("name"))?;
        let format = self
            .args
            .get(&self.format)
            .ok_or(Error::MissingArgument("format"))?;
        let format =
            VarFormat::from_str(format).map_err(|_| Error::UnknownVarFormat(format.clone()))?;

        let mut var = var_object(ctx, name)?;
        var.format = format;
        let info = ctx.engine.value_info(var.handle, format)?;
        var.refresh(info);
        ctx.session.add_var(var.clone());
        self.updated = Some(var);
        Ok(())
    }

    fn acknowledge(&mut self, _: &Context) -> Result<Results, Error> {
        let var = self
            .updated
            .as_ref()
            .ok_or(Error::MissingArgument("name"))?;
        Ok(changelist(std::slice::from_ref(var), PrintValues::AllValues))
    }
}

/// `var-list-children [print-values] name [from to]`
pub struct VarListChildren {
    args: ArgSet,
    print_values: ArgId<PrintValues>,
    name: ArgId<String>,
    from: ArgId<i64>,
    to: ArgId<i64>,
    children: Vec<VarObject>,
    has_more: bool,
}

impl VarListChildren {
    pub fn create() -> Box<dyn MiCommand> {
        let mut args = ArgSet::new();
        let print_values = args.add(Arg::print_values("print-values"));
        let name = args.add(Arg::string("name", StringCaps::BARE.quotes()));
        let from = args.add(Arg::number("from").optional());
        let to = args.add(Arg::number("to").optional());
        Box::new(Self {
            args,
            print_values,
            name,
            from,
            to,
            children: vec![],
            has_more: false,
        })
    }
}

impl MiCommand for VarListChildren {
    fn parse_args(&mut self, ctx: &mut TokenContext) -> Result<(), Error> {
        self.args.parse_and_validate(ctx)?;
        if self.args.found(&self.from) != self.args.found(&self.to) {
            return Err(Error::ArgumentPair("from", "to"));
        }
        Ok(())
    }

    fn execute(&mut self, ctx: &Context) -> Result<(), Error> {
        let name = self
            .args
            .get(&self.name)
            .ok_or(Error::MissingArgument("name"))?;
        let var = var_object(ctx, name)?;
        let count = var.info.children;

        let clamp = |n: i64| n.clamp(0, count as i64) as u32;
        let (from, to) = match (self.args.get(&self.from), self.args.get(&self.to)) {
            (Some(from), Some(to)) => (clamp(*from), clamp(*to)),
            _ => (0, count),
        };

        for index in from..to {
            let child = ctx.engine.value_child(var.handle, index)?;
            let info = ctx.engine.value_info(child.handle, var.format)?;
            let name = child_name(&var.name, &child.name, index);
            let expression = if child.name.is_empty() {
                index.to_string()
            } else {
                child.name
            };
            let child = VarObject {
                name,
                expression,
                handle: child.handle,
                kind: VarObjKind::Plain,
                format: var.format,
                thread: var.thread,
                frame: var.frame,
                parent: Some(var.name.clone()),
                info,
            };
            ctx.session.add_var(child.clone());
            self.children.push(child);
        }
        self.has_more = to < count;
        Ok(())
    }

    fn acknowledge(&mut self, _: &Context) -> Result<Results, Error> {
        let print = self
            .args
            .get(&self.print_values)
            .copied()
            .unwrap_or(PrintValues::NoValues);

        let mut results = Results::new().with("numchild", self.children.len().to_string());
        if !self.children.is_empty() {
            let children = self
                .children
                .iter()
                .fold(Results::new(), |list, child| {
                    list.with("child", child.child_results(print.shows_value(child.info.children)))
                });
            results.push("children", Value::ResultList(children));
        }
        results.push("has_more", if self.has_more { "1" } else { "0" });
        Ok(results)
    }
}

/// `var-evaluate-expression [-f format] name`
pub struct VarEvaluateExpression {
    args: ArgSet,
    format: ArgId<OptionValue>,
    name: ArgId<String>,
    value: Option<String>,
}

impl VarEvaluateExpression {
    pub fn create() -> Box<dyn MiCommand> {
        let mut args = ArgSet::new();
        let format = args.add(Arg::short("f").takes(ValueType::String, 1));
        let name = args.add(Arg::string("name", StringCaps::BARE.quotes()));
        Box::new(Self {
            args,
            format,
            name,
            value: None,
        })
    }
}

impl MiCommand for VarEvaluateExpression {
    fn parse_args(&mut self, ctx: &mut TokenContext) -> Result<(), Error> {
        self.args.parse_and_validate(ctx)
    }

    fn execute(&mut self, ctx: &Context) -> Result<(), Error> {
        let name = self
            .args
            .get(&self.name)
            .ok_or(Error::MissingArgument("name"))?;
        let mut var = var_object(ctx, name)?;

        // `-f` formats this answer only, the object keeps its own format
        if let Some(format) = self.args.get(&self.format).and_then(|o| o.string(0)) {
            let format = VarFormat::from_str(format)
                .map_err(|_| Error::UnknownVarFormat(format.to_string()))?;
            self.value = Some(ctx.engine.value_info(var.handle, format)?.value);
            return Ok(());
        }

        let info = ctx.engine.value_info(var.handle, var.format)?;
        var.refresh(info);
        ctx.session.add_var(var.clone());
        self.value = Some(var.info.value);
        Ok(())
    }

    fn acknowledge(&mut self, _: &Context) -> Result<Results, Error> {
        let value = self.value.as_deref().ok_or(Error::MissingArgument("name"))?;
        Ok(Results::new().with("value", value))
    }
}

/// Expression that reaches a variable object from the scope of its root, members are joined
/// with `.`, unnamed members are indexed.
fn path_expression(ctx: &Context, var: &VarObject) -> Result<String, Error> {
    let Some(parent) = var.parent.as_deref() else {
        return Ok(var.expression.clone());
    };
    let parent = var_object(ctx, parent)?;
    let path = path_expression(ctx, &parent)?;
    if var.name.ends_with(&format!(".${}", var.expression)) {
        Ok(format!("{path}[{}]", var.expression))
    } else {
        Ok(format!("{path}.{}", var.expression))
    }
}

/// `var-info-path-expression name`
pub struct VarInfoPathExpression {
    args: ArgSet,
    name: ArgId<String>,
    path: Option<String>,
}

impl VarInfoPathExpression {
    pub fn create() -> Box<dyn MiCommand> {
        let mut args = ArgSet::new();
        let name = args.add(Arg::string("name", StringCaps::BARE.quotes()));
        Box::new(Self {
            args,
            name,
            path: None,
        })
    }
}

impl MiCommand for VarInfoPathExpression {
    fn parse_args(&mut self, ctx: &mut TokenContext) -> Result<(), Error> {
        self.args.parse_and_validate(ctx)
    }

    fn execute(&mut self, ctx: &Context) -> Result<(), Error> {
        let name = self
            .args
            .get(&self.name)
            .ok_or(Error::MissingArgument("name"))?;
        let var = var_object(ctx, name)?;
        self.path = Some(path_expression(ctx, &var)?);
        Ok(())
    }

    fn acknowledge(&mut self, _: &Context) -> Result<Results, Error> {
        let path = self.path.as_deref().ok_or(Error::MissingArgument("name"))?;
        Ok(Results::new().with("path_expr", path))
    }
}

/// `var-show-attributes name`, every object is reported editable.
pub struct VarShowAttributes {
    args: ArgSet,
    name: ArgId<String>,
}

impl VarShowAttributes {
    pub fn create() -> Box<dyn MiCommand> {
        let mut args = ArgSet::new();
        let name = args.add(Arg::string("name", StringCaps::BARE.quotes()));
        Box::new(Self { args, name })
    }
}

impl MiCommand for VarShowAttributes {
    fn parse_args(&mut self, ctx: &mut TokenContext) -> Result<(), Error> {
        self.args.parse_and_validate(ctx)
    }

    fn execute(&mut self, ctx: &Context) -> Result<(), Error> {
        let name = self
            .args
            .get(&self.name)
            .ok_or(Error::MissingArgument("name"))?;
        var_object(ctx, name)?;
        Ok(())
    }

    fn acknowledge(&mut self, _: &Context) -> Result<Results, Error> {
        Ok(Results::new().with("status", "editable"))
    }
}
