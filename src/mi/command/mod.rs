//! MI commands.
//!
//! Every protocol verb is a [`MiCommand`] built fresh for each invocation by a factory function
//! registered in [`CommandFactory`]. Invocation runs three phases exactly once and in order:
//! argument parsing, execution and acknowledgement. Failure in any phase turns into an error
//! record, so each command line produces exactly one result record.

pub mod r#break;
pub mod var;

use crate::engine::Engine;
use crate::error::Error;
use crate::mi::args::TokenContext;
use crate::mi::parser::CommandLine;
use crate::mi::record::{ResultClass, ResultRecord, Results};
use crate::mi_warn;
use crate::session::Session;
use std::collections::HashMap;

/// Collaborators available to a command.
pub struct Context<'a> {
    pub engine: &'a dyn Engine,
    pub session: &'a Session,
}

pub trait MiCommand {
    /// Validate command arguments.
    fn parse_args(&mut self, ctx: &mut TokenContext) -> Result<(), Error>;

    /// Run engine operations and update session state.
    fn execute(&mut self, ctx: &Context) -> Result<(), Error>;

    /// Build result payload, called after successful execution.
    fn acknowledge(&mut self, ctx: &Context) -> Result<Results, Error>;

    /// Class of a successful result record.
    fn result_class(&self) -> ResultClass {
        ResultClass::Done
    }
}

type Constructor = fn() -> Box<dyn MiCommand>;

/// Registry of command constructors keyed by a protocol verb.
pub struct CommandFactory {
    commands: HashMap<&'static str, Constructor>,
}

impl Default for CommandFactory {
    fn default() -> Self {
        let mut factory = Self {
            commands: HashMap::new(),
        };
        factory.register("break-insert", r#break::BreakInsert::create);
        factory.register("break-delete", r#break::BreakDelete::create);
        factory.register("break-disable", r#break::BreakDisable::create);
        factory.register("break-enable", r#break::BreakEnable::create);
        factory.register("break-after", r#break::BreakAfter::create);
        factory.register("break-condition", r#break::BreakCondition::create);
        factory.register("break-watch", r#break::BreakWatch::create);
        factory.register("var-create", var::VarCreate::create);
        factory.register("var-delete", var::VarDelete::create);
        factory.register("var-update", var::VarUpdate::create);
        factory.register("var-assign", var::VarAssign::create);
        factory.register("var-set-format", var::VarSetFormat::create);
        factory.register("var-list-children", var::VarListChildren::create);
        factory.register("var-evaluate-expression", var::VarEvaluateExpression::create);
        factory.register("var-info-path-expression", var::VarInfoPathExpression::create);
        factory.register("var-show-attributes", var::VarShowAttributes::create);
        factory.register("gdb-exit", GdbExit::create);
        factory
    }
}

impl CommandFactory {
    /// Register (or replace) a command constructor.
    pub fn register(&mut self, verb: &'static str, constructor: Constructor) {
        self.commands.insert(verb, constructor);
    }

    /// Create a fresh command object.
    pub fn create(&self, verb: &str) -> Option<Box<dyn MiCommand>> {
        self.commands.get(verb).map(|constructor| constructor())
    }

    pub fn contains(&self, verb: &str) -> bool {
        self.commands.contains_key(verb)
    }

    /// Run a command line, return its result record.
    pub fn run(&self, line: CommandLine, ctx: &Context) -> ResultRecord {
        let CommandLine { token, verb, args } = line;
        let Some(mut cmd) = self.create(&verb) else {
            let err = Error::UnknownCommand(verb);
            mi_warn!(target: "mi", "{err}");
            return ResultRecord::error(token, err.to_string());
        };

        let outcome = cmd
            .parse_args(&mut TokenContext::new(&args))
            .and_then(|_| cmd.execute(ctx))
            .and_then(|_| cmd.acknowledge(ctx));

        match outcome {
            Ok(results) => ResultRecord::new(token, cmd.result_class(), results),
            Err(e) => {
                let err = e.in_command(verb);
                mi_warn!(target: "mi", "{err:#}");
                ResultRecord::error(token, err.to_string())
            }
        }
    }
}

/// `gdb-exit`: finish the session.
pub struct GdbExit;

impl GdbExit {
    pub fn create() -> Box<dyn MiCommand> {
        Box::new(GdbExit)
    }
}

impl MiCommand for GdbExit {
    fn parse_args(&mut self, _: &mut TokenContext) -> Result<(), Error> {
        Ok(())
    }

    fn execute(&mut self, _: &Context) -> Result<(), Error> {
        Ok(())
    }

    fn acknowledge(&mut self, _: &Context) -> Result<Results, Error> {
        Ok(Results::new())
    }

    fn result_class(&self) -> ResultClass {
        ResultClass::Exit
    }
}
