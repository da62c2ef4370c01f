use crate::config::Config;
use crate::engine::Engine;
use crate::error::Error;
use crate::event::EventTranslator;
use crate::mi::command::{CommandFactory, Context};
use crate::mi::output::MiOutput;
use crate::mi::parser::{command_token, parse_command_line};
use crate::mi::record::{ResultClass, ResultRecord};
use crate::session::Session;
use crate::{mi_info, mi_warn};
use anyhow::Context as _;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::thread::JoinHandle;

/// MI front end of an engine: command loop plus event translation.
pub struct Adapter {
    engine: Arc<dyn Engine>,
    session: Arc<Session>,
    output: Arc<MiOutput>,
    commands: CommandFactory,
}

impl Adapter {
    /// Create adapter.
    ///
    /// # Arguments
    ///
    /// * `engine`: debugging engine
    /// * `config`: adapter configuration
    /// * `sink`: destination of protocol records
    pub fn new(engine: Arc<dyn Engine>, config: &Config, sink: Box<dyn Write + Send>) -> Self {
        Self {
            engine,
            session: Arc::new(Session::new(config)),
            output: Arc::new(MiOutput::new(sink, config.prompt)),
            commands: CommandFactory::default(),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn output(&self) -> &Arc<MiOutput> {
        &self.output
    }

    /// Command registry, may be used to add verbs.
    pub fn commands_mut(&mut self) -> &mut CommandFactory {
        &mut self.commands
    }

    /// Create an event translator bound to this adapter session and output.
    pub fn event_translator(&self) -> EventTranslator {
        EventTranslator::new(
            self.engine.clone(),
            self.session.clone(),
            self.output.clone(),
        )
    }

    /// Start event translation in a separate thread. Thread finishes when the engine closes
    /// its notification stream.
    pub fn spawn_events(&self) -> anyhow::Result<JoinHandle<()>> {
        let translator = self.event_translator();
        std::thread::Builder::new()
            .name("mi-events".to_string())
            .spawn(move || translator.run())
            .context("spawn event thread")
    }

    /// Process one protocol line, write its result record.
    /// Return written record, `None` for blank lines.
    pub fn handle_line(&self, line: &str) -> Result<Option<ResultRecord>, Error> {
        let record = match parse_command_line(line) {
            Ok(None) => return Ok(None),
            Ok(Some(command)) => {
                let ctx = Context {
                    engine: self.engine.as_ref(),
                    session: &self.session,
                };
                self.commands.run(command, &ctx)
            }
            Err(e) => {
                mi_warn!(target: "mi", "{e}");
                ResultRecord::error(command_token(line), e.to_string())
            }
        };

        self.output.write_result(record.clone())?;
        Ok(Some(record))
    }

    /// Serve commands until end of input or `gdb-exit`.
    pub fn run<R: BufRead>(&self, reader: R) -> anyhow::Result<()> {
        for line in reader.lines() {
            let line = line.context("read command line")?;
            match self.handle_line(&line) {
                Ok(Some(record)) if record.class == ResultClass::Exit => {
                    mi_info!(target: "mi", "exit requested");
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) if e.is_fatal() => {
                    return Err(e).context("write result record");
                }
                Err(e) => {
                    mi_warn!(target: "mi", "{e:#}");
                }
            }
        }
        mi_info!(target: "mi", "end of input");
        Ok(())
    }
}
