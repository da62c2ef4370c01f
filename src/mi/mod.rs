//! Machine interface protocol: argument grammar, line parser, records and commands.

pub mod args;
pub mod command;
pub mod output;
pub mod parser;
pub mod record;
