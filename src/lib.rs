//! GDB/MI compatible front end for a debugging engine.
//!
//! [`adapter::Adapter`] reads protocol lines, runs commands against an [`engine::Engine`] and
//! writes result records, while [`event::EventTranslator`] turns engine notifications into
//! out-of-band records. Both share a [`session::Session`] with stable breakpoint numbering.

pub mod adapter;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod log;
pub mod mi;
pub mod session;

pub use adapter::Adapter;
pub use config::Config;
pub use error::Error;
