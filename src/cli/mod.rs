//! Command Interface Module
//!
//! Text shell over the cache engine.
//!
//! # Commands
//! - `SET`, `GET`, `DEL`, `EXPIRE` - table operations
//! - `ENABLELOG`, `DISABLELOG`, `SAVE`, `LOAD` - operation log
//! - `SNAPSHOT`, `RESTORE` - snapshot files
//! - `STATS`, `HELP`, `EXIT` - administration

pub mod command;
pub mod repl;
pub mod session;

pub use command::Command;
pub use repl::run;
pub use session::{Outcome, Session};
