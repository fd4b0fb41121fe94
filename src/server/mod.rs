//! TCP chat room server implementation.

mod command;
mod domain;
mod formatter;
mod handler;
mod host_input;
mod registry;
mod runner;
mod signal;
mod state;

pub use domain::Nickname;
pub use runner::run_server;
