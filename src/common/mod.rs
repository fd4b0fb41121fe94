//! Utilities shared by the server and client.

pub mod endpoint;
pub mod logger;
pub mod time;
pub mod ui;
