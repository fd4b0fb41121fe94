//! TCP chat room client implementation.

mod session;

pub use session::run_client_session;
