//! Shared helpers for unit tests: logger setup, port helpers and in-memory
//! fakes for the admin protocol and node processes.
mod common;
mod mock_admin;
mod mock_server;

pub use common::*;
pub use mock_admin::*;
pub use mock_server::*;
