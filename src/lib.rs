//! GitHub credential resolution.
//!
//! [`transport::build_transport`] finds credentials for the GitHub REST API
//! and returns a `reqwest` client that attaches them to every request. See
//! [`credentials`] for the individual sources.

pub mod cli;
pub mod color;
pub mod commands;
pub mod credentials;
pub mod transport;

pub use transport::{Resolver, Transport, build_transport};
