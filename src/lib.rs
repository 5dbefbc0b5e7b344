//! Binary crate glue for the Vigil bot: the axum webhook server.
//!
//! Exposed as a library so integration tests can build the router with
//! stub event handlers.

pub mod server;
