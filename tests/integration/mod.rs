//! Integration test suite for pagesmith
//!
//! These tests assemble complete sites on disk and drive them end to end:
//!
//! - **server**: requests through the axum router of a [`Site`]
//! - **hot_reload**: template recompilation reaching running handlers
//! - **client**: the caching backend client against a local HTTP server
//! - **cli**: the `check` command and error presentation
//! - **commands**: the `pagesmith` binary end to end
//!
//! Backend data comes from `StubFetcher` except in the client tests, which
//! bind a real listener on an ephemeral port.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! [`Site`]: pagesmith::server::Site

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod commands;
mod hot_reload;
