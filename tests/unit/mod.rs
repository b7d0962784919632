//! Unit test suite for pagesmith
//!
//! Exercises the public API of individual components without starting a
//! server:
//!
//! - **config**: parsing, validation and cache lifetimes
//! - **templating**: handlebars rendering, compile-time partials and layouts
//! - **partials**: resolution order of the partial provider chain
//! - **generator**: static and backend response generators
//!
//! ```bash
//! cargo test --test unit
//! ```

#[path = "../common/mod.rs"]
mod common;

mod config;
mod generator;
mod templating;
