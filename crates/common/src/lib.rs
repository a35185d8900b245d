//! Helpers shared by the `banner` binary and its library crates.

pub mod utils;
