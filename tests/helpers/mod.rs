//! Test helpers
//!
//! Shared by the integration test crates; not every crate uses every helper.

#![allow(dead_code)]

pub mod database_helper;
pub mod test_data;

pub use database_helper::*;
pub use test_data::*;
