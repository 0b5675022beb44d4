//! Flotilla CLI library — exposes modules for integration testing.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod cli;
pub mod commands;
pub mod coordinator;
pub mod error;
pub mod filter;
pub mod output;
pub mod presenter;
pub mod records;
pub mod ssh;
