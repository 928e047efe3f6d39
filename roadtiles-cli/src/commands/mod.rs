//! CLI command implementations.

pub mod common;
pub mod config;
pub mod health;
pub mod officials;
pub mod road;
pub mod tiles;
