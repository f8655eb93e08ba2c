//! Core types and the affinity matching engine for Concord.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage is reached only through the [`store::MatchStore`] trait, and every
//! engine operation takes the store handle as an explicit argument.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod candidates;
pub mod engine;
pub mod error;
pub mod exclusion;
pub mod filter;
pub mod ranking;
pub mod stats;
pub mod store;
pub mod user;
pub mod vote;

pub use error::{Error, Result};
