//! FPL squad season simulator.
//!
//! Module map (leaf first):
//!   - player, stats         squad state and the per-gameweek stats refresh
//!   - predicate, transfer   transfer decision policies
//!   - lineup                starting 11, captaincy, auto-substitution
//!   - engine                the per-gameweek season loop
//!   - batch                 parallel predicate sweeps

pub mod batch;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod event;
pub mod lineup;
pub mod player;
pub mod predicate;
pub mod rng;
pub mod stats;
pub mod store;
pub mod transfer;
pub mod types;
