//! Measure how closely a network emulator reproduces real kernel queueing behavior.
//!
//! This crate is the core of the `quedist` trace comparison tool: it extracts queue-occupancy
//! series from qdisc and emulator trace logs, computes normalized DTW distances between series
//! pairs across a bounded worker pool, and persists every computed distance in an append-only
//! cache so that repeated analysis runs never recompute work. It is the backend for the `quedist`
//! CLI driver as well as the other diagnostic tools.
#![deny(missing_docs)]
#![doc(test(attr(deny(warnings))))]

#[macro_use]
pub mod error;

pub mod cache;
pub mod config;
pub mod distance_metric;
pub mod engine;
pub mod pairing;
pub mod series;
