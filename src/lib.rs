//! levsim: Monte-Carlo comparison of leveraged index funds over randomly
//! drawn historical holding periods.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
