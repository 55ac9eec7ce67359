//! Node-resident power-cap controller.
//!
//! Maps a day's electricity-market volume curve (or a deterministic
//! time-of-day curve) onto the platform's powercap constraint files and
//! mirrors the applied state into a cluster coordination service as node
//! metadata. One instance runs per node; there is no cross-node
//! coordination.

pub mod calc;
pub mod config;
pub mod controller;
pub mod error;
pub mod market;
pub mod node;
pub mod powercap;
pub mod store;
