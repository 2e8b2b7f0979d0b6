//! Content Studio: marketing copy workflows behind a free-trial gate.

pub mod config;
pub mod error;
pub mod identity;
pub mod lead;
pub mod server;
pub mod store;
pub mod trial;
pub mod workflows;
