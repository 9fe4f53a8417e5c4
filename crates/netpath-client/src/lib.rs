//! Netpath Client — request/response exchanges with the path-finding backend.
//!
//! The backend owns the simulated network, the path search and image
//! rendering. This crate only speaks its HTTP contract and turns replies into
//! `netpath-core` types.

pub mod client;

pub use client::{NetworkSnapshot, PathQueryClient, PathReply};
