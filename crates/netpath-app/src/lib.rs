//! Netpath App — controller state machine and command interface.
//!
//! `AppController` owns the session: the graph model, the current selection
//! and weights, the last path result and the display surface. The `netpath`
//! binary drives it from a terminal.

pub mod controller;
pub mod repl;

pub use controller::{AppController, Outcome, Phase, StateSnapshot};
pub use repl::Command;
