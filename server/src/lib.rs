//! Wheel of Names server library.
//!
//! The spin engine (layout, selection, target resolution, simulation and the
//! controller tying them together) plus the roster and the WebSocket host that
//! drives it. Exposed as a library for tests and the binary.

pub mod config;
pub mod controller;
pub mod error;
pub mod game_loop;
pub mod roster;
pub mod segment;
pub mod selector;
pub mod simulator;
pub mod state;
pub mod target;
pub mod ws;
