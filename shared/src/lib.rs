//! Types shared between the wheel server and its browser renderer.

pub mod angle;
pub mod config;
pub mod protocol;
