//! Busylight — manual and timed control of a blink(1) USB busy light.

pub mod color;
pub mod config;
pub mod controller;
pub mod device;
pub mod duration;
pub mod error;
pub mod hooks;
pub mod protocol;
pub mod session;
pub mod timer;

pub use error::BusylightError;
