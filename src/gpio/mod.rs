//! # GPIO module
//!
//! The register level of this module is a tiny register-access abstraction: every GPIO
//! port is reached through the [`PortInterface`] trait, which only has to provide raw
//! register reads and writes. The memory mapped implementation is [`PortBlock`], the hosted
//! simulation is [`SimPort`](crate::sim::SimPort).
//!
//! On top of it, this module provides two ways to handle GPIO pins:
//!
//! - The free functions [`configure`], [`set_alternate_function`], [`read`], [`write`] and
//!   [`toggle`] take a port and a raw pin number and validate it on every call.
//! - [`DynPin`] is a value-level handle that validates the pin number once and implements
//!   the embedded HAL digital traits.
pub mod config;
pub use config::*;

pub mod dynpin;
pub use dynpin::*;

mod port;
pub use port::*;

mod reg;
pub use reg::*;
