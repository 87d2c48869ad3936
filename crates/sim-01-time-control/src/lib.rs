//! # Time Control Subsystem
//!
//! Computes the timestamp of every produced block.
//!
//! ## Rules
//!
//! | Situation | Result |
//! |-----------|--------|
//! | Mine request carries a timestamp | That timestamp (must exceed the previous block's) |
//! | Override set via `set_next_timestamp` | The override; offset rebased on it; override cleared |
//! | Otherwise | `now + offset`, or `previous + 1` if that would not advance |
//!
//! `advance_time` only shifts the offset; it never rewrites mined blocks.
//!
//! ## Module Structure
//!
//! ```text
//! ports/outbound.rs     - Clock trait, SystemClock, ManualClock
//! domain/controller.rs  - TimeController
//! domain/errors.rs      - TimeError
//! ```

pub mod domain;
pub mod ports;

pub use domain::*;
pub use ports::*;
