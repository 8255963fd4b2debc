#![forbid(unsafe_code)]

//! Protocol vocabulary and simple collaborators for Velum.
//!
//! # Role in Velum
//! `velum-core` holds everything the presentation adapter and its host agree
//! on at the boundary: the symbolic draw-command opcode table, the flat
//! positional operand encoding used on the command stream, the listener
//! registry for inbound UI events, and the geometry primitives (size modes
//! and the 16-scalar transform) the owning node reports.
//!
//! # How it fits in the system
//! `velum-dom` builds command bursts out of [`command::Operand`] runs and
//! dispatches inbound events through [`callback::CallbackStore`]. The remote
//! renderer consumes the operand stream positionally; this crate never
//! interprets it.

pub mod callback;
pub mod command;
pub mod geometry;

pub use callback::{CallbackStore, ListenerId};
pub use command::{Opcode, Operand};
pub use geometry::{IDENTITY, SizeMode, Transform};
