#![forbid(unsafe_code)]

//! State-diffing DOM presentation adapter.
//!
//! # Role in Velum
//! `velum-dom` owns the local, mutable description of one remote DOM surface
//! (tag, classes, attributes, style properties, content, layering mode) and
//! translates mutations into minimal, ordered draw-command bursts for a
//! remote renderer. It also manages the adapter's attachment lifecycle and a
//! bidirectional UI-event subscription channel.
//!
//! # Primary responsibilities
//! - **PresentationState**: canonical retained values, the single source of
//!   truth mutators diff against.
//! - **DomElement**: the diff-and-queue engine, flush scheduling, mount and
//!   dismount lifecycle, UI-event subscriptions, and reactive geometry hooks.
//! - **SceneNode**: the boundary trait the owning scene-graph node
//!   implements (update scheduling, command sink, geometry reads).
//!
//! # How it fits in the system
//! A host scene graph owns one [`DomElement`] per rendered surface. Mutators
//! compare against retained state and enqueue commands only on change; the
//! adapter registers once with the host's update scheduler and drains its
//! queue into a single addressed burst when driven.

pub mod element;
pub mod node;
pub mod state;

pub use element::{DomElement, ElementOptions};
pub use node::{NodeGeometry, RecordingNode, SceneNode};
pub use state::{
    BASE_CLASS, DISPLAY_HIDDEN, DISPLAY_PROPERTY, DISPLAY_SHOWN, ElementSnapshot, OPACITY_PROPERTY,
    PATH_ATTRIBUTE, PresentationState, PropertyValue, RENDER_SIZE_EVENT,
};
