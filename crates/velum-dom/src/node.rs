#![forbid(unsafe_code)]

//! Owning-node boundary.
//!
//! A [`DomElement`](crate::element::DomElement) never schedules itself or
//! computes geometry; it asks the scene-graph node that owns it. `SceneNode`
//! is that seam. Methods take `&self`: the model is single-threaded and
//! cooperative, so implementors use interior mutability where they need to
//! record or schedule.
//!
//! [`RecordingNode`] is a reference implementation that records command
//! bursts and update requests. Tests are its main consumer, but it is also a
//! reasonable starting point for a host adapter.

use std::cell::{Cell, RefCell};

use velum_core::command::Operand;
use velum_core::geometry::{IDENTITY, SizeMode, Transform};

/// The owning scene-graph node, as seen by the adapter.
///
/// The adapter holds a non-owning back-link to its node between mount and
/// dismount, used only to request scheduling, read geometry, and sink
/// command bursts. It never controls the node's lifecycle.
pub trait SceneNode {
    /// Ask the host scheduler to drive the adapter's drain later.
    ///
    /// The adapter coalesces: between two drains this is called at most
    /// once, no matter how many mutations occur.
    fn request_update(&self);

    /// Consume one addressed command burst produced by a drain.
    fn send_draw_commands(&self, burst: &[Operand]);

    /// Current transform, 16 scalars in matrix order.
    fn transform(&self) -> Transform;

    /// Current size in pixels.
    fn size(&self) -> [f64; 2];

    /// Current per-axis sizing modes.
    fn size_mode(&self) -> [SizeMode; 3];

    /// Current opacity in `0.0..=1.0`.
    fn opacity(&self) -> f64;
}

/// Geometry a [`RecordingNode`] reports to its adapter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeGeometry {
    pub transform: Transform,
    pub size: [f64; 2],
    pub size_mode: [SizeMode; 3],
    pub opacity: f64,
}

impl Default for NodeGeometry {
    fn default() -> Self {
        Self {
            transform: IDENTITY,
            size: [100.0, 100.0],
            size_mode: [SizeMode::Absolute; 3],
            opacity: 1.0,
        }
    }
}

/// A `SceneNode` that records every burst and update request.
#[derive(Debug, Default)]
pub struct RecordingNode {
    geometry: RefCell<NodeGeometry>,
    bursts: RefCell<Vec<Vec<Operand>>>,
    update_requests: Cell<usize>,
}

impl RecordingNode {
    /// Create a node with default geometry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node reporting the given geometry.
    pub fn with_geometry(geometry: NodeGeometry) -> Self {
        Self {
            geometry: RefCell::new(geometry),
            ..Self::default()
        }
    }

    /// Replace the reported geometry.
    pub fn set_geometry(&self, geometry: NodeGeometry) {
        *self.geometry.borrow_mut() = geometry;
    }

    /// Every burst received so far, oldest first.
    pub fn bursts(&self) -> Vec<Vec<Operand>> {
        self.bursts.borrow().clone()
    }

    /// The most recent burst, if any.
    pub fn last_burst(&self) -> Option<Vec<Operand>> {
        self.bursts.borrow().last().cloned()
    }

    /// How many times the adapter asked to be scheduled.
    pub fn update_requests(&self) -> usize {
        self.update_requests.get()
    }

    /// Forget recorded bursts (update-request count is kept).
    pub fn clear_bursts(&self) {
        self.bursts.borrow_mut().clear();
    }
}

impl SceneNode for RecordingNode {
    fn request_update(&self) {
        self.update_requests.set(self.update_requests.get() + 1);
    }

    fn send_draw_commands(&self, burst: &[Operand]) {
        self.bursts.borrow_mut().push(burst.to_vec());
    }

    fn transform(&self) -> Transform {
        self.geometry.borrow().transform
    }

    fn size(&self) -> [f64; 2] {
        self.geometry.borrow().size
    }

    fn size_mode(&self) -> [SizeMode; 3] {
        self.geometry.borrow().size_mode
    }

    fn opacity(&self) -> f64 {
        self.geometry.borrow().opacity
    }
}
