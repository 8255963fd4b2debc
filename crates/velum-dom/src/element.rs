#![forbid(unsafe_code)]

//! The state-diffing presentation adapter.
//!
//! A `DomElement` owns one [`PresentationState`] exclusively and translates
//! mutations of it into an ordered, minimal run of draw commands for the
//! remote renderer.
//!
//! # Design Principles
//!
//! - **Diff before emit**: every mutator compares against retained state and
//!   enqueues a command only when the value actually changed.
//! - **Forced resync**: during the mount replay the equality guard is
//!   bypassed, so the remote surface is reconstructed byte for byte.
//! - **Coalesced scheduling**: any number of mutations between two drains
//!   produce exactly one scheduling request and one addressed burst, in
//!   mutation order.
//! - **Single-threaded**: mutators, drains, and lifecycle transitions run
//!   synchronously with no suspension points.
//!
//! # Usage
//!
//! ```
//! use std::rc::Rc;
//! use velum_dom::{DomElement, ElementOptions, RecordingNode, SceneNode};
//!
//! let node = Rc::new(RecordingNode::new());
//! let scene: Rc<dyn SceneNode> = node.clone();
//!
//! let mut element = DomElement::new(ElementOptions {
//!     tag_name: Some("span".into()),
//!     content: Some("hi".into()),
//!     ..ElementOptions::default()
//! });
//! element.mount(&scene, "body/0");
//! element.set_property("color", "red");
//! element.drain();
//! assert_eq!(node.bursts().len(), 1);
//! ```

use std::collections::BTreeSet;
use std::mem;
use std::rc::{Rc, Weak};

use serde_json::Value;
use smallvec::SmallVec;

use velum_core::callback::{CallbackStore, ListenerId};
use velum_core::command::{Opcode, Operand};
use velum_core::geometry::{SizeMode, Transform};

use crate::node::SceneNode;
use crate::state::{
    BASE_CLASS, DISPLAY_HIDDEN, DISPLAY_PROPERTY, DISPLAY_SHOWN, ElementSnapshot, OPACITY_PROPERTY,
    PATH_ATTRIBUTE, PresentationState, PropertyValue, RENDER_SIZE_EVENT,
};

/// Inline capacity of the pending command queue. A typical frame's worth of
/// mutations fits without spilling to the heap.
const QUEUE_INLINE: usize = 16;

/// Construction-time configuration for a [`DomElement`].
///
/// Everything here is also reachable through mutators after construction;
/// pre-mount mutations are retained and replayed at mount.
#[derive(Debug, Clone, Default)]
pub struct ElementOptions {
    /// Element tag, uppercased on construction. Defaults to `"div"`.
    pub tag_name: Option<String>,
    /// Initial `id` attribute.
    pub id: Option<String>,
    /// Initial classes, in addition to the always-present marker class.
    pub classes: Vec<String>,
    /// Initial attribute name/value pairs.
    pub attributes: Vec<(String, String)>,
    /// Initial style property name/value pairs.
    pub properties: Vec<(String, PropertyValue)>,
    /// Initial markup content.
    pub content: Option<String>,
    /// Initial layering-mode (cutout) flag. Defaults to `true`.
    pub cutout: Option<bool>,
}

/// State-diffing adapter for one remote DOM surface.
///
/// See the [module docs](self) for the emission model. Mutators return
/// `&mut Self` so calls chain.
#[derive(Debug)]
pub struct DomElement {
    state: PresentationState,
    /// Non-owning back-link to the owning node; set on mount, cleared on
    /// dismount.
    node: Option<Weak<dyn SceneNode>>,
    path: Option<String>,
    queue: SmallVec<[Operand; QUEUE_INLINE]>,
    subscribed: BTreeSet<String>,
    callbacks: CallbackStore,
    initialized: bool,
    in_resync: bool,
    flush_pending: bool,
    /// True while any axis of the owning node's size mode is renderer-measured.
    render_sized: bool,
    /// A `DOM_RENDER_SIZE` request must ride along with the next burst.
    measure_requested: bool,
}

impl DomElement {
    /// Create a detached adapter from construction options.
    pub fn new(options: ElementOptions) -> Self {
        let mut state = PresentationState::new(options.tag_name.as_deref());
        // Seeded so the mount replay always carries the display property.
        state
            .properties
            .insert(DISPLAY_PROPERTY.to_string(), PropertyValue::from(DISPLAY_SHOWN));

        let mut element = Self {
            state,
            node: None,
            path: None,
            queue: SmallVec::new(),
            subscribed: BTreeSet::new(),
            callbacks: CallbackStore::new(),
            initialized: false,
            in_resync: false,
            flush_pending: false,
            render_sized: false,
            measure_requested: false,
        };

        for class in &options.classes {
            element.add_class(class);
        }
        for (name, value) in &options.attributes {
            element.set_attribute(name, value);
        }
        for (name, value) in options.properties {
            element.set_property(&name, value);
        }
        if let Some(id) = &options.id {
            element.set_id(id);
        }
        if let Some(content) = &options.content {
            element.set_content(content);
        }
        if let Some(cutout) = options.cutout {
            element.set_cutout_state(cutout);
        }
        element
    }

    /// Create a detached adapter with the given tag and defaults otherwise.
    pub fn with_tag(tag: &str) -> Self {
        Self::new(ElementOptions {
            tag_name: Some(tag.to_string()),
            ..ElementOptions::default()
        })
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    /// The retained surface description.
    pub fn state(&self) -> &PresentationState {
        &self.state
    }

    /// The uppercased element tag.
    pub fn tag(&self) -> &str {
        self.state.tag()
    }

    /// Whether the adapter is currently mounted.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a class is currently present.
    pub fn has_class(&self, class: &str) -> bool {
        self.state.classes.contains(class)
    }

    /// Current classes, marker class included.
    pub fn get_classes(&self) -> Vec<String> {
        self.state.classes.iter().cloned().collect()
    }

    /// Current value of an attribute.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.state.attributes.get(name).map(String::as_str)
    }

    /// Current value of a style property.
    pub fn get_property(&self, name: &str) -> Option<&PropertyValue> {
        self.state.properties.get(name)
    }

    /// Current markup content.
    pub fn get_content(&self) -> &str {
        self.state.content()
    }

    /// The `id` attribute.
    pub fn get_id(&self) -> Option<&str> {
        self.get_attribute("id")
    }

    /// Last size reported by the renderer's measurement notification.
    ///
    /// A snapshot: the next notification overwrites it.
    pub fn get_render_size(&self) -> [f64; 2] {
        self.state.render_size
    }

    /// A read-only snapshot of the retained description.
    pub fn serialize(&self) -> ElementSnapshot {
        self.state.snapshot()
    }

    // -----------------------------------------------------------------------
    // Diff-and-queue mutators
    // -----------------------------------------------------------------------

    /// Record a class as present, emitting `ADD_CLASS` on change.
    pub fn add_class(&mut self, class: &str) -> &mut Self {
        if self.state.classes.insert(class.to_string()) || self.in_resync {
            if self.initialized {
                self.queue.push(Opcode::AddClass.into());
                self.queue.push(class.into());
                self.arm_flush();
            }
        }
        self
    }

    /// Record a class as absent, emitting `REMOVE_CLASS` if it was present.
    ///
    /// The marker class cannot be removed; it is present for the adapter's
    /// entire life.
    pub fn remove_class(&mut self, class: &str) -> &mut Self {
        if class == BASE_CLASS {
            return self;
        }
        if self.state.classes.remove(class) || self.in_resync {
            if self.initialized {
                self.queue.push(Opcode::RemoveClass.into());
                self.queue.push(class.into());
                self.arm_flush();
            }
        }
        self
    }

    /// Set an attribute, emitting `CHANGE_ATTRIBUTE` on change.
    ///
    /// Any name is accepted; unknown attributes are stored and forwarded.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> &mut Self {
        let changed = self.state.attributes.get(name).map(String::as_str) != Some(value);
        if changed || self.in_resync {
            self.state
                .attributes
                .insert(name.to_string(), value.to_string());
            if self.initialized {
                self.queue.push(Opcode::ChangeAttribute.into());
                self.queue.push(name.into());
                self.queue.push(value.into());
                self.arm_flush();
            }
        }
        self
    }

    /// Set a style property, emitting `CHANGE_PROPERTY` on change.
    ///
    /// While the surface is renderer-sized, a property change also marks a
    /// measurement request for the next burst (style can change measured
    /// size).
    pub fn set_property(&mut self, name: &str, value: impl Into<PropertyValue>) -> &mut Self {
        let value = value.into();
        let changed = self.state.properties.get(name) != Some(&value);
        if changed || self.in_resync {
            if self.initialized {
                self.queue.push(Opcode::ChangeProperty.into());
                self.queue.push(name.into());
                self.queue.push(Operand::from(&value));
                self.arm_flush();
            }
            self.state.properties.insert(name.to_string(), value);
            if self.render_sized {
                self.measure_requested = true;
            }
        }
        self
    }

    /// Replace the markup content, emitting `CHANGE_CONTENT` on change.
    ///
    /// Marks a measurement request while renderer-sized, as
    /// [`set_property`](Self::set_property) does.
    pub fn set_content(&mut self, content: &str) -> &mut Self {
        if self.state.content != content || self.in_resync {
            self.state.content = content.to_string();
            if self.initialized {
                self.queue.push(Opcode::ChangeContent.into());
                self.queue.push(content.into());
                self.arm_flush();
            }
            if self.render_sized {
                self.measure_requested = true;
            }
        }
        self
    }

    /// Set the composited-layer cutout flag, emitting `GL_CUTOUT_STATE` on
    /// change.
    pub fn set_cutout_state(&mut self, cutout: bool) -> &mut Self {
        if cutout != self.state.cutout || self.in_resync {
            self.state.cutout = cutout;
            if self.initialized {
                self.queue.push(Opcode::GlCutoutState.into());
                self.queue.push(cutout.into());
                self.arm_flush();
            }
        }
        self
    }

    /// Set the `id` attribute.
    pub fn set_id(&mut self, id: &str) -> &mut Self {
        self.set_attribute("id", id)
    }

    // -----------------------------------------------------------------------
    // UI-event subscriptions
    // -----------------------------------------------------------------------

    /// Start forwarding a UI event from the remote surface.
    ///
    /// Already-subscribed names are not re-emitted, except inside the mount
    /// replay where every tracked subscription is re-established.
    pub fn on_add_ui_event(&mut self, event: &str) -> &mut Self {
        if self.subscribed.insert(event.to_string()) {
            self.queue_subscribe(event);
        } else if self.in_resync {
            self.queue_subscribe(event);
        }
        self
    }

    /// Stop forwarding a UI event.
    ///
    /// Untracked names are a no-op, except inside a forced resync where the
    /// unsubscribe is still emitted (idempotent cleanup during replay).
    pub fn on_remove_ui_event(&mut self, event: &str) -> &mut Self {
        if self.subscribed.remove(event) {
            self.queue_unsubscribe(event);
        } else if self.in_resync {
            self.queue_unsubscribe(event);
        }
        self
    }

    /// Suppress the default action for a UI event on the remote surface.
    ///
    /// One-way: not tracked, not replayed at mount.
    pub fn prevent_default(&mut self, event: &str) -> &mut Self {
        if self.initialized {
            self.queue.push(Opcode::PreventDefault.into());
            self.queue.push(event.into());
            self.arm_flush();
        }
        self
    }

    /// Restore the default action for a UI event on the remote surface.
    pub fn allow_default(&mut self, event: &str) -> &mut Self {
        if self.initialized {
            self.queue.push(Opcode::AllowDefault.into());
            self.queue.push(event.into());
            self.arm_flush();
        }
        self
    }

    /// Register a local listener for an inbound UI event.
    ///
    /// Returns the token that unsubscribes it via [`off`](Self::off).
    pub fn on(&mut self, event: &str, listener: impl FnMut(&Value) + 'static) -> ListenerId {
        self.callbacks.on(event, listener)
    }

    /// Remove a listener registered with [`on`](Self::on).
    pub fn off(&mut self, id: &ListenerId) -> bool {
        self.callbacks.off(id)
    }

    /// Deliver an inbound notification from the remote surface.
    ///
    /// The reserved `resize` event carries a two-number measurement payload:
    /// it updates the render-size snapshot and arms a flush without emitting
    /// a command. Everything else is dispatched to local listeners.
    pub fn on_receive(&mut self, event: &str, payload: &Value) {
        if event == RENDER_SIZE_EVENT {
            if let Some(size) = measurement(payload) {
                self.state.render_size = size;
                self.arm_flush();
            }
        } else {
            self.callbacks.trigger(event, payload);
        }
    }

    fn queue_subscribe(&mut self, event: &str) {
        if self.initialized {
            self.queue.push(Opcode::Subscribe.into());
            self.queue.push(event.into());
            self.arm_flush();
        }
    }

    fn queue_unsubscribe(&mut self, event: &str) {
        if self.initialized {
            self.queue.push(Opcode::Unsubscribe.into());
            self.queue.push(event.into());
            self.arm_flush();
        }
    }

    // -----------------------------------------------------------------------
    // Reactive hooks (driven by the owning node)
    // -----------------------------------------------------------------------

    /// Forward a transform change: `CHANGE_TRANSFORM` plus 16 scalars.
    ///
    /// # Panics
    ///
    /// Panics if called before mount bound an owning node; that is a usage
    /// precondition violation, not a recoverable condition.
    pub fn on_transform_change(&mut self, transform: &Transform) -> &mut Self {
        self.owner();
        self.queue.push(Opcode::ChangeTransform.into());
        for scalar in transform {
            self.queue.push(Operand::Num(*scalar));
        }
        self.arm_flush();
        self
    }

    /// Forward a size change: `CHANGE_SIZE` plus one operand per axis.
    ///
    /// A renderer-measured axis sends the sentinel `false` (its "is sized"
    /// flag) instead of a pixel value, telling the renderer to decide.
    ///
    /// # Panics
    ///
    /// Panics if called before mount bound an owning node.
    pub fn on_size_change(&mut self, width: f64, height: f64) -> &mut Self {
        let node = self.owner();
        let [mode_x, mode_y, _] = node.size_mode();
        let sized_x = !mode_x.is_render();
        let sized_y = !mode_y.is_render();
        if self.initialized {
            self.queue.push(Opcode::ChangeSize.into());
            self.queue.push(if sized_x {
                Operand::Num(width)
            } else {
                Operand::Bool(sized_x)
            });
            self.queue.push(if sized_y {
                Operand::Num(height)
            } else {
                Operand::Bool(sized_y)
            });
        }
        self.arm_flush();
        self
    }

    /// React to a sizing-mode change: refresh tracking flags, then re-read
    /// the current size from the owning node and re-run the size hook.
    ///
    /// # Panics
    ///
    /// Panics if called before mount bound an owning node.
    pub fn on_size_mode_change(&mut self, x: SizeMode, y: SizeMode, z: SizeMode) -> &mut Self {
        self.apply_size_mode([x, y, z]);
        let node = self.owner();
        let [width, height] = node.size();
        self.on_size_change(width, height)
    }

    /// Forward an opacity change as a mutation of the reserved opacity
    /// property.
    pub fn on_opacity_change(&mut self, opacity: f64) -> &mut Self {
        self.set_property(OPACITY_PROPERTY, opacity)
    }

    /// Toggle the display property to shown. Touches nothing else.
    pub fn on_show(&mut self) -> &mut Self {
        self.set_property(DISPLAY_PROPERTY, DISPLAY_SHOWN)
    }

    /// Toggle the display property to hidden. Touches nothing else.
    pub fn on_hide(&mut self) -> &mut Self {
        self.set_property(DISPLAY_PROPERTY, DISPLAY_HIDDEN)
    }

    fn apply_size_mode(&mut self, mode: [SizeMode; 3]) {
        let render_sized = mode.iter().any(|axis| axis.is_render());
        if render_sized && !self.render_sized {
            self.measure_requested = true;
        }
        self.render_sized = render_sized;
    }

    // -----------------------------------------------------------------------
    // Mount / dismount lifecycle
    // -----------------------------------------------------------------------

    /// Attach to an owning node at the given address token.
    ///
    /// Enters forced resync and replays the entire retained description so
    /// the remote surface is reconstructed from scratch: the init pair, then
    /// classes, non-empty properties, non-empty attributes, content, tracked
    /// UI-event subscriptions, the path attribute, a forced display-shown,
    /// and finally the node's current size-mode, opacity, transform, and
    /// size. Mounting while already attached is a no-op.
    pub fn mount(&mut self, node: &Rc<dyn SceneNode>, path: &str) -> &mut Self {
        if self.initialized {
            return self;
        }
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("mount", tag = %self.state.tag, path = %path);
        #[cfg(feature = "tracing")]
        let _guard = _span.enter();

        self.node = Some(Rc::downgrade(node));
        self.path = Some(path.to_string());
        self.initialized = true;
        self.in_resync = true;

        let tag = self.state.tag.clone();
        self.queue.push(Opcode::InitDom.into());
        self.queue.push(tag.into());
        self.arm_flush();

        // Replay goes through the public mutators so it is captured
        // uniformly; forced resync bypasses their equality guards.
        let classes: Vec<String> = self.state.classes.iter().cloned().collect();
        for class in classes {
            self.add_class(&class);
        }
        let properties: Vec<(String, PropertyValue)> = self
            .state
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (name, value) in properties {
            if !value.is_empty() {
                self.set_property(&name, value);
            }
        }
        let attributes: Vec<(String, String)> = self
            .state
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (name, value) in attributes {
            if !value.is_empty() {
                self.set_attribute(&name, &value);
            }
        }
        if !self.state.content.is_empty() {
            let content = self.state.content.clone();
            self.set_content(&content);
        }
        let events: Vec<String> = self.subscribed.iter().cloned().collect();
        for event in events {
            self.on_add_ui_event(&event);
        }

        self.set_attribute(PATH_ATTRIBUTE, path);
        self.set_property(DISPLAY_PROPERTY, DISPLAY_SHOWN);

        // Pull geometry from the node so the initial burst is fully
        // self-consistent. Size-mode only refreshes the tracking flags here;
        // the explicit size pull below emits the one CHANGE_SIZE.
        self.apply_size_mode(node.size_mode());
        self.on_opacity_change(node.opacity());
        let transform = node.transform();
        self.on_transform_change(&transform);
        let [width, height] = node.size();
        self.on_size_change(width, height);

        self.in_resync = false;
        self
    }

    /// Detach from the owning node.
    ///
    /// Tells the remote surface to clear itself (class removals, empty
    /// property and attribute values, empty content, cutout off, display
    /// hidden), drains synchronously so the teardown is observed before the
    /// adapter forgets its address, then clears the back-link. Local state
    /// is deliberately kept for a potential remount replay. A no-op while
    /// detached.
    pub fn dismount(&mut self) -> &mut Self {
        if !self.initialized {
            return self;
        }
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("dismount", path = self.path.as_deref().unwrap_or(""));
        #[cfg(feature = "tracing")]
        let _guard = _span.enter();

        // Teardown commands are queued directly: the remote surface clears
        // while the local maps keep their last logical values.
        let classes: Vec<String> = self
            .state
            .classes
            .iter()
            .filter(|class| class.as_str() != BASE_CLASS)
            .cloned()
            .collect();
        for class in classes {
            self.queue.push(Opcode::RemoveClass.into());
            self.queue.push(class.into());
        }
        let properties: Vec<String> = self
            .state
            .properties
            .keys()
            .filter(|name| name.as_str() != DISPLAY_PROPERTY)
            .cloned()
            .collect();
        for name in properties {
            self.queue.push(Opcode::ChangeProperty.into());
            self.queue.push(name.into());
            self.queue.push("".into());
        }
        let attributes: Vec<String> = self.state.attributes.keys().cloned().collect();
        for name in attributes {
            self.queue.push(Opcode::ChangeAttribute.into());
            self.queue.push(name.into());
            self.queue.push("".into());
        }
        if !self.state.content.is_empty() {
            self.queue.push(Opcode::ChangeContent.into());
            self.queue.push("".into());
        }
        self.queue.push(Opcode::GlCutoutState.into());
        self.queue.push(Operand::Bool(false));

        self.state
            .properties
            .insert(DISPLAY_PROPERTY.to_string(), PropertyValue::from(DISPLAY_HIDDEN));
        self.queue.push(Opcode::ChangeProperty.into());
        self.queue.push(DISPLAY_PROPERTY.into());
        self.queue.push(DISPLAY_HIDDEN.into());

        self.arm_flush();
        self.drain();

        self.initialized = false;
        self.node = None;
        self.path = None;
        self
    }

    // -----------------------------------------------------------------------
    // Flush scheduling
    // -----------------------------------------------------------------------

    /// Drain the pending queue into one addressed burst.
    ///
    /// Invoked once per scheduling grant by the host, and synchronously by
    /// [`dismount`](Self::dismount). An empty queue emits nothing. A marked
    /// measurement request rides along at the end of the burst.
    pub fn drain(&mut self) {
        self.flush_pending = false;
        if self.queue.is_empty() {
            return;
        }
        let Some(node) = self.upgrade_node() else {
            return;
        };
        let Some(path) = self.path.clone() else {
            return;
        };
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("drain", path = %path, queued = self.queue.len());
        #[cfg(feature = "tracing")]
        let _guard = _span.enter();

        let queued = mem::take(&mut self.queue);
        let mut burst: Vec<Operand> = Vec::with_capacity(queued.len() + 4);
        burst.push(Opcode::With.into());
        burst.push(path.clone().into());
        burst.extend(queued);
        if self.measure_requested {
            burst.push(Opcode::DomRenderSize.into());
            burst.push(path.into());
            self.measure_requested = false;
        }
        node.send_draw_commands(&burst);
    }

    /// Arm the pending-flush flag and ask the scheduler to drive a drain.
    ///
    /// Coalescing: between two drains the scheduler hears from this adapter
    /// at most once.
    fn arm_flush(&mut self) {
        if self.flush_pending {
            return;
        }
        self.flush_pending = true;
        if let Some(node) = self.upgrade_node() {
            node.request_update();
        }
    }

    fn upgrade_node(&self) -> Option<Rc<dyn SceneNode>> {
        self.node.as_ref().and_then(Weak::upgrade)
    }

    fn owner(&self) -> Rc<dyn SceneNode> {
        self.upgrade_node()
            .expect("geometry hook invoked before mount bound an owning node")
    }
}

impl Default for DomElement {
    fn default() -> Self {
        Self::new(ElementOptions::default())
    }
}

/// Parse a two-number measurement payload, e.g. `[250.0, 80.0]`.
fn measurement(payload: &Value) -> Option<[f64; 2]> {
    let items = payload.as_array()?;
    Some([items.first()?.as_f64()?, items.get(1)?.as_f64()?])
}
