#![forbid(unsafe_code)]

//! Presentation state store.
//!
//! `PresentationState` holds the canonical values for one remote surface.
//! It is a pure data holder: the diff-and-queue engine in
//! [`element`](crate::element) compares against it and decides what to emit;
//! nothing here has side effects.
//!
//! B-tree collections keep the forced-resync replay deterministic; key order
//! carries no meaning on the wire.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use velum_core::command::Operand;

/// Marker class present on every adapter-managed surface for its whole life.
pub const BASE_CLASS: &str = "famous-dom-element";

/// Attribute carrying the surface's scene-graph address token.
pub const PATH_ATTRIBUTE: &str = "data-fa-path";

/// Reserved style property toggled by show/hide and the mount/dismount
/// lifecycle.
pub const DISPLAY_PROPERTY: &str = "display";

/// Reserved style property fed by the owning node's opacity hook.
pub const OPACITY_PROPERTY: &str = "opacity";

/// Display value for a shown surface.
pub const DISPLAY_SHOWN: &str = "block";

/// Display value for a hidden surface.
pub const DISPLAY_HIDDEN: &str = "none";

/// Inbound event name carrying a two-component measurement payload instead
/// of a UI event.
pub const RENDER_SIZE_EVENT: &str = "resize";

const DEFAULT_TAG: &str = "div";

// ---------------------------------------------------------------------------
// PropertyValue
// ---------------------------------------------------------------------------

/// A style property value: string or number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Str(String),
    Num(f64),
}

impl PropertyValue {
    /// Whether this value is the empty string (a cleared property).
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Str(s) if s.is_empty())
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Num(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Num(f64::from(value))
    }
}

impl From<&PropertyValue> for Operand {
    fn from(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::Str(s) => Self::Str(s.clone()),
            PropertyValue::Num(n) => Self::Num(*n),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Num(n) => write!(f, "{n}"),
        }
    }
}

// ---------------------------------------------------------------------------
// PresentationState
// ---------------------------------------------------------------------------

/// Canonical retained description of one remote surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationState {
    pub(crate) tag: String,
    pub(crate) classes: BTreeSet<String>,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) properties: BTreeMap<String, PropertyValue>,
    pub(crate) content: String,
    pub(crate) cutout: bool,
    pub(crate) render_size: [f64; 2],
}

impl PresentationState {
    /// Create a state with the given tag (default `"div"`), uppercased.
    ///
    /// The tag is immutable after construction. The marker class is present
    /// from the start and never leaves.
    pub fn new(tag: Option<&str>) -> Self {
        let mut classes = BTreeSet::new();
        classes.insert(BASE_CLASS.to_string());
        Self {
            tag: tag.unwrap_or(DEFAULT_TAG).to_uppercase(),
            classes,
            attributes: BTreeMap::new(),
            properties: BTreeMap::new(),
            content: String::new(),
            cutout: true,
            render_size: [0.0, 0.0],
        }
    }

    /// The uppercased element tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The class set, marker class included.
    pub fn classes(&self) -> &BTreeSet<String> {
        &self.classes
    }

    /// The attribute map.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// The style property map.
    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }

    /// The opaque markup content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The composited-layer cutout flag.
    pub fn cutout(&self) -> bool {
        self.cutout
    }

    /// Last measured render size. Written only by the inbound measurement
    /// notification; a snapshot that may be overwritten by the next one.
    pub fn render_size(&self) -> [f64; 2] {
        self.render_size
    }

    /// A read-only snapshot of everything a caller can observe.
    pub fn snapshot(&self) -> ElementSnapshot {
        ElementSnapshot {
            tag: self.tag.clone(),
            render_size: self.render_size,
            classes: self.classes.iter().cloned().collect(),
            attributes: self.attributes.clone(),
            properties: self.properties.clone(),
            content: self.content.clone(),
            cutout: self.cutout,
        }
    }
}

impl Default for PresentationState {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Read-only, serializable snapshot of a surface description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementSnapshot {
    pub tag: String,
    pub render_size: [f64; 2],
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub properties: BTreeMap<String, PropertyValue>,
    pub content: String,
    pub cutout: bool,
}
