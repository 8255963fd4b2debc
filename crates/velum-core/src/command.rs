#![forbid(unsafe_code)]

//! Draw-command vocabulary for the renderer protocol.
//!
//! Commands travel as a flat run of [`Operand`]s: an [`Opcode`] followed by
//! a fixed or variable number of payload operands consumed positionally by
//! the remote interpreter. A burst is always scoped by `WITH` plus the
//! surface's address token, so interleaved bursts from many adapters stay
//! addressable.
//!
//! ```text
//! WITH "body/0" INIT_DOM "SPAN" ADD_CLASS "famous-dom-element" ...
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Opcode
// ---------------------------------------------------------------------------

/// Symbolic opcode heading each command in a burst.
///
/// The wire form is the symbolic name itself (see [`Opcode::as_str`]); the
/// remote interpreter dispatches on it and then consumes the operand run
/// that follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Opcode {
    /// Address-scope begin; followed by the surface's address token.
    With,
    /// Initialize the surface; followed by the (uppercased) tag name.
    InitDom,
    /// Add a CSS class; followed by the class name.
    AddClass,
    /// Remove a CSS class; followed by the class name.
    RemoveClass,
    /// Set a style property; followed by name and value.
    ChangeProperty,
    /// Set a DOM attribute; followed by name and value.
    ChangeAttribute,
    /// Replace the surface's markup content; followed by the content string.
    ChangeContent,
    /// Toggle the composited-layer cutout; followed by a boolean.
    GlCutoutState,
    /// Replace the transform; followed by 16 scalars in matrix order.
    ChangeTransform,
    /// Resize; followed by two operands, each a pixel value or the
    /// renderer-decides sentinel (the boolean `false`).
    ChangeSize,
    /// Ask the renderer to report the surface's measured size; followed by
    /// the address token.
    DomRenderSize,
    /// Start forwarding a UI event; followed by the event name.
    Subscribe,
    /// Stop forwarding a UI event; followed by the event name.
    Unsubscribe,
    /// Suppress the default action for an event; followed by the event name.
    PreventDefault,
    /// Restore the default action for an event; followed by the event name.
    AllowDefault,
}

impl Opcode {
    /// The symbolic wire name of this opcode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::With => "WITH",
            Self::InitDom => "INIT_DOM",
            Self::AddClass => "ADD_CLASS",
            Self::RemoveClass => "REMOVE_CLASS",
            Self::ChangeProperty => "CHANGE_PROPERTY",
            Self::ChangeAttribute => "CHANGE_ATTRIBUTE",
            Self::ChangeContent => "CHANGE_CONTENT",
            Self::GlCutoutState => "GL_CUTOUT_STATE",
            Self::ChangeTransform => "CHANGE_TRANSFORM",
            Self::ChangeSize => "CHANGE_SIZE",
            Self::DomRenderSize => "DOM_RENDER_SIZE",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::PreventDefault => "PREVENT_DEFAULT",
            Self::AllowDefault => "ALLOW_DEFAULT",
        }
    }

    /// Parse a symbolic wire name, or `None` for unknown names.
    pub fn from_str(name: &str) -> Option<Self> {
        match name {
            "WITH" => Some(Self::With),
            "INIT_DOM" => Some(Self::InitDom),
            "ADD_CLASS" => Some(Self::AddClass),
            "REMOVE_CLASS" => Some(Self::RemoveClass),
            "CHANGE_PROPERTY" => Some(Self::ChangeProperty),
            "CHANGE_ATTRIBUTE" => Some(Self::ChangeAttribute),
            "CHANGE_CONTENT" => Some(Self::ChangeContent),
            "GL_CUTOUT_STATE" => Some(Self::GlCutoutState),
            "CHANGE_TRANSFORM" => Some(Self::ChangeTransform),
            "CHANGE_SIZE" => Some(Self::ChangeSize),
            "DOM_RENDER_SIZE" => Some(Self::DomRenderSize),
            "SUBSCRIBE" => Some(Self::Subscribe),
            "UNSUBSCRIBE" => Some(Self::Unsubscribe),
            "PREVENT_DEFAULT" => Some(Self::PreventDefault),
            "ALLOW_DEFAULT" => Some(Self::AllowDefault),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Operand
// ---------------------------------------------------------------------------

/// One positional item on the command stream.
///
/// Bursts are flat: opcodes and their payloads share one sequence, and the
/// interpreter knows from the opcode how many operands to consume next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// A command opcode.
    Op(Opcode),
    /// A string payload (names, values, tokens, content).
    Str(String),
    /// A numeric payload (sizes, transform scalars).
    Num(f64),
    /// A boolean payload (cutout flag, renderer-decides size sentinel).
    Bool(bool),
}

impl From<Opcode> for Operand {
    fn from(op: Opcode) -> Self {
        Self::Op(op)
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Self::Num(value)
    }
}

impl From<bool> for Operand {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Op(op) => write!(f, "{op}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Num(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}
