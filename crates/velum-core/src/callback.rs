#![forbid(unsafe_code)]

//! Publish/subscribe listener registry for inbound UI events.
//!
//! The `CallbackStore` maps event names to listener slots. Registration
//! returns a [`ListenerId`] token; passing it back to [`CallbackStore::off`]
//! removes the listener. Slots are tombstoned rather than shifted so ids
//! stay stable, and freed slots are reused.
//!
//! # Usage
//!
//! ```
//! use velum_core::callback::CallbackStore;
//!
//! let mut store = CallbackStore::new();
//! let id = store.on("click", |payload| {
//!     println!("clicked: {payload}");
//! });
//! store.trigger("click", &serde_json::json!({"x": 10}));
//! store.off(&id);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

type Listener = Box<dyn FnMut(&Value)>;

/// Opaque unsubscribe token returned by [`CallbackStore::on`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerId {
    channel: String,
    slot: usize,
}

#[derive(Default)]
struct Channel {
    slots: Vec<Option<Listener>>,
    free: Vec<usize>,
}

/// Registry of per-event listeners with stable ids and slot reuse.
#[derive(Default)]
pub struct CallbackStore {
    channels: BTreeMap<String, Channel>,
}

impl CallbackStore {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for an event name.
    ///
    /// The returned token removes exactly this listener when handed to
    /// [`off`](Self::off); other listeners on the same event are unaffected.
    pub fn on(&mut self, event: &str, listener: impl FnMut(&Value) + 'static) -> ListenerId {
        let channel = self.channels.entry(event.to_string()).or_default();
        let slot = if let Some(slot) = channel.free.pop() {
            channel.slots[slot] = Some(Box::new(listener));
            slot
        } else {
            channel.slots.push(Some(Box::new(listener)));
            channel.slots.len() - 1
        };
        ListenerId {
            channel: event.to_string(),
            slot,
        }
    }

    /// Remove a listener. Returns `false` if it was already removed.
    pub fn off(&mut self, id: &ListenerId) -> bool {
        let Some(channel) = self.channels.get_mut(&id.channel) else {
            return false;
        };
        let Some(slot) = channel.slots.get_mut(id.slot) else {
            return false;
        };
        if slot.take().is_some() {
            channel.free.push(id.slot);
            true
        } else {
            false
        }
    }

    /// Invoke every live listener for an event, in registration-slot order.
    ///
    /// Returns the number of listeners called.
    pub fn trigger(&mut self, event: &str, payload: &Value) -> usize {
        let Some(channel) = self.channels.get_mut(event) else {
            return 0;
        };
        let mut called = 0;
        for slot in channel.slots.iter_mut() {
            if let Some(listener) = slot {
                listener(payload);
                called += 1;
            }
        }
        called
    }

    /// Number of live listeners for an event.
    pub fn listener_count(&self, event: &str) -> usize {
        self.channels
            .get(event)
            .map(|channel| channel.slots.iter().filter(|slot| slot.is_some()).count())
            .unwrap_or(0)
    }

    /// Whether no live listener is registered for any event.
    pub fn is_empty(&self) -> bool {
        self.channels
            .values()
            .all(|channel| channel.slots.iter().all(|slot| slot.is_none()))
    }
}

impl fmt::Debug for CallbackStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (event, channel) in &self.channels {
            let live = channel.slots.iter().filter(|slot| slot.is_some()).count();
            map.entry(event, &live);
        }
        map.finish()
    }
}
