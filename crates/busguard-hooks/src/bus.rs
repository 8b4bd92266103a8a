//! # Bus Collaborators
//!
//! The host bus and its client sockets, as seen by the plugin.

use std::collections::HashMap;
use std::fmt;

use busguard_core::Message;

/// The client connection a message arrived on.
pub trait ErrorSink {
    /// Send an error frame back to the client.
    fn send_error(&self, topic: &str, code: &str, message: &str);
}

/// What a hook handler receives for one inbound frame.
pub struct HookEnvelope<'a> {
    /// The inbound frame.
    pub message: Message,
    /// The socket the frame arrived on.
    pub socket: &'a dyn ErrorSink,
    /// Set by a handler to drop the message from further bus processing.
    pub skip: bool,
}

impl<'a> HookEnvelope<'a> {
    /// Wrap a frame for dispatch. `skip` starts cleared.
    pub fn new(message: Message, socket: &'a dyn ErrorSink) -> Self {
        Self {
            message,
            socket,
            skip: false,
        }
    }
}

impl fmt::Debug for HookEnvelope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookEnvelope")
            .field("message", &self.message)
            .field("skip", &self.skip)
            .finish_non_exhaustive()
    }
}

/// A registered hook handler. Returning from it resumes the bus.
pub type HookHandler = Box<dyn for<'a> Fn(&mut HookEnvelope<'a>) + Send + Sync>;

/// The bus's hook registration surface.
pub trait HookRegistry {
    /// Register `handler` under `hook`.
    fn register(&mut self, hook: &'static str, handler: HookHandler);
}

/// A minimal in-process hook registry: handlers run in registration order.
#[derive(Default)]
pub struct HookTable {
    handlers: HashMap<&'static str, Vec<HookHandler>>,
}

impl HookTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handlers registered under `hook`.
    pub fn handler_count(&self, hook: &str) -> usize {
        self.handlers.get(hook).map_or(0, Vec::len)
    }

    /// Run every handler registered under `hook`, stopping early once one
    /// marks the envelope `skip`.
    pub fn dispatch(&self, hook: &str, envelope: &mut HookEnvelope<'_>) {
        let Some(handlers) = self.handlers.get(hook) else {
            return;
        };
        for handler in handlers {
            handler(envelope);
            if envelope.skip {
                break;
            }
        }
    }
}

impl HookRegistry for HookTable {
    fn register(&mut self, hook: &'static str, handler: HookHandler) {
        self.handlers.entry(hook).or_default().push(handler);
    }
}

impl fmt::Debug for HookTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<(&str, usize)> =
            self.handlers.iter().map(|(k, v)| (*k, v.len())).collect();
        counts.sort_unstable();
        f.debug_struct("HookTable").field("handlers", &counts).finish()
    }
}
