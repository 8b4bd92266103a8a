//! # busguard-hooks — Message Bus Integration
//!
//! Wires the validation engine into the bus's message hooks. One handler is
//! registered per configured message kind:
//!
//! | Kind | Hook name |
//! |------|-----------|
//! | record | `record-hook` |
//! | event | `event-hook` |
//! | rpc | `rpc-hook` |
//!
//! A handler runs the router and the engine on the envelope's message. When
//! validation fails it marks the envelope `skip` and reports
//! `INVALID_MESSAGE_DATA` to the originating socket. Returning from the
//! handler is the continuation: the bus resumes processing exactly once, on
//! every path.
//!
//! ## Crate Policy
//!
//! - No validation logic here; everything is delegated to `busguard-schema`.
//! - The bus and the socket are collaborators behind traits
//!   ([`HookRegistry`], [`ErrorSink`]); this crate owns no transport.

pub mod bus;
pub mod handler;

pub use bus::{ErrorSink, HookEnvelope, HookHandler, HookRegistry, HookTable};
pub use handler::{hook_name, register_plugin, ValidationHook};

/// Error code sent to a client whose message failed validation.
pub const INVALID_MESSAGE_DATA: &str = "INVALID_MESSAGE_DATA";

/// Hook name for record writes.
pub const RECORD_HOOK: &str = "record-hook";

/// Hook name for events.
pub const EVENT_HOOK: &str = "event-hook";

/// Hook name for RPC requests.
pub const RPC_HOOK: &str = "rpc-hook";
