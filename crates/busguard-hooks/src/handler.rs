//! # Validation Hooks
//!
//! [`register_plugin`] is the plugin entry point the bus calls with its hook
//! registry and the plugin options.

use std::sync::Arc;

use busguard_core::{MessageKind, ValidationError};
use busguard_schema::{lint, PluginOptions, ValidationEngine};

use crate::bus::{HookEnvelope, HookRegistry};
use crate::{EVENT_HOOK, INVALID_MESSAGE_DATA, RECORD_HOOK, RPC_HOOK};

/// The hook name a kind's handler is registered under.
pub fn hook_name(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Record => RECORD_HOOK,
        MessageKind::Event => EVENT_HOOK,
        MessageKind::Rpc => RPC_HOOK,
    }
}

/// Register one validation handler per configured kind.
///
/// `None` options register nothing, and a kind without a pattern table gets
/// no handler at all. Configuration defects found by the lint pass are
/// logged but never block registration; affected messages are rejected
/// individually at validation time.
pub fn register_plugin<R>(bus: &mut R, options: Option<PluginOptions>)
where
    R: HookRegistry + ?Sized,
{
    let Some(options) = options else {
        tracing::debug!("no plugin options, validation disabled");
        return;
    };

    for issue in lint(&options) {
        tracing::warn!(%issue, "schema configuration issue");
    }

    let kinds = options.configured_kinds();
    let engine = Arc::new(ValidationEngine::new(options));
    for kind in kinds {
        let hook = ValidationHook::new(kind, Arc::clone(&engine));
        bus.register(
            hook_name(kind),
            Box::new(move |envelope: &mut HookEnvelope<'_>| {
                hook.handle(envelope);
            }),
        );
        tracing::info!(%kind, hook = hook_name(kind), "registered validation hook");
    }
}

/// Validation handler for one message kind.
#[derive(Debug, Clone)]
pub struct ValidationHook {
    kind: MessageKind,
    engine: Arc<ValidationEngine>,
}

impl ValidationHook {
    /// Create a handler for `kind` backed by `engine`.
    pub fn new(kind: MessageKind, engine: Arc<ValidationEngine>) -> Self {
        Self { kind, engine }
    }

    /// The kind this handler validates.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Validate the envelope's message. On failure, mark the envelope
    /// `skip` and report `INVALID_MESSAGE_DATA` to its socket.
    ///
    /// Returns the validation error, if any, for callers that dispatch by
    /// hand.
    pub fn handle(&self, envelope: &mut HookEnvelope<'_>) -> Option<ValidationError> {
        let kind = self.kind;
        let outcome = self.engine.validate_message(kind, &envelope.message)?;
        metrics::counter!("busguard_messages_checked_total", "kind" => kind.as_str())
            .increment(1);

        let err = outcome.err()?;
        metrics::counter!("busguard_messages_rejected_total", "kind" => kind.as_str())
            .increment(1);
        tracing::info!(
            %kind,
            topic = %envelope.message.topic,
            identifier = envelope.message.data.first().map(String::as_str).unwrap_or_default(),
            error = %err,
            "rejected invalid message"
        );

        envelope.skip = true;
        envelope
            .socket
            .send_error(&envelope.message.topic, INVALID_MESSAGE_DATA, &err.message());
        Some(err)
    }
}
