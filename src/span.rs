//! Scoped span finalization.

use opentelemetry::trace::Span;
use opentelemetry::KeyValue;

/// Owns a started span and ends it when dropped.
///
/// The traced handle starts a span before delegating and must finish it on
/// every exit path, including error returns. Holding the span in this guard
/// makes the finish step structural rather than something each call site has
/// to remember. Tag operations are infallible, so nothing between start and
/// finish can skip the finish step.
pub(crate) struct SpanGuard<S: Span> {
    span: Option<S>,
}

impl<S: Span> SpanGuard<S> {
    pub(crate) fn new(span: S) -> Self {
        Self { span: Some(span) }
    }

    /// Tag the span with a key/value attribute.
    pub(crate) fn record(&mut self, attribute: KeyValue) {
        if let Some(span) = self.span.as_mut() {
            span.set_attribute(attribute);
        }
    }

    /// Tag the span with an error description.
    pub(crate) fn record_error(&mut self, err: &impl std::fmt::Display) {
        self.record(KeyValue::new("error", err.to_string()));
    }
}

impl<S: Span> Drop for SpanGuard<S> {
    fn drop(&mut self) {
        if let Some(mut span) = self.span.take() {
            span.end();
        }
    }
}
