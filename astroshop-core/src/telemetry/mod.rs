//! Telemetry primitives for the shop request pipeline.
//!
//! Nothing here is global. A [`Telemetry`] handle is built once by the
//! embedding application and handed to every service at construction. When
//! tracing is disabled the handle wraps [`NoopInstrumentation`], so call sites
//! never branch on whether telemetry is available.

pub mod keys;
pub mod propagation;
pub mod traced;
#[cfg(test)]
pub mod testing;

pub use keys::*;
pub use propagation::HeaderInjector;
pub use traced::{traced, traced_with_kind};

use std::fmt;
use std::sync::Arc;

use opentelemetry::Context;
use opentelemetry::propagation::{Injector, TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::trace::noop::NoopTracer;
use opentelemetry::trace::{SpanKind, TraceContextExt, Tracer};
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use reqwest::header::HeaderMap;

/// Capability the pipeline needs from a tracing backend.
///
/// Requirements:
/// - Implementations must be thread-safe (`Send + Sync`) and `'static`.
/// - Neither method may panic; a broken backend must degrade to doing nothing.
pub trait Instrumentation: Send + Sync + 'static {
    /// Start a span named `name` of `kind` as a child of `parent` and return
    /// a new context carrying it. `parent` itself is left untouched.
    fn start_span(&self, name: &'static str, kind: SpanKind, parent: &Context) -> Context;

    /// Write the propagation headers for `cx` into `injector`.
    fn inject(&self, cx: &Context, injector: &mut dyn Injector);
}

/// Instrumentation backed by a real OpenTelemetry tracer.
///
/// Propagates W3C `traceparent`/`tracestate` and W3C `baggage`.
pub struct OtelInstrumentation<T> {
    tracer: T,
    propagator: TextMapCompositePropagator,
}

impl<T> OtelInstrumentation<T> {
    pub fn new(tracer: T) -> Self {
        let propagator = TextMapCompositePropagator::new(vec![
            Box::new(TraceContextPropagator::new()),
            Box::new(BaggagePropagator::new()),
        ]);
        Self { tracer, propagator }
    }
}

impl<T> Instrumentation for OtelInstrumentation<T>
where
    T: Tracer + Send + Sync + 'static,
    T::Span: Send + Sync + 'static,
{
    fn start_span(&self, name: &'static str, kind: SpanKind, parent: &Context) -> Context {
        let span = self
            .tracer
            .span_builder(name)
            .with_kind(kind)
            .start_with_context(&self.tracer, parent);
        parent.with_span(span)
    }

    fn inject(&self, cx: &Context, injector: &mut dyn Injector) {
        self.propagator.inject_context(cx, injector);
    }
}

/// Stand-in used when telemetry is disabled or not yet initialized.
///
/// Spans are non-recording and no headers are written.
#[derive(Debug, Default)]
pub struct NoopInstrumentation {
    tracer: NoopTracer,
}

impl Instrumentation for NoopInstrumentation {
    fn start_span(&self, name: &'static str, _kind: SpanKind, parent: &Context) -> Context {
        parent.with_span(self.tracer.start_with_context(name, parent))
    }

    fn inject(&self, _cx: &Context, _injector: &mut dyn Injector) {}
}

/// Cheap, cloneable handle to the active [`Instrumentation`].
#[derive(Clone)]
pub struct Telemetry {
    inner: Arc<dyn Instrumentation>,
    enabled: bool,
}

impl Telemetry {
    pub fn new(instrumentation: impl Instrumentation) -> Self {
        Self {
            inner: Arc::new(instrumentation),
            enabled: true,
        }
    }

    /// Wrap an OpenTelemetry tracer (e.g. one handed out by an SDK tracer provider).
    pub fn from_tracer<T>(tracer: T) -> Self
    where
        T: Tracer + Send + Sync + 'static,
        T::Span: Send + Sync + 'static,
    {
        Self::new(OtelInstrumentation::new(tracer))
    }

    pub fn noop() -> Self {
        Self {
            inner: Arc::new(NoopInstrumentation::default()),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Client span for one outbound call.
    pub fn start_span(&self, name: &'static str, parent: &Context) -> Context {
        self.start_span_with_kind(name, SpanKind::Client, parent)
    }

    pub fn start_span_with_kind(
        &self,
        name: &'static str,
        kind: SpanKind,
        parent: &Context,
    ) -> Context {
        self.inner.start_span(name, kind, parent)
    }

    /// Inject the trace context (and baggage) carried by `cx` into `headers`.
    pub fn inject(&self, cx: &Context, headers: &mut HeaderMap) {
        self.inner.inject(cx, &mut HeaderInjector(headers));
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry")
            .field("enabled", &self.enabled)
            .finish()
    }
}
