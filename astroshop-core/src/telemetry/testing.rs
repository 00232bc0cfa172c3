#![cfg(test)]

use opentelemetry::Value;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider, SpanData};

use super::Telemetry;

/// Finished spans captured by an in-memory exporter.
///
/// Each call to [`install_capture`] builds its own provider, so tests running
/// in parallel never see each other's spans.
pub struct SpanCapture {
    exporter: InMemorySpanExporter,
    _provider: SdkTracerProvider,
}

impl SpanCapture {
    pub fn finished(&self) -> Vec<SpanData> {
        self.exporter.get_finished_spans().unwrap()
    }

    pub fn named(&self, name: &str) -> Vec<SpanData> {
        self.finished()
            .into_iter()
            .filter(|s| s.name == name)
            .collect()
    }

    /// The only finished span called `name`; panics if there is not exactly one.
    pub fn single(&self, name: &str) -> SpanData {
        let mut spans = self.named(name);
        assert_eq!(spans.len(), 1, "expected exactly one '{name}' span");
        spans.remove(0)
    }
}

pub fn install_capture() -> (Telemetry, SpanCapture) {
    let exporter = InMemorySpanExporter::default();
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    let telemetry = Telemetry::from_tracer(provider.tracer("astroshop-test"));
    (
        telemetry,
        SpanCapture {
            exporter,
            _provider: provider,
        },
    )
}

pub fn attr(span: &SpanData, key: &str) -> Option<Value> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.clone())
}
