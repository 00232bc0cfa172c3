use std::collections::HashMap;

use anyhow::Context as _;
use astroshop_core::config::TelemetryCfg;
use astroshop_core::telemetry::Telemetry;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

/// Keeps the tracer provider alive until `shutdown` flushes it.
pub struct OtelGuard {
    provider: Option<SdkTracerProvider>,
}

impl OtelGuard {
    pub fn shutdown(self) {
        if let Some(provider) = self.provider
            && let Err(e) = provider.shutdown()
        {
            warn!(error = %e, "failed to flush spans on exit");
        }
    }
}

/// Build the telemetry handle described by `cfg`.
///
/// Export needs both `enabled = true` and an API key in `cfg.api_key_env`;
/// otherwise the handle is a no-op.
pub fn init(cfg: &TelemetryCfg) -> anyhow::Result<(Telemetry, OtelGuard)> {
    if !cfg.enabled {
        return Ok((Telemetry::noop(), OtelGuard { provider: None }));
    }
    let Some(api_key) = std::env::var(&cfg.api_key_env).ok().map(SecretString::from) else {
        warn!(env = %cfg.api_key_env, "telemetry enabled but no API key set, spans will not be exported");
        return Ok((Telemetry::noop(), OtelGuard { provider: None }));
    };

    let mut headers = HashMap::new();
    headers.insert(
        "x-honeycomb-team".to_string(),
        api_key.expose_secret().to_string(),
    );
    if let Some(dataset) = &cfg.dataset {
        headers.insert("x-honeycomb-dataset".to_string(), dataset.clone());
    }

    let endpoint = format!("{}/v1/traces", cfg.endpoint.trim_end_matches('/'));
    let exporter = SpanExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(endpoint.clone())
        .with_headers(headers)
        .build()
        .context("building OTLP span exporter")?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            Resource::builder()
                .with_service_name(cfg.service_name.clone())
                .build(),
        )
        .build();
    let telemetry = Telemetry::from_tracer(provider.tracer("astroshop"));
    info!(%endpoint, service = %cfg.service_name, "exporting traces");

    Ok((
        telemetry,
        OtelGuard {
            provider: Some(provider),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_is_noop() {
        let (telemetry, guard) = init(&TelemetryCfg::default()).unwrap();
        assert!(!telemetry.is_enabled());
        guard.shutdown();
    }

    #[test]
    fn missing_key_is_noop() {
        let cfg = TelemetryCfg {
            enabled: true,
            api_key_env: "ASTROSHOP_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..TelemetryCfg::default()
        };
        let (telemetry, guard) = init(&cfg).unwrap();
        assert!(!telemetry.is_enabled());
        guard.shutdown();
    }
}
