use std::time::{Duration, Instant};

use opentelemetry::trace::TraceContextExt;
use opentelemetry::{Context, KeyValue};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};
use url::Url;

use crate::config::HttpCfg;
use crate::error::{CoreResult, ShopError};
use crate::telemetry::{KEY_HTTP_METHOD, KEY_HTTP_STATUS, KEY_URL_FULL, Telemetry};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A fully-built outbound request: method, URL and optional JSON body.
/// Headers are added by [`HttpClient::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: Method,
    pub url: Url,
    pub body: Option<String>,
}

impl RequestSpec {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            body: None,
        }
    }

    pub fn delete(url: Url) -> Self {
        Self {
            method: Method::DELETE,
            url,
            body: None,
        }
    }

    pub fn post_json<T: Serialize + ?Sized>(url: Url, body: &T) -> CoreResult<Self> {
        Ok(Self {
            method: Method::POST,
            url,
            body: Some(serde_json::to_string(body)?),
        })
    }
}

/// Thin wrapper around reqwest::Client that propagates trace context.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    user_agent: String,
    telemetry: Telemetry,
}

impl HttpClient {
    pub fn new(cfg: &HttpCfg, telemetry: Telemetry) -> CoreResult<Self> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
            .timeout(Duration::from_millis(cfg.request_timeout_ms));
        if let Some(n) = cfg.pool_max_idle_per_host {
            builder = builder.pool_max_idle_per_host(n);
        }
        let inner = builder
            .build()
            .map_err(|e| ShopError::Other(anyhow::anyhow!("http client build failed: {e}")))?;
        Ok(Self {
            inner,
            user_agent: format!("astroshop/{}", env!("CARGO_PKG_VERSION")),
            telemetry,
        })
    }

    pub fn new_default(telemetry: Telemetry) -> CoreResult<Self> {
        Self::new(&HttpCfg::default(), telemetry)
    }

    /// The handle used to inject propagation headers.
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Send `req` and return the response body text.
    ///
    /// Trace context from `cx` is injected into the headers once, right
    /// before dispatch. Any status outside [200, 300) becomes
    /// `ShopError::HttpStatus` with the body kept verbatim. Dropping the
    /// returned future aborts the in-flight call.
    pub async fn execute(&self, req: RequestSpec, cx: &Context) -> CoreResult<String> {
        let start = Instant::now();
        let RequestSpec { method, url, body } = req;

        let mut headers = HeaderMap::new();
        if let Ok(ua) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        }
        self.telemetry.inject(cx, &mut headers);

        cx.span().set_attributes([
            KeyValue::new(KEY_HTTP_METHOD, method.to_string()),
            KeyValue::new(KEY_URL_FULL, url.to_string()),
        ]);
        debug!(method = %method, url = %url, "sending request");

        let mut builder = self.inner.request(method.clone(), url.clone()).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let resp = builder.send().await.map_err(|e| {
            warn!(method = %method, url = %url, error = %e, "request failed before a response");
            ShopError::Network(e)
        })?;

        let status = resp.status();
        cx.span()
            .set_attribute(KeyValue::new(KEY_HTTP_STATUS, i64::from(status.as_u16())));
        let text = resp.text().await.map_err(ShopError::Network)?;
        debug!(
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "received response"
        );

        if !status.is_success() {
            return Err(ShopError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    /// [`execute`](Self::execute), then decode the body as JSON.
    pub async fn execute_json<R: DeserializeOwned>(
        &self,
        req: RequestSpec,
        cx: &Context,
    ) -> CoreResult<R> {
        let text = self.execute(req, cx).await?;
        Ok(serde_json::from_str(&text)?)
    }
}
