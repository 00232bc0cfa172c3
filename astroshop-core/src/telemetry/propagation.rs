//! Context propagation into outbound request headers.

use opentelemetry::propagation::Injector;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Adapts a reqwest `HeaderMap` to the OpenTelemetry `Injector` carrier.
///
/// `set` replaces any existing value, so each propagation header appears
/// at most once no matter how often injection runs. Keys or values that are
/// not valid HTTP header text are dropped.
pub struct HeaderInjector<'a>(pub &'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let Ok(name) = HeaderName::try_from(key)
            && let Ok(value) = HeaderValue::from_str(&value)
        {
            self.0.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_instead_of_appending() {
        let mut headers = HeaderMap::new();
        {
            let mut injector = HeaderInjector(&mut headers);
            injector.set("traceparent", "00-aaaa-01".into());
            injector.set("traceparent", "00-bbbb-01".into());
        }
        assert_eq!(headers.get_all("traceparent").iter().count(), 1);
        assert_eq!(headers["traceparent"], "00-bbbb-01");
    }

    #[test]
    fn invalid_header_text_is_skipped() {
        let mut headers = HeaderMap::new();
        let mut injector = HeaderInjector(&mut headers);
        injector.set("bad header", "v".into());
        injector.set("baggage", "line\nbreak".into());
        assert!(headers.is_empty());
    }
}
