//! The one wrapper every remote shop operation goes through.

use std::future::Future;

use opentelemetry::trace::{SpanKind, Status, TraceContextExt};
use opentelemetry::{Context, KeyValue};
use tracing::{debug, warn};
use tracing_futures::Instrument;

use super::Telemetry;
use super::keys::{KEY_ERROR_TYPE, KEY_EXCEPTION_MESSAGE, KEY_EXCEPTION_TYPE};
use crate::error::{CoreResult, ShopError};

/// Ends the span carried by a context when dropped.
///
/// Dropping happens on every exit path: normal return, early `?` return, and
/// cancellation of the enclosing future.
struct EndOnDrop(Context);

impl Drop for EndOnDrop {
    fn drop(&mut self) {
        self.0.span().end();
    }
}

/// Run `work` inside a span named `name`, child of `parent`.
///
/// `work` receives the span's context; anything it propagates (headers,
/// nested spans) descends from this span. On success `describe` may attach
/// result attributes. On failure the span gets an error status and an
/// `exception` event, and the error is returned untouched.
pub async fn traced<T, D, F, Fut>(
    telemetry: &Telemetry,
    parent: &Context,
    name: &'static str,
    describe: D,
    work: F,
) -> CoreResult<T>
where
    D: FnOnce(&T) -> Vec<KeyValue>,
    F: FnOnce(Context) -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    traced_with_kind(telemetry, parent, name, SpanKind::Client, describe, work).await
}

/// [`traced`] with an explicit span kind, for spans that are not a single
/// outbound call (e.g. a command that fans out to several services).
pub async fn traced_with_kind<T, D, F, Fut>(
    telemetry: &Telemetry,
    parent: &Context,
    name: &'static str,
    kind: SpanKind,
    describe: D,
    work: F,
) -> CoreResult<T>
where
    D: FnOnce(&T) -> Vec<KeyValue>,
    F: FnOnce(Context) -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    let cx = telemetry.start_span_with_kind(name, kind, parent);
    let _end = EndOnDrop(cx.clone());

    let result = work(cx.clone())
        .instrument(tracing::debug_span!("shop_op", op = name))
        .await;

    match &result {
        Ok(value) => {
            cx.span().set_attributes(describe(value));
            debug!(op = name, "operation succeeded");
        }
        Err(err) => {
            record_failure(&cx, err);
            warn!(op = name, kind = err.kind(), error = %err, "operation failed");
        }
    }
    result
}

fn record_failure(cx: &Context, err: &ShopError) {
    let span = cx.span();
    span.set_status(Status::error(err.to_string()));
    span.set_attribute(KeyValue::new(KEY_ERROR_TYPE, err.kind()));
    span.add_event(
        "exception",
        vec![
            KeyValue::new(KEY_EXCEPTION_TYPE, err.kind()),
            KeyValue::new(KEY_EXCEPTION_MESSAGE, err.to_string()),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::testing::{attr, install_capture};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn success_records_described_attributes() {
        let (telemetry, capture) = install_capture();
        let out = traced(
            &telemetry,
            &Context::new(),
            "demo.ok",
            |v: &Vec<u32>| vec![KeyValue::new("app.items.count", v.len() as i64)],
            |_cx| async { Ok(vec![1, 2, 3]) },
        )
        .await
        .unwrap();
        assert_eq!(out, vec![1, 2, 3]);

        let span = capture.single("demo.ok");
        assert_eq!(span.status, Status::Unset);
        assert_eq!(attr(&span, "app.items.count").unwrap().as_str(), "3");
        assert!(span.events.events.is_empty());
    }

    #[tokio::test]
    async fn failure_sets_error_status_and_returns_same_error() {
        let (telemetry, capture) = install_capture();
        let err = traced(
            &telemetry,
            &Context::new(),
            "demo.fail",
            |_: &()| vec![],
            |_cx| async {
                Err(ShopError::HttpStatus {
                    status: 500,
                    body: "boom".into(),
                })
            },
        )
        .await
        .unwrap_err();

        match err {
            ShopError::HttpStatus { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }

        let span = capture.single("demo.fail");
        assert!(matches!(span.status, Status::Error { .. }));
        let event = &span.events.events[0];
        assert_eq!(event.name, "exception");
        assert!(event.attributes.iter().any(|kv| {
            kv.key.as_str() == KEY_EXCEPTION_TYPE && kv.value.as_str() == "HttpStatusError"
        }));
        assert!(event.attributes.iter().any(|kv| {
            kv.key.as_str() == KEY_EXCEPTION_MESSAGE && kv.value.as_str().contains("boom")
        }));
    }

    #[tokio::test]
    async fn work_sees_the_new_span_as_current() {
        let (telemetry, capture) = install_capture();
        let parent = telemetry.start_span("demo.parent", &Context::new());
        let parent_id = parent.span().span_context().span_id();

        let seen = traced(
            &telemetry,
            &parent,
            "demo.child",
            |_: &_| vec![],
            |cx| async move { Ok(cx.span().span_context().span_id()) },
        )
        .await
        .unwrap();
        parent.span().end();

        let child = capture.single("demo.child");
        assert_eq!(seen, child.span_context.span_id());
        assert_eq!(child.parent_span_id, parent_id);
    }

    #[tokio::test]
    async fn span_kind_defaults_to_client_and_can_be_internal() {
        let (telemetry, capture) = install_capture();
        let root = Context::new();
        traced_with_kind(
            &telemetry,
            &root,
            "demo.command",
            SpanKind::Internal,
            |_: &()| vec![],
            |cx| {
                let telemetry = telemetry.clone();
                async move {
                    traced(&telemetry, &cx, "demo.call", |_: &()| vec![], |_cx| async { Ok(()) })
                        .await
                }
            },
        )
        .await
        .unwrap();

        let command = capture.single("demo.command");
        let call = capture.single("demo.call");
        assert_eq!(command.span_kind, SpanKind::Internal);
        assert_eq!(call.span_kind, SpanKind::Client);
        assert_eq!(call.parent_span_id, command.span_context.span_id());
    }

    #[tokio::test]
    async fn cancellation_still_ends_span_exactly_once() {
        let (telemetry, capture) = install_capture();
        let root = Context::new();
        let fut = traced(
            &telemetry,
            &root,
            "demo.slow",
            |_: &()| vec![],
            |_cx| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            },
        );
        let timed_out = tokio::time::timeout(Duration::from_millis(20), fut).await;
        assert!(timed_out.is_err());

        assert_eq!(capture.named("demo.slow").len(), 1);
    }

    #[tokio::test]
    async fn noop_telemetry_still_runs_work_and_propagates_errors() {
        let telemetry = Telemetry::noop();
        let ran = AtomicBool::new(false);
        let ok = traced(
            &telemetry,
            &Context::new(),
            "demo.noop",
            |_: &u8| vec![],
            |_cx| async {
                ran.store(true, Ordering::SeqCst);
                Ok(7u8)
            },
        )
        .await
        .unwrap();
        assert_eq!(ok, 7);
        assert!(ran.load(Ordering::SeqCst));

        let err = traced(
            &telemetry,
            &Context::new(),
            "demo.noop",
            |_: &()| vec![],
            |_cx| async { Err(ShopError::Validation("nope".into())) },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ShopError::Validation(m) if m == "nope"));
    }
}
