use async_trait::async_trait;
use opentelemetry::{Context, KeyValue};

use crate::api::CurrencyApi;
use crate::error::CoreResult;
use crate::http_client::RequestSpec;
use crate::services::ApiContext;
use crate::telemetry::{KEY_CURRENCIES_COUNT, SPAN_CURRENCY_LIST, traced};

#[derive(Debug, Clone)]
pub struct CurrencyService {
    api: ApiContext,
}

impl CurrencyService {
    pub fn new(api: ApiContext) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CurrencyApi for CurrencyService {
    async fn list_currencies(&self, parent: &Context) -> CoreResult<Vec<String>> {
        let session = self.api.session().session_id();
        let url = self.api.endpoint(&["currency"], &[])?;
        let parent = self.api.with_session(parent, &session);

        traced(
            self.api.telemetry(),
            &parent,
            SPAN_CURRENCY_LIST,
            |codes: &Vec<String>| vec![KeyValue::new(KEY_CURRENCIES_COUNT, codes.len() as i64)],
            |cx| async move {
                self.api
                    .http()
                    .execute_json::<Vec<String>>(RequestSpec::get(url), &cx)
                    .await
            },
        )
        .await
    }
}
