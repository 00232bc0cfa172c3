use async_trait::async_trait;
use opentelemetry::{Context, KeyValue};

use crate::api::ProductApi;
use crate::error::CoreResult;
use crate::http_client::RequestSpec;
use crate::model::{Product, ProductList};
use crate::services::ApiContext;
use crate::telemetry::{
    KEY_PRODUCT_ID, KEY_PRODUCTS_COUNT, SPAN_PRODUCTS_GET, SPAN_PRODUCTS_LIST, traced,
};

#[derive(Debug, Clone)]
pub struct ProductService {
    api: ApiContext,
}

impl ProductService {
    pub fn new(api: ApiContext) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ProductApi for ProductService {
    async fn list_products(&self, currency_code: &str, parent: &Context) -> CoreResult<Vec<Product>> {
        let session = self.api.session().session_id();
        let url = self
            .api
            .endpoint(&["products"], &[("currencyCode", currency_code)])?;
        let parent = self.api.with_session(parent, &session);

        traced(
            self.api.telemetry(),
            &parent,
            SPAN_PRODUCTS_LIST,
            |products: &Vec<Product>| {
                vec![KeyValue::new(KEY_PRODUCTS_COUNT, products.len() as i64)]
            },
            |cx| async move {
                let list: ProductList = self
                    .api
                    .http()
                    .execute_json(RequestSpec::get(url), &cx)
                    .await?;
                Ok(list.products)
            },
        )
        .await
    }

    async fn get_product(
        &self,
        product_id: &str,
        currency_code: &str,
        parent: &Context,
    ) -> CoreResult<Product> {
        let session = self.api.session().session_id();
        let url = self
            .api
            .endpoint(&["products", product_id], &[("currencyCode", currency_code)])?;
        let parent = self.api.with_session(parent, &session);

        traced(
            self.api.telemetry(),
            &parent,
            SPAN_PRODUCTS_GET,
            |p: &Product| vec![KeyValue::new(KEY_PRODUCT_ID, p.id.clone())],
            |cx| async move {
                self.api
                    .http()
                    .execute_json::<Product>(RequestSpec::get(url), &cx)
                    .await
            },
        )
        .await
    }
}
