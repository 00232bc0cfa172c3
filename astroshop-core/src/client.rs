use std::sync::Arc;

use opentelemetry::Context;
use tracing::info;

use crate::api::{CartApi, CheckoutApi, CurrencyApi, ProductApi, ShippingApi};
use crate::config::Config;
use crate::error::{CoreResult, ShopError};
use crate::http_client::HttpClient;
use crate::model::{
    Address, CheckoutRequest, CheckoutResponse, CreditCardInfo, Money, Product, ServerCart,
};
use crate::services::{
    ApiContext, CartService, CheckoutService, CurrencyService, ProductService, ShippingService,
};
use crate::state::{CartStore, CurrencySelection, SessionManager};
use crate::telemetry::Telemetry;

/// The shop API services plus the session and UI-facing state they share.
///
/// One `ApiContext` is built per client and cloned into each service, so
/// every call sees the same HTTP pool, telemetry and session.
#[derive(Debug, Clone)]
pub struct ShopClient {
    products: ProductService,
    cart: CartService,
    checkout: CheckoutService,
    shipping: ShippingService,
    currency: CurrencyService,
    session: SessionManager,
    selection: CurrencySelection,
    cart_store: CartStore,
    telemetry: Telemetry,
}

impl ShopClient {
    pub fn new(cfg: &Config, telemetry: Telemetry) -> CoreResult<Self> {
        let http = HttpClient::new(&cfg.http, telemetry)?;
        Self::with_parts(
            &cfg.api.base_url,
            http,
            SessionManager::new(),
            CurrencySelection::default(),
        )
    }

    /// Telemetry is taken from `http`, so spans and propagated headers
    /// always come from the same handle.
    pub fn with_parts(
        base_url: &str,
        http: HttpClient,
        session: SessionManager,
        selection: CurrencySelection,
    ) -> CoreResult<Self> {
        let telemetry = http.telemetry().clone();
        let api = ApiContext::new(base_url, http, session.clone())?;
        Ok(Self {
            products: ProductService::new(api.clone()),
            cart: CartService::new(api.clone()),
            checkout: CheckoutService::new(api.clone()),
            shipping: ShippingService::new(api.clone()),
            currency: CurrencyService::new(api),
            session,
            selection,
            cart_store: CartStore::new(),
            telemetry,
        })
    }

    pub fn products(&self) -> &ProductService {
        &self.products
    }

    pub fn cart(&self) -> &CartService {
        &self.cart
    }

    pub fn checkout_service(&self) -> &CheckoutService {
        &self.checkout
    }

    pub fn shipping(&self) -> &ShippingService {
        &self.shipping
    }

    pub fn currency(&self) -> &CurrencyService {
        &self.currency
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn selection(&self) -> &CurrencySelection {
        &self.selection
    }

    pub fn cart_store(&self) -> &CartStore {
        &self.cart_store
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Products priced in the selected currency.
    pub async fn list_products(&self, parent: &Context) -> CoreResult<Vec<Product>> {
        let currency = self.selection.current();
        self.products.list_products(&currency, parent).await
    }

    pub async fn get_product(&self, product_id: &str, parent: &Context) -> CoreResult<Product> {
        let currency = self.selection.current();
        self.products.get_product(product_id, &currency, parent).await
    }

    pub async fn list_currencies(&self, parent: &Context) -> CoreResult<Vec<String>> {
        self.currency.list_currencies(parent).await
    }

    /// Fetch the cart and publish it to the cart store.
    pub async fn refresh_cart(&self, parent: &Context) -> CoreResult<ServerCart> {
        self.cart_store.refresh(&self.cart, parent).await
    }

    /// Add an item, then refresh the cart store from the server.
    pub async fn add_to_cart(
        &self,
        product_id: &str,
        quantity: i32,
        parent: &Context,
    ) -> CoreResult<ServerCart> {
        if quantity <= 0 {
            return Err(ShopError::Validation(format!(
                "quantity must be positive, got {quantity}"
            )));
        }
        self.cart.add_item(product_id, quantity, parent).await?;
        self.refresh_cart(parent).await
    }

    pub async fn empty_cart(&self, parent: &Context) -> CoreResult<()> {
        self.cart.empty_cart(parent).await?;
        self.cart_store.clear();
        Ok(())
    }

    /// Shipping cost for the stored cart, in the selected currency.
    pub async fn shipping_quote(&self, address: &Address, parent: &Context) -> CoreResult<Money> {
        let cart = self.cart_store.snapshot();
        let currency = self.selection.current();
        self.shipping
            .get_shipping_cost(&cart.items, address, &currency, parent)
            .await
    }

    /// Place an order for the current session. On success the session is
    /// replaced and the cart store cleared; on failure both are untouched.
    pub async fn checkout(
        &self,
        address: Address,
        email: impl Into<String>,
        credit_card: CreditCardInfo,
        parent: &Context,
    ) -> CoreResult<CheckoutResponse> {
        let currency = self.selection.current();
        let request = CheckoutRequest {
            user_id: self.session.session_id().to_string(),
            user_currency: currency.clone(),
            address,
            email: email.into(),
            credit_card,
        };
        let order = self.checkout.place_order(&request, &currency, parent).await?;
        self.new_session();
        Ok(order)
    }

    /// Start over with a fresh session id and an empty local cart.
    pub fn new_session(&self) -> Arc<String> {
        let id = self.session.reset();
        self.cart_store.clear();
        info!(session_id = %id, "started new session");
        id
    }
}
