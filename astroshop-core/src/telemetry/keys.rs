/// Span attribute keys for shop API calls.
/// Keep these stable; changing them is a breaking change for dashboards.
pub const KEY_SESSION_ID: &str = "session.id";

pub const KEY_HTTP_METHOD: &str = "http.request.method";
pub const KEY_URL_FULL: &str = "url.full";
pub const KEY_HTTP_STATUS: &str = "http.response.status_code";

pub const KEY_PRODUCTS_COUNT: &str = "app.products.count";
pub const KEY_PRODUCT_ID: &str = "app.product.id";
pub const KEY_PRODUCT_QUANTITY: &str = "app.product.quantity";

pub const KEY_CART_ITEMS_COUNT: &str = "app.cart.items.count";
pub const KEY_CART_TOTAL_QUANTITY: &str = "app.cart.total_quantity";
pub const KEY_CART_NOT_FOUND: &str = "app.cart.not_found";

pub const KEY_ORDER_ID: &str = "app.order.id";
pub const KEY_ORDER_ITEMS_COUNT: &str = "app.order.items.count";
pub const KEY_SHIPPING_TRACKING_ID: &str = "app.shipping.tracking_id";
pub const KEY_SHIPPING_COST_UNITS: &str = "app.shipping.cost.units";
pub const KEY_SHIPPING_COST_CURRENCY: &str = "app.shipping.cost.currency";

pub const KEY_CURRENCIES_COUNT: &str = "app.currencies.count";
pub const KEY_USER_CURRENCY: &str = "app.user.currency";

/// Error-related
pub const KEY_ERROR_TYPE: &str = "error.type";
pub const KEY_EXCEPTION_TYPE: &str = "exception.type";
pub const KEY_EXCEPTION_MESSAGE: &str = "exception.message";

/// Span names, one per remote operation.
pub const SPAN_PRODUCTS_LIST: &str = "products.list";
pub const SPAN_PRODUCTS_GET: &str = "products.get";
pub const SPAN_CART_GET: &str = "cart.get";
pub const SPAN_CART_ADD_ITEM: &str = "cart.add_item";
pub const SPAN_CART_EMPTY: &str = "cart.empty";
pub const SPAN_CHECKOUT_PLACE_ORDER: &str = "checkout.place_order";
pub const SPAN_SHIPPING_QUOTE: &str = "shipping.quote";
pub const SPAN_CURRENCY_LIST: &str = "currency.list";
