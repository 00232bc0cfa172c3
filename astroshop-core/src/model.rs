use serde::{Deserialize, Deserializer, Serialize};

const NANOS_PER_UNIT: i128 = 1_000_000_000;
const NANOS_PER_CENT: i128 = 10_000_000;

/// An amount of money in a given currency.
///
/// `units` are whole units, `nanos` the fractional part in [0, 1e9) for
/// non-negative amounts. Arithmetic is done on integers only.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub currency_code: String,
    #[serde(default)]
    pub units: i64,
    #[serde(default)]
    pub nanos: i32,
}

impl Money {
    pub fn new(currency_code: impl Into<String>, units: i64, nanos: i32) -> Self {
        Self {
            currency_code: currency_code.into(),
            units,
            nanos,
        }
    }

    pub fn zero(currency_code: impl Into<String>) -> Self {
        Self::new(currency_code, 0, 0)
    }

    /// Display-only conversion; never feed the result back into arithmetic.
    pub fn to_double(&self) -> f64 {
        self.units as f64 + f64::from(self.nanos) / 1e9
    }

    fn total_nanos(&self) -> i128 {
        i128::from(self.units) * NANOS_PER_UNIT + i128::from(self.nanos)
    }

    fn from_total_nanos(currency_code: &str, total: i128) -> Option<Self> {
        let units = i64::try_from(total / NANOS_PER_UNIT).ok()?;
        let nanos = i32::try_from(total % NANOS_PER_UNIT).ok()?;
        Some(Self::new(currency_code, units, nanos))
    }

    /// Sum of two amounts in the same currency. `None` on currency mismatch or overflow.
    pub fn checked_add(&self, other: &Money) -> Option<Money> {
        if self.currency_code != other.currency_code {
            return None;
        }
        Self::from_total_nanos(&self.currency_code, self.total_nanos() + other.total_nanos())
    }

    /// Line total for `quantity` items at this price. `None` on overflow.
    pub fn multiply(&self, quantity: i64) -> Option<Money> {
        let total = self.total_nanos().checked_mul(i128::from(quantity))?;
        Self::from_total_nanos(&self.currency_code, total)
    }

    /// Render for display, e.g. `$1,234.50`.
    ///
    /// Cents are rounded half-up from `nanos`.
    pub fn format_currency(&self) -> String {
        let total = self.total_nanos();
        let sign = if total < 0 { "-" } else { "" };
        let cents = (total.abs() + NANOS_PER_CENT / 2) / NANOS_PER_CENT;
        let whole = group_thousands(cents / 100);
        let frac = cents % 100;
        format!(
            "{sign}{}{whole}.{frac:02}",
            currency_symbol(&self.currency_code)
        )
    }
}

fn currency_symbol(code: &str) -> String {
    match code {
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" => "¥".to_string(),
        "CAD" => "CA$".to_string(),
        other => format!("{other} "),
    }
}

fn group_thousands(n: i128) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub picture: String,
    pub price_usd: Money,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
}

/// Wire wrapper for `GET /products`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ProductList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub quantity: i32,
}

impl CartItem {
    pub fn new(product_id: impl Into<String>, quantity: i32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Cart as stored by the server. An absent or null item list is empty.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerCart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<CartItem>,
}

impl ServerCart {
    pub fn total_item_count(&self) -> i64 {
        self.items.iter().map(|i| i64::from(i.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Body of `POST /cart`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub user_id: String,
    pub item: CartItem,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardInfo {
    pub credit_card_number: String,
    pub credit_card_cvv: i32,
    pub credit_card_expiration_year: i32,
    pub credit_card_expiration_month: i32,
}

/// Body of `POST /checkout`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub user_id: String,
    pub user_currency: String,
    pub address: Address,
    pub email: String,
    pub credit_card: CreditCardInfo,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub item: CartItem,
    pub cost: Money,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order_id: String,
    pub shipping_tracking_id: String,
    pub shipping_cost: Money,
    pub shipping_address: Address,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<OrderItem>,
}

impl CheckoutResponse {
    /// Sum of item costs plus shipping, if all amounts share one currency.
    pub fn total(&self) -> Option<Money> {
        self.items.iter().try_fold(self.shipping_cost.clone(), |acc, oi| {
            acc.checked_add(&oi.cost.multiply(i64::from(oi.item.quantity))?)
        })
    }
}
