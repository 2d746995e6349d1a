//! Data models for the inventory console.
//!
//! Wire types for every backend entity, the `{message, data}` envelope that
//! wraps every response, and the request payloads sent when recording
//! purchases, sales and expenses.

use crate::analytics::{parse_timestamp, Dated};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Response wrapper used by every backend endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Human-readable status message.
    #[serde(default)]
    pub message: String,
    /// The payload.
    pub data: T,
}

/// Backend collections reachable through the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Resource {
    Products,
    Variants,
    Suppliers,
    Purchases,
    Sales,
    Expenses,
}

impl Resource {
    /// Path of the collection endpoint, relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Products => "products",
            Resource::Variants => "variants",
            Resource::Suppliers => "suppliers",
            Resource::Purchases => "purchases",
            Resource::Sales => "sales",
            Resource::Expenses => "expenses",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// A catalogue product. Stock lives on its variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A sellable variant of a product (size, colour, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    /// Selling price.
    #[serde(default)]
    pub price: Decimal,
    /// Last purchase cost, if known.
    #[serde(default)]
    pub cost: Option<Decimal>,
    /// Units on hand, maintained by the backend.
    #[serde(default)]
    pub stock: i64,
}

impl Variant {
    /// Whether stock is at or below `threshold`.
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.stock <= threshold
    }
}

/// A supplier purchases are made from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// One line of a purchase or sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub variant_id: i64,
    pub quantity: u32,
    /// Unit cost for purchases, unit price for sales.
    pub price: Decimal,
}

impl LineItem {
    /// `quantity × price`.
    pub fn subtotal(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price
    }
}

/// A stock purchase from a supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: i64,
    #[serde(default)]
    pub supplier_id: Option<i64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// Total cost, computed server-side.
    #[serde(default, alias = "total")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub note: Option<String>,
}

/// A customer sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// Total revenue, computed server-side.
    #[serde(default, alias = "total")]
    pub amount: Option<Decimal>,
}

/// An operating expense (rent, utilities, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

macro_rules! impl_dated {
    ($($ty:ty),*) => {
        $(
            impl Dated for $ty {
                fn timestamp(&self) -> Option<NaiveDateTime> {
                    self.date.as_deref().and_then(parse_timestamp)
                }

                fn amount(&self) -> Decimal {
                    self.amount.unwrap_or(Decimal::ZERO)
                }
            }
        )*
    };
}

impl_dated!(Sale, Purchase, Expense);

/// Payload for `POST /sales`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateSaleRequest {
    /// Format: "YYYY-MM-DD"
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    pub items: Vec<LineItem>,
    pub amount: Decimal,
}

/// Payload for `POST /purchases`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatePurchaseRequest {
    pub supplier_id: i64,
    /// Format: "YYYY-MM-DD"
    pub date: String,
    pub items: Vec<LineItem>,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Payload for `POST /expenses`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateExpenseRequest {
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub amount: Decimal,
    /// Format: "YYYY-MM-DD"
    pub date: String,
}

/// Credentials for `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Session issued by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

/// The signed-in user, as reported by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
}

impl UserInfo {
    /// Name to show in the console, falling back to the e-mail address.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}
