//! Typed form state for recording purchases, sales and expenses.
//!
//! Each form derives its running total on the client (Σ quantity × price) and
//! maps to its wire payload through a pure `to_payload` function that
//! validates first.

use crate::models::{CreateExpenseRequest, CreatePurchaseRequest, CreateSaleRequest, LineItem};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Reasons a form cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("at least one line item is required")]
    NoItems,

    #[error("line {line}: quantity must be at least 1")]
    ZeroQuantity { line: usize },

    #[error("line {line}: price cannot be negative")]
    NegativePrice { line: usize },

    #[error("a supplier is required")]
    MissingSupplier,

    #[error("expense category cannot be blank")]
    BlankCategory,

    #[error("amount cannot be negative")]
    NegativeAmount,

    #[error("invalid line item '{0}', expected VARIANT:QTY:PRICE")]
    MalformedItem(String),
}

/// One line as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemInput {
    pub variant_id: i64,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl LineItemInput {
    /// `quantity × unit_price`.
    pub fn subtotal(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

impl FromStr for LineItemInput {
    type Err = FormError;

    /// Parse `VARIANT:QTY:PRICE`, e.g. `12:3:19.99`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || FormError::MalformedItem(s.to_string());

        let mut parts = s.trim().split(':');
        let (Some(variant), Some(qty), Some(price), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        Ok(Self {
            variant_id: variant.trim().parse().map_err(|_| malformed())?,
            quantity: qty.trim().parse().map_err(|_| malformed())?,
            unit_price: price.trim().parse().map_err(|_| malformed())?,
        })
    }
}

fn items_total(items: &[LineItemInput]) -> Decimal {
    items.iter().map(LineItemInput::subtotal).sum()
}

fn validate_items(items: &[LineItemInput]) -> Result<Vec<LineItem>, FormError> {
    if items.is_empty() {
        return Err(FormError::NoItems);
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let line = i + 1;
            if item.quantity == 0 {
                return Err(FormError::ZeroQuantity { line });
            }
            if item.unit_price.is_sign_negative() {
                return Err(FormError::NegativePrice { line });
            }
            Ok(LineItem {
                variant_id: item.variant_id,
                quantity: item.quantity,
                price: item.unit_price,
            })
        })
        .collect()
}

fn wire_date(date: Option<NaiveDate>, today: NaiveDate) -> String {
    date.unwrap_or(today).format("%Y-%m-%d").to_string()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// State of the "new sale" form.
#[derive(Debug, Clone, Default)]
pub struct SaleForm {
    pub date: Option<NaiveDate>,
    pub customer: Option<String>,
    pub items: Vec<LineItemInput>,
}

impl SaleForm {
    /// Running total shown while the form is edited.
    pub fn total(&self) -> Decimal {
        items_total(&self.items)
    }

    /// Validate and map to the wire payload. A missing date means `today`.
    pub fn to_payload(&self, today: NaiveDate) -> Result<CreateSaleRequest, FormError> {
        let items = validate_items(&self.items)?;

        Ok(CreateSaleRequest {
            date: wire_date(self.date, today),
            customer: non_blank(self.customer.as_deref()),
            items,
            amount: self.total(),
        })
    }
}

/// State of the "new purchase" form.
#[derive(Debug, Clone, Default)]
pub struct PurchaseForm {
    pub supplier_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub items: Vec<LineItemInput>,
    pub note: Option<String>,
}

impl PurchaseForm {
    pub fn total(&self) -> Decimal {
        items_total(&self.items)
    }

    /// Validate and map to the wire payload. A missing date means `today`.
    pub fn to_payload(&self, today: NaiveDate) -> Result<CreatePurchaseRequest, FormError> {
        let supplier_id = self.supplier_id.ok_or(FormError::MissingSupplier)?;
        let items = validate_items(&self.items)?;

        Ok(CreatePurchaseRequest {
            supplier_id,
            date: wire_date(self.date, today),
            items,
            amount: self.total(),
            note: non_blank(self.note.as_deref()),
        })
    }
}

/// State of the "new expense" form.
#[derive(Debug, Clone, Default)]
pub struct ExpenseForm {
    pub category: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub date: Option<NaiveDate>,
}

impl ExpenseForm {
    pub fn total(&self) -> Decimal {
        self.amount
    }

    /// Validate and map to the wire payload. A missing date means `today`.
    pub fn to_payload(&self, today: NaiveDate) -> Result<CreateExpenseRequest, FormError> {
        let category = self.category.trim();
        if category.is_empty() {
            return Err(FormError::BlankCategory);
        }
        if self.amount.is_sign_negative() {
            return Err(FormError::NegativeAmount);
        }

        Ok(CreateExpenseRequest {
            category: category.to_string(),
            description: non_blank(self.description.as_deref()),
            amount: self.amount,
            date: wire_date(self.date, today),
        })
    }
}
