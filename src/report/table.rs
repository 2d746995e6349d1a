//! Plain-text tables for terminal output.

use crate::models::{Expense, LineItem, Product, Purchase, Sale, Supplier, Variant};
use crate::session::Theme;
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

/// How a cell should be colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Positive,
    Negative,
}

/// One table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub tone: Tone,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Plain,
        }
    }

    /// A money cell toned by its sign.
    pub fn signed(value: Decimal) -> Self {
        let tone = if value.is_sign_negative() && !value.is_zero() {
            Tone::Negative
        } else if value.is_zero() {
            Tone::Plain
        } else {
            Tone::Positive
        };
        Self {
            text: money(value),
            tone,
        }
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::plain(text)
    }
}

#[derive(Debug, Clone, Copy)]
struct Colors {
    header: &'static str,
    positive: &'static str,
    negative: &'static str,
}

/// ANSI colors for one theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    colors: Option<Colors>,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        let colors = match theme {
            Theme::Light => Colors {
                header: "\x1b[1;34m",
                positive: "\x1b[32m",
                negative: "\x1b[31m",
            },
            Theme::Dark => Colors {
                header: "\x1b[1;96m",
                positive: "\x1b[92m",
                negative: "\x1b[91m",
            },
        };
        Self {
            colors: Some(colors),
        }
    }

    /// No escape codes at all.
    pub fn plain() -> Self {
        Self { colors: None }
    }

    fn paint(&self, text: &str, pick: fn(&Colors) -> &'static str) -> String {
        match self.colors {
            Some(ref colors) => format!("{}{}\x1b[0m", pick(colors), text),
            None => text.to_string(),
        }
    }

    fn header(&self, text: &str) -> String {
        self.paint(text, |c| c.header)
    }

    fn tone(&self, text: &str, tone: Tone) -> String {
        match tone {
            Tone::Plain => text.to_string(),
            Tone::Positive => self.paint(text, |c| c.positive),
            Tone::Negative => self.paint(text, |c| c.negative),
        }
    }
}

/// Format a money amount with two decimals.
pub fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

/// Lay out `rows` under `headers` with space-padded columns.
pub fn format_table(headers: &[&str], rows: &[Vec<Cell>], palette: &Palette) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.text.chars().count();
            match widths.get_mut(i) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }

    let mut output = String::new();

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| palette.header(&pad(h, widths[i])))
        .collect();
    output.push_str(header_line.join("  ").trim_end());
    output.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&rule.join("  "));
    output.push('\n');

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| palette.tone(&pad(&cell.text, widths[i]), cell.tone))
            .collect();
        output.push_str(line.join("  ").trim_end());
        output.push('\n');
    }

    output
}

fn pad(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}

/// An entity that can be shown as one table row.
pub trait TableRow {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<Cell>;
}

/// Render a listing as a terminal table.
pub fn render_table<T: TableRow>(rows: &[T], palette: &Palette) -> String {
    if rows.is_empty() {
        return "(no records)\n".to_string();
    }
    let cells: Vec<Vec<Cell>> = rows.iter().map(TableRow::cells).collect();
    format_table(T::headers(), &cells, palette)
}

/// Render a listing as pretty JSON.
pub fn render_listing_json<T: Serialize>(rows: &[T]) -> Result<String> {
    serde_json::to_string_pretty(rows).map_err(Into::into)
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

fn opt_money(value: Option<Decimal>) -> String {
    value.map(money).unwrap_or_else(|| "-".to_string())
}

/// Recorded total, or the sum of the line items when the backend omits it.
fn record_total(amount: Option<Decimal>, items: &[LineItem]) -> Option<Decimal> {
    if amount.is_some() || items.is_empty() {
        return amount;
    }
    Some(items.iter().map(LineItem::subtotal).sum())
}

impl TableRow for Product {
    fn headers() -> &'static [&'static str] {
        &["ID", "Name", "Category", "Description"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.id.to_string().into(),
            self.name.clone().into(),
            opt(&self.category).into(),
            opt(&self.description).into(),
        ]
    }
}

impl TableRow for Variant {
    fn headers() -> &'static [&'static str] {
        &["ID", "Product", "Name", "SKU", "Price", "Cost", "Stock"]
    }

    fn cells(&self) -> Vec<Cell> {
        let stock = if self.stock <= 0 {
            Cell {
                text: self.stock.to_string(),
                tone: Tone::Negative,
            }
        } else {
            Cell::plain(self.stock.to_string())
        };

        vec![
            self.id.to_string().into(),
            self.product_id.to_string().into(),
            self.name.clone().into(),
            opt(&self.sku).into(),
            money(self.price).into(),
            opt_money(self.cost).into(),
            stock,
        ]
    }
}

impl TableRow for Supplier {
    fn headers() -> &'static [&'static str] {
        &["ID", "Name", "Contact", "Phone", "Email"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.id.to_string().into(),
            self.name.clone().into(),
            opt(&self.contact_person).into(),
            opt(&self.phone).into(),
            opt(&self.email).into(),
        ]
    }
}

impl TableRow for Purchase {
    fn headers() -> &'static [&'static str] {
        &["ID", "Date", "Supplier", "Items", "Total"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.id.to_string().into(),
            opt(&self.date).into(),
            self.supplier_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string())
                .into(),
            self.items.len().to_string().into(),
            opt_money(record_total(self.amount, &self.items)).into(),
        ]
    }
}

impl TableRow for Sale {
    fn headers() -> &'static [&'static str] {
        &["ID", "Date", "Customer", "Items", "Total"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.id.to_string().into(),
            opt(&self.date).into(),
            opt(&self.customer).into(),
            self.items.len().to_string().into(),
            opt_money(record_total(self.amount, &self.items)).into(),
        ]
    }
}

impl TableRow for Expense {
    fn headers() -> &'static [&'static str] {
        &["ID", "Date", "Category", "Description", "Amount"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.id.to_string().into(),
            opt(&self.date).into(),
            opt(&self.category).into(),
            opt(&self.description).into(),
            opt_money(self.amount).into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn expense(id: i64, category: &str, amount: &str) -> Expense {
        Expense {
            id,
            date: Some("2024-03-01".to_string()),
            category: Some(category.to_string()),
            description: None,
            amount: Some(Decimal::from_str(amount).unwrap()),
        }
    }

    #[test]
    fn test_columns_are_aligned() {
        let rows = vec![expense(1, "Rent", "1200"), expense(22, "Utilities", "45.5")];
        let table = render_table(&rows, &Palette::plain());
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID  Date"));
        assert!(lines[1].starts_with("--  ----------"));
        assert!(lines[2].contains("Rent       -            1200.00"));
        assert!(lines[3].starts_with("22  2024-03-01  Utilities"));
        assert!(lines[3].ends_with("45.50"));
    }

    #[test]
    fn test_empty_listing() {
        let rows: Vec<Expense> = Vec::new();
        assert_eq!(render_table(&rows, &Palette::plain()), "(no records)\n");
    }

    #[test]
    fn test_plain_palette_has_no_escapes() {
        let rows = vec![expense(1, "Rent", "-3")];
        assert!(!render_table(&rows, &Palette::plain()).contains('\x1b'));
    }

    #[test]
    fn test_signed_cells_are_colored_by_theme() {
        let rows = vec![vec![Cell::signed(Decimal::from(-5)), Cell::signed(Decimal::from(5))]];
        let table = format_table(&["A", "B"], &rows, &Palette::for_theme(Theme::Light));

        assert!(table.contains("\x1b[31m-5.00\x1b[0m"));
        assert!(table.contains("\x1b[32m5.00"));
        assert!(table.starts_with("\x1b[1;34m"));
    }

    #[test]
    fn test_cell_tone_for_zero() {
        assert_eq!(Cell::signed(Decimal::ZERO).tone, Tone::Plain);
        assert_eq!(Cell::signed(Decimal::ZERO).text, "0.00");
    }

    #[test]
    fn test_sale_total_falls_back_to_items() {
        let sale = Sale {
            id: 3,
            date: None,
            customer: None,
            items: vec![
                LineItem {
                    variant_id: 1,
                    quantity: 2,
                    price: Decimal::from_str("2.50").unwrap(),
                },
                LineItem {
                    variant_id: 2,
                    quantity: 1,
                    price: Decimal::from(4),
                },
            ],
            amount: None,
        };
        let cells = sale.cells();
        assert_eq!(cells[1].text, "-");
        assert_eq!(cells[3].text, "2");
        assert_eq!(cells[4].text, "9.00");
    }

    #[test]
    fn test_listing_json() {
        let rows = vec![expense(7, "Rent", "10")];
        let json = render_listing_json(&rows).unwrap();
        assert!(json.contains("\"category\": \"Rent\""));
    }
}
