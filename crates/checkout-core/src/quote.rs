//! Quote Builder
//!
//! Assembles purchase line items from a cart description and computes the
//! total. All monetary values are `rust_decimal::Decimal`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};

/// A single purchase line item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Human-readable description (e.g. "Macbook air")
    pub description: String,

    /// Units purchased, strictly positive
    pub quantity: u32,

    /// Price per unit, non-negative
    pub unit_price: Decimal,
}

impl LineItem {
    /// Line subtotal: quantity × unit price
    pub fn subtotal(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

/// A validated, normalized purchase quote
///
/// Ephemeral: rebuilt per checkout session, snapshotted into the preference
/// once the intent is registered with the gateway. Construct through
/// [`QuoteBuilder`] so every item has been validated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    items: Vec<LineItem>,
}

impl Quote {
    /// Ordered line items
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Derived total: Σ(quantity × unit price)
    pub fn total(&self) -> Decimal {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    /// Description of the first line item, used as the payment description
    /// when the form does not supply one
    pub fn summary(&self) -> String {
        match self.items.as_slice() {
            [only] => only.description.clone(),
            [first, rest @ ..] => format!("{} (+{} more)", first.description, rest.len()),
            [] => String::new(),
        }
    }
}

/// Validating builder for [`Quote`]
#[derive(Debug, Default)]
pub struct QuoteBuilder {
    items: Vec<LineItem>,
}

impl QuoteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line item; validation happens in [`Self::build`]
    #[must_use]
    pub fn item(mut self, description: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        self.items.push(LineItem {
            description: description.into(),
            quantity,
            unit_price,
        });
        self
    }

    /// Validate every item and produce the normalized quote
    pub fn build(self) -> Result<Quote> {
        if self.items.is_empty() {
            return Err(CheckoutError::Validation {
                field: "items".into(),
                message: "quote must contain at least one item".into(),
            });
        }

        for (idx, item) in self.items.iter().enumerate() {
            if item.description.trim().is_empty() {
                return Err(CheckoutError::Validation {
                    field: format!("items[{idx}].description"),
                    message: "description must not be empty".into(),
                });
            }
            if item.quantity == 0 {
                return Err(CheckoutError::Validation {
                    field: format!("items[{idx}].quantity"),
                    message: "quantity must be greater than zero".into(),
                });
            }
            if item.unit_price < Decimal::ZERO {
                return Err(CheckoutError::Validation {
                    field: format!("items[{idx}].unit_price"),
                    message: "unit price must not be negative".into(),
                });
            }
        }

        Ok(Quote { items: self.items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn total_is_sum_of_quantity_times_price() {
        let quote = QuoteBuilder::new()
            .item("Macbook air", 1, dec!(1200))
            .item("USB-C cable", 3, dec!(9.99))
            .build()
            .unwrap();

        assert_eq!(quote.total(), dec!(1229.97));
    }

    #[test]
    fn zero_price_items_are_allowed() {
        let quote = QuoteBuilder::new()
            .item("Free sticker", 5, dec!(0))
            .build()
            .unwrap();
        assert_eq!(quote.total(), dec!(0));
    }

    #[test]
    fn rejects_zero_quantity() {
        let err = QuoteBuilder::new()
            .item("Macbook air", 0, dec!(1200))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Validation { ref field, .. } if field == "items[0].quantity"
        ));
    }

    #[test]
    fn rejects_negative_price() {
        let err = QuoteBuilder::new()
            .item("Macbook air", 1, dec!(-1))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Validation { ref field, .. } if field == "items[0].unit_price"
        ));
    }

    #[test]
    fn rejects_empty_quote() {
        let err = QuoteBuilder::new().build().unwrap_err();
        assert!(matches!(err, CheckoutError::Validation { ref field, .. } if field == "items"));
    }

    #[test]
    fn summary_names_the_first_item() {
        let quote = QuoteBuilder::new()
            .item("Macbook air", 1, dec!(1200))
            .item("Sleeve", 1, dec!(25))
            .build()
            .unwrap();
        assert_eq!(quote.summary(), "Macbook air (+1 more)");
    }
}
