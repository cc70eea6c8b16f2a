//! Cart store: the single source of truth for selected items and pricing.
//!
//! The store owns the ordered list of [`CartLine`]s. Every mutation is
//! followed by a write to durable storage; every total is derived fresh from
//! the current lines at read time, never cached. The checkout orchestrator
//! only ever reads a [`CartSnapshot`] and calls [`CartStore::clear`] after a
//! verified payment.

pub mod storage;

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crave_dine_core::ItemId;

use crate::notify::Notifier;
use storage::{CartStorage, StoredLine};

/// Flat delivery fee charged on any non-empty cart, in currency units.
#[must_use]
pub fn delivery_fee_amount() -> Decimal {
    Decimal::new(5000, 2) // 50.00
}

/// Tax rate applied to the subtotal.
#[must_use]
pub fn tax_rate() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

/// A menu item offered for adding to the cart.
///
/// Name and price are captured at add time and not re-synced if the catalog
/// changes later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub id: ItemId,
    pub name: String,
    pub price: Decimal,
}

/// One purchasable line in the cart, keyed by item id.
///
/// `name` and `dish_name` always carry the same value; both are persisted
/// for compatibility with documents written by older clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "dishName")]
    pub dish_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    /// Line total: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Derived totals computed from the current lines at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    /// Number of distinct lines, not the sum of quantities.
    pub item_count: usize,
}

/// Sole owner of cart state.
pub struct CartStore {
    lines: Vec<CartLine>,
    storage: Box<dyn CartStorage>,
    notifier: Arc<dyn Notifier>,
}

impl CartStore {
    /// Open the cart, loading any persisted lines.
    ///
    /// Missing or corrupt persisted data starts an empty cart; it never
    /// fails the caller.
    pub fn open(storage: Box<dyn CartStorage>, notifier: Arc<dyn Notifier>) -> Self {
        let lines = match storage.load() {
            Ok(stored) => normalize(stored),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load persisted cart, starting empty");
                Vec::new()
            }
        };
        Self {
            lines,
            storage,
            notifier,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a menu item to the cart, or bump its quantity if already present.
    ///
    /// Candidates with an empty name or non-positive price are refused with
    /// a warning notice and no state change, as is a zero quantity.
    pub fn add_item(&mut self, candidate: &MenuItem, quantity: u32) {
        if candidate.name.trim().is_empty() || candidate.price <= Decimal::ZERO {
            self.notifier
                .warning("Cannot add item to cart: missing name or price.");
            return;
        }
        if quantity == 0 {
            self.notifier
                .warning("Cannot add item to cart: quantity must be at least 1.");
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|line| line.id == candidate.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.lines.push(CartLine {
                id: candidate.id.clone(),
                name: candidate.name.clone(),
                dish_name: candidate.name.clone(),
                price: candidate.price,
                quantity,
            });
        }
        self.notifier
            .success(&format!("{quantity} x {} added to cart!", candidate.name));
        self.persist();
    }

    /// Remove the line with the given id. Notifies even when the id was not
    /// present.
    pub fn remove_item(&mut self, id: &ItemId) {
        self.lines.retain(|line| &line.id != id);
        self.notifier.info("Item removed from cart.");
        self.persist();
    }

    /// Replace a line's quantity. A quantity of zero removes the line.
    pub fn set_quantity(&mut self, id: &ItemId, quantity: u32) {
        if quantity == 0 {
            self.remove_item(id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|line| &line.id == id) {
            line.quantity = quantity;
            self.persist();
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.notifier.success("Cart cleared!");
        self.persist();
    }

    // =========================================================================
    // Derived reads
    // =========================================================================

    /// Current lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of distinct lines in the cart.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Flat fee for any non-empty cart, zero otherwise.
    #[must_use]
    pub fn delivery_fee(&self) -> Decimal {
        if self.lines.is_empty() {
            Decimal::ZERO
        } else {
            delivery_fee_amount()
        }
    }

    /// 5% of the subtotal.
    #[must_use]
    pub fn tax(&self) -> Decimal {
        self.subtotal() * tax_rate()
    }

    /// Subtotal plus delivery fee plus tax.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.subtotal() + self.delivery_fee() + self.tax()
    }

    /// All derived totals plus a copy of the current lines.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
            subtotal: self.subtotal(),
            delivery_fee: self.delivery_fee(),
            tax: self.tax(),
            total: self.total(),
            item_count: self.item_count(),
        }
    }

    /// Write the current lines to durable storage, swallowing faults.
    fn persist(&self) {
        if let Err(e) = self.storage.save(&self.lines) {
            tracing::warn!(error = %e, "failed to persist cart");
        }
    }
}

/// Normalize persisted lines into canonical [`CartLine`]s.
///
/// Older documents carry only one of `name`/`dishName`; both fields are
/// populated from whichever is present. Lines missing both names, missing a
/// price, or with a zero quantity are dropped.
fn normalize(stored: Vec<StoredLine>) -> Vec<CartLine> {
    stored
        .into_iter()
        .filter_map(|line| {
            let name = line.dish_name.clone().or(line.name.clone())?;
            let price = line.price?;
            if line.quantity == 0 {
                return None;
            }
            Some(CartLine {
                id: line.id,
                name: name.clone(),
                dish_name: name,
                price,
                quantity: line.quantity,
            })
        })
        .collect()
}
