//! Conversation-scoped shopping cart.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// One cart line: a product and how many units of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: u64,
    pub quantity: u32,
}

/// An in-memory cart owned by one toolbox instance.
///
/// Lines are merged by product id. Checkout takes an atomic snapshot
/// under the lock and empties the cart in the same critical section.
#[derive(Debug, Default)]
pub struct Cart {
    lines: Mutex<Vec<CartLine>>,
}

impl Cart {
    /// Add `quantity` units of a product, merging with an existing line.
    /// Returns the cart contents after the add.
    pub fn add(&self, product_id: u64, quantity: u32) -> Vec<CartLine> {
        let mut lines = self.lock();
        match lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity += quantity,
            None => lines.push(CartLine {
                product_id,
                quantity,
            }),
        }
        lines.clone()
    }

    /// Current cart contents.
    pub fn lines(&self) -> Vec<CartLine> {
        self.lock().clone()
    }

    /// Snapshot the cart and clear it.
    pub fn checkout(&self) -> Vec<CartLine> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<CartLine>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_merges_lines_by_product() {
        let cart = Cart::default();
        cart.add(1, 1);
        cart.add(2, 3);
        let lines = cart.add(1, 2);
        assert_eq!(
            lines,
            vec![
                CartLine {
                    product_id: 1,
                    quantity: 3
                },
                CartLine {
                    product_id: 2,
                    quantity: 3
                },
            ]
        );
    }

    #[test]
    fn checkout_snapshots_and_clears() {
        let cart = Cart::default();
        cart.add(7, 2);
        let snapshot = cart.checkout();
        assert_eq!(snapshot.len(), 1);
        assert!(cart.lines().is_empty());
    }
}
