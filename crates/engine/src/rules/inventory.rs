use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub quantity: i64,
}

/// Ordered item stacks. Each id appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: Vec<InventoryItem>,
}

impl Inventory {
    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Stacks onto an existing entry or appends a new one. Returns the new total.
    pub fn add(&mut self, id: &str, quantity: i64) -> i64 {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.quantity += quantity;
            return item.quantity;
        }
        self.items.push(InventoryItem {
            id: id.to_string(),
            quantity,
        });
        quantity
    }

    /// Returns false when the item is absent. Entries at or below zero are dropped.
    pub fn remove(&mut self, id: &str, quantity: i64) -> bool {
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            warn!(item = id, "inventory_item_missing");
            return false;
        };
        self.items[index].quantity -= quantity;
        if self.items[index].quantity <= 0 {
            self.items.remove(index);
        }
        true
    }

    pub fn has(&self, id: &str, quantity: i64) -> bool {
        self.items
            .iter()
            .any(|item| item.id == id && item.quantity >= quantity)
    }

    pub fn quantity(&self, id: &str) -> i64 {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map_or(0, |item| item.quantity)
    }

    /// `"id xN, id xN"`, or `None` when empty.
    pub fn summary(&self) -> Option<String> {
        if self.items.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .items
            .iter()
            .map(|item| format!("{} x{}", item.id, item.quantity))
            .collect();
        Some(parts.join(", "))
    }
}
