mod action;
mod condition;
mod globals;
mod inventory;
mod template;

pub use action::{Action, ActionParseError};
pub use condition::Condition;
pub use globals::{parse_leading_integer, parse_leading_number, GlobalValue, Globals};
pub use inventory::{Inventory, InventoryItem};
pub use template::{render_template, EMPTY_INVENTORY_TEXT};

/// Game-wide mutable state read by conditions and templates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RulesState {
    pub globals: Globals,
    pub inventory: Inventory,
}

impl RulesState {
    /// Adds `delta` to a global, reading a missing or non-numeric value as zero.
    pub fn add_var(&mut self, name: &str, delta: f64) -> f64 {
        let current = self
            .globals
            .get(name)
            .and_then(GlobalValue::as_number)
            .unwrap_or(0.0);
        let updated = current + delta;
        self.globals
            .insert(name.to_string(), GlobalValue::Number(updated));
        updated
    }

    pub fn set_var(&mut self, name: &str, value: &str) {
        self.globals
            .insert(name.to_string(), GlobalValue::Text(value.to_string()));
    }

    pub fn check(&self, condition: Option<&Condition>) -> bool {
        condition.map_or(true, |condition| condition.evaluate(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_var_accumulates_from_text_or_missing() {
        let mut state = RulesState::default();
        assert_eq!(state.add_var("gold", 5.0), 5.0);
        state.set_var("xp", "10");
        assert_eq!(state.add_var("xp", 2.5), 12.5);
        assert_eq!(state.globals.get("xp"), Some(&GlobalValue::Number(12.5)));
    }

    #[test]
    fn absent_condition_passes() {
        let state = RulesState::default();
        assert!(state.check(None));
    }
}
