use super::globals::{parse_leading_number, GlobalValue};
use super::RulesState;

/// Gate on an interaction. Unknown condition types always pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    HasItem { item: String, quantity: i64 },
    NotHasItem { item: String, quantity: i64 },
    VarEquals { var: String, value: String },
    VarGreaterThan { var: String, value: String },
    VarLessThan { var: String, value: String },
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Unknown(String),
}

impl Condition {
    pub fn evaluate(&self, state: &RulesState) -> bool {
        match self {
            Self::HasItem { item, quantity } => state.inventory.has(item, *quantity),
            Self::NotHasItem { item, quantity } => !state.inventory.has(item, *quantity),
            Self::VarEquals { var, value } => state
                .globals
                .get(var)
                .is_some_and(|current| current.loosely_equals(value)),
            Self::VarGreaterThan { var, value } => {
                compare_numeric(state, var, value, |current, threshold| current > threshold)
            }
            Self::VarLessThan { var, value } => {
                compare_numeric(state, var, value, |current, threshold| current < threshold)
            }
            Self::All(conditions) => conditions.iter().all(|condition| condition.evaluate(state)),
            Self::Any(conditions) => conditions.iter().any(|condition| condition.evaluate(state)),
            Self::Unknown(_) => true,
        }
    }
}

/// Missing variables count as zero; anything non-numeric makes the comparison false.
fn compare_numeric(
    state: &RulesState,
    var: &str,
    threshold: &str,
    compare: impl Fn(f64, f64) -> bool,
) -> bool {
    let Some(threshold) = parse_leading_number(threshold) else {
        return false;
    };
    let current = match state.globals.get(var) {
        Some(GlobalValue::Text(text)) if text.is_empty() => Some(0.0),
        Some(value) => value.as_number(),
        None => Some(0.0),
    };
    current.is_some_and(|current| compare(current, threshold))
}
