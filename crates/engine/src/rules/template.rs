use super::RulesState;

pub const EMPTY_INVENTORY_TEXT: &str = "Empty";

/// Expands `{inventory}`, `{item:<id>}` and `{<global>}` placeholders.
/// Unknown globals render as `0`; unterminated braces are kept verbatim.
pub fn render_template(text: &str, state: &RulesState) -> String {
    let mut rendered = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('}') else {
            rendered.push_str(&rest[open..]);
            return rendered;
        };
        let key = &after_open[..close];
        if key.is_empty() {
            rendered.push_str("{}");
        } else {
            rendered.push_str(&resolve_placeholder(key, state));
        }
        rest = &after_open[close + 1..];
    }
    rendered.push_str(rest);
    rendered
}

fn resolve_placeholder(key: &str, state: &RulesState) -> String {
    if key == "inventory" {
        return state
            .inventory
            .summary()
            .unwrap_or_else(|| EMPTY_INVENTORY_TEXT.to_string());
    }
    if let Some(item) = key.strip_prefix("item:") {
        return state.inventory.quantity(item).to_string();
    }
    state
        .globals
        .get(key)
        .map_or_else(|| "0".to_string(), ToString::to_string)
}
