pub type Rgba = [u8; 4];

pub const BLACK: Rgba = [0, 0, 0, 255];
pub const WHITE: Rgba = [255, 255, 255, 255];

/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`/`rgba(..)` and a few
/// colour names. Anything else is `None` and callers pick their fallback.
pub fn parse_color(raw: &str) -> Option<Rgba> {
    let text = raw.trim();
    if let Some(hex) = text.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = text.to_ascii_lowercase();
    if let Some(args) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_functional(args);
    }
    named(&lower)
}

pub fn color_or(raw: Option<&str>, fallback: Rgba) -> Rgba {
    raw.and_then(parse_color).unwrap_or(fallback)
}

/// Moves each channel toward black (`amount < 0`) or white (`amount > 0`).
pub fn shade(color: Rgba, amount: f64) -> Rgba {
    let target = if amount < 0.0 { 0.0 } else { 255.0 };
    let factor = amount.abs().min(1.0);
    let mix = |channel: u8| {
        let channel = channel as f64;
        (channel + (target - channel) * factor).round().clamp(0.0, 255.0) as u8
    };
    [mix(color[0]), mix(color[1]), mix(color[2]), color[3]]
}

pub fn with_alpha(color: Rgba, alpha: f64) -> Rgba {
    let alpha = (color[3] as f64 * alpha.clamp(0.0, 1.0)).round() as u8;
    [color[0], color[1], color[2], alpha]
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |index: usize| u8::from_str_radix(&hex[index..=index], 16).ok();
    let byte = |index: usize| u8::from_str_radix(&hex[index..index + 2], 16).ok();
    match hex.len() {
        3 => Some([nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17, 255]),
        6 => Some([byte(0)?, byte(2)?, byte(4)?, 255]),
        8 => Some([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
        _ => None,
    }
}

fn parse_functional(args: &str) -> Option<Rgba> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |part: &str| part.parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8);
    let alpha = match parts.get(3) {
        Some(part) => (part.parse::<f64>().ok()?.clamp(0.0, 1.0) * 255.0).round() as u8,
        None => 255,
    };
    Some([channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, alpha])
}

fn named(name: &str) -> Option<Rgba> {
    let color = match name {
        "black" => BLACK,
        "white" => WHITE,
        "red" => [255, 0, 0, 255],
        "green" => [0, 128, 0, 255],
        "blue" => [0, 0, 255, 255],
        "yellow" => [255, 255, 0, 255],
        "orange" => [255, 165, 0, 255],
        "gray" | "grey" => [128, 128, 128, 255],
        "transparent" => [0, 0, 0, 0],
        _ => return None,
    };
    Some(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_forms_parse() {
        assert_eq!(parse_color("#F0F"), Some([255, 0, 255, 255]));
        assert_eq!(parse_color("#1a2B3c"), Some([0x1a, 0x2b, 0x3c, 255]));
        assert_eq!(parse_color("#00000080"), Some([0, 0, 0, 128]));
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("#GGG"), None);
    }

    #[test]
    fn functional_and_named_forms_parse() {
        assert_eq!(parse_color("rgba(0, 0, 0, 0.5)"), Some([0, 0, 0, 128]));
        assert_eq!(parse_color("rgb(10,20,30)"), Some([10, 20, 30, 255]));
        assert_eq!(parse_color("White"), Some(WHITE));
        assert_eq!(parse_color("chartreuse-ish"), None);
        assert_eq!(color_or(None, BLACK), BLACK);
    }

    #[test]
    fn shade_darkens_and_lightens() {
        assert_eq!(shade([200, 100, 50, 255], -0.4), [120, 60, 30, 255]);
        assert_eq!(shade([0, 0, 0, 255], 0.5), [128, 128, 128, 255]);
        assert_eq!(with_alpha(WHITE, 0.5)[3], 128);
    }
}
