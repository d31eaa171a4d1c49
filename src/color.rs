//! CSS color literals for the border overlay
//!
//! Supports `#rgb`, `#rrggbb`, `#rrggbbaa` (alpha ignored; the overlay is
//! opaque), `rgb(r, g, b)` / `rgba(r, g, b, a)`, and bare color names, which
//! are left for the X server to resolve.

/// Parsed border color
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssColor {
    Rgb { red: u8, green: u8, blue: u8 },
    Named(String),
}

impl CssColor {
    /// Returns `None` for anything that can't describe a visible color
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }

        let lower = s.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_rgb_function(args);
        }

        if !s.is_empty()
            && lower != "transparent"
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ')
        {
            return Some(CssColor::Named(lower));
        }

        None
    }

    /// 16-bit channels as X11 AllocColor expects them
    pub fn to_x11_channels(&self) -> Option<(u16, u16, u16)> {
        match self {
            CssColor::Rgb { red, green, blue } => Some((
                u16::from(*red) * 257,
                u16::from(*green) * 257,
                u16::from(*blue) * 257,
            )),
            CssColor::Named(_) => None,
        }
    }
}

fn parse_hex(hex: &str) -> Option<CssColor> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    let doubled = |c: &str| channel(c.repeat(2).as_str());

    let (red, green, blue) = match hex.len() {
        3 | 4 => (doubled(&hex[0..1])?, doubled(&hex[1..2])?, doubled(&hex[2..3])?),
        6 | 8 => (channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?),
        _ => return None,
    };
    Some(CssColor::Rgb { red, green, blue })
}

fn parse_rgb_function(args: &str) -> Option<CssColor> {
    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c == ' ' || c == '/')
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let component = |p: &str| -> Option<u8> {
        if let Some(pct) = p.strip_suffix('%') {
            let v: f64 = pct.parse().ok()?;
            Some((v.clamp(0.0, 100.0) * 255.0 / 100.0).round() as u8)
        } else {
            let v: f64 = p.parse().ok()?;
            Some(v.clamp(0.0, 255.0).round() as u8)
        }
    };

    Some(CssColor::Rgb {
        red: component(parts[0])?,
        green: component(parts[1])?,
        blue: component(parts[2])?,
    })
}
