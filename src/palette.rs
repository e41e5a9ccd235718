use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn from_hex(hex: u32) -> Self {
        Rgb(
            ((hex >> 16) & 0xff) as u8,
            ((hex >> 8) & 0xff) as u8,
            (hex & 0xff) as u8,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamedColor {
    pub name: &'static str,
    pub rgb: Rgb,
}

const fn named(name: &'static str, hex: u32) -> NamedColor {
    NamedColor {
        name,
        rgb: Rgb::from_hex(hex),
    }
}

/// Alphabet for the sequence games
pub const SIGNAL_COLORS: [NamedColor; 6] = [
    named("Red", 0xFF4136),
    named("Green", 0x2ECC40),
    named("Yellow", 0xFFDC00),
    named("Blue", 0x0074D9),
    named("Purple", 0xB10DC9),
    named("Orange", 0xFF851B),
];

/// Card colors for the classic game, in dealing order
pub const CARD_COLORS: [NamedColor; 8] = [
    named("Cyan", 0x7FDBFF),
    named("Yellow", 0xFFDC00),
    named("Red", 0xFF4136),
    named("Purple", 0xB10DC9),
    named("Green", 0x2ECC40),
    named("Orange", 0xFF851B),
    named("Lime", 0x01FF70),
    named("Magenta", 0xF012BE),
];

/// Hue in degrees, saturation and lightness in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hsl {
    pub h: u16,
    pub s: u8,
    pub l: u8,
}

impl Hsl {
    pub fn new(h: u16, s: u8, l: u8) -> Self {
        Self {
            h: h % 360,
            s: s.min(100),
            l: l.min(100),
        }
    }

    pub fn to_rgb(self) -> Rgb {
        let s = self.s as f64 / 100.0;
        let l = self.l as f64 / 100.0;
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let h = self.h as f64 / 60.0;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match self.h / 60 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb(channel(r), channel(g), channel(b))
    }
}

impl std::fmt::Display for Hsl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.h, self.s, self.l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        assert_eq!(Rgb::from_hex(0xFF4136), Rgb(255, 65, 54));
        assert_eq!(SIGNAL_COLORS[3].rgb, Rgb(0, 116, 217));
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(Hsl::new(0, 100, 50).to_rgb(), Rgb(255, 0, 0));
        assert_eq!(Hsl::new(120, 100, 50).to_rgb(), Rgb(0, 255, 0));
        assert_eq!(Hsl::new(240, 100, 50).to_rgb(), Rgb(0, 0, 255));
        assert_eq!(Hsl::new(0, 0, 100).to_rgb(), Rgb(255, 255, 255));
    }

    #[test]
    fn hsl_wraps_hue() {
        assert_eq!(Hsl::new(370, 50, 50).h, 10);
        assert_eq!(Hsl::new(10, 60, 40).to_string(), "hsl(10, 60%, 40%)");
    }
}
