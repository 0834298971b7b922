use std::fmt::{Display, Formatter};
use uuid::Uuid;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Converts normalized picker channels to 8-bit channels.
    ///
    /// Channels are clamped to `0.0..=1.0`, scaled by 255 and truncated, so `0.999` becomes `254` and only `1.0` reaches `255`.
    pub fn from_normalized(red: f64, green: f64, blue: f64) -> Self {
        Rgb {
            r: to_channel(red),
            g: to_channel(green),
            b: to_channel(blue),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Rgb { r, g, b })
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

fn to_channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

/// A named color the user can pick. Two choices with the same name and rgb are still different picks.
#[derive(PartialEq, Clone, Debug)]
pub struct ColorChoice {
    id: Uuid,
    name: String,
    rgb: Rgb,
}

impl ColorChoice {
    pub fn new(name: impl Into<String>, rgb: Rgb) -> Self {
        ColorChoice {
            id: Uuid::new_v4(),
            name: name.into(),
            rgb,
        }
    }

    /// A free-form color from a picker, named after its hex value.
    pub fn picked(rgb: Rgb) -> Self {
        ColorChoice::new(rgb.to_hex(), rgb)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rgb(&self) -> Rgb {
        self.rgb
    }
}

const PRESETS: [(&str, Rgb); 5] = [
    ("Warm", Rgb::new(255, 184, 144)),
    ("Cool", Rgb::new(170, 210, 255)),
    ("Red", Rgb::new(255, 64, 64)),
    ("Green", Rgb::new(80, 200, 120)),
    ("Blue", Rgb::new(96, 140, 255)),
];

/// The preset swatches offered to the user. The first one is the default selection.
#[derive(Debug, Clone)]
pub struct ColorCatalog {
    choices: Vec<ColorChoice>,
}

impl ColorCatalog {
    pub fn presets() -> Self {
        ColorCatalog {
            choices: PRESETS.iter().map(|(name, rgb)| ColorChoice::new(*name, *rgb)).collect(),
        }
    }

    pub fn default_choice(&self) -> &ColorChoice {
        &self.choices[0]
    }

    pub fn find(&self, name: &str) -> Option<&ColorChoice> {
        self.choices.iter().find(|choice| choice.name.eq_ignore_ascii_case(name))
    }

    pub fn choices(&self) -> &[ColorChoice] {
        &self.choices
    }
}
