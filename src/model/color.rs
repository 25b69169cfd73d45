//! Color values and color spaces carried in the graphics state.

use std::collections::HashMap;
use std::sync::LazyLock;

/// A color value in the current color space.
#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    /// Greyscale (0.0 = black, 1.0 = white)
    Gray(f64),
    Rgb(f64, f64, f64),
    Cmyk(f64, f64, f64, f64),
    /// Components in a space without a dedicated variant (Separation, Lab, ...)
    Components(Vec<f64>),
    /// A pattern color: pattern resource name plus underlying components
    /// for uncolored patterns.
    Pattern { name: String, components: Vec<f64> },
}

impl Default for Color {
    fn default() -> Self {
        Color::Gray(0.0)
    }
}

/// A color space, reduced to the surface the engine needs: a name and a
/// component count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSpace {
    pub name: String,
    pub ncomponents: usize,
}

impl ColorSpace {
    pub fn new(name: &str, ncomponents: usize) -> Self {
        Self {
            name: name.to_string(),
            ncomponents,
        }
    }

    pub fn device_gray() -> Self {
        Self::new("DeviceGray", 1)
    }

    pub fn device_rgb() -> Self {
        Self::new("DeviceRGB", 3)
    }

    pub fn device_cmyk() -> Self {
        Self::new("DeviceCMYK", 4)
    }

    /// The initial color a CS/cs operator installs for this space.
    pub fn initial_color(&self) -> Color {
        match self.name.as_str() {
            "DeviceRGB" | "CalRGB" | "Lab" => Color::Rgb(0.0, 0.0, 0.0),
            "DeviceCMYK" => Color::Cmyk(0.0, 0.0, 0.0, 1.0),
            "Pattern" => Color::Pattern {
                name: String::new(),
                components: Vec::new(),
            },
            _ => Color::Gray(0.0),
        }
    }

    /// Builds a color value from raw components, using the dedicated variant
    /// where one exists.
    pub fn color_from_components(&self, components: Vec<f64>) -> Color {
        match (self.name.as_str(), components.as_slice()) {
            ("DeviceGray" | "CalGray", &[g]) => Color::Gray(g),
            ("DeviceRGB" | "CalRGB", &[r, g, b]) => Color::Rgb(r, g, b),
            ("DeviceCMYK", &[c, m, y, k]) => Color::Cmyk(c, m, y, k),
            _ => Color::Components(components),
        }
    }
}

/// Color spaces that may be named in a content stream without a resource
/// lookup.
pub static PREDEFINED_COLORSPACE: LazyLock<HashMap<&'static str, ColorSpace>> =
    LazyLock::new(|| {
        let entries = [
            ("DeviceGray", 1),
            ("CalGray", 1),
            ("DeviceRGB", 3),
            ("CalRGB", 3),
            ("Lab", 3),
            ("DeviceCMYK", 4),
            ("Separation", 1),
            ("Indexed", 1),
            ("Pattern", 1),
        ];
        let mut map = HashMap::with_capacity(entries.len());
        for (name, n) in entries {
            map.insert(name, ColorSpace::new(name, n));
        }
        map
    });
