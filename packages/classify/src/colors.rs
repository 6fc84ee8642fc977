//! Class color palettes.
//!
//! Stops are parsed with `csscolorparser` and interpolated piecewise
//! linearly in gamma-encoded sRGB, matching chroma.js `scale(...).colors(n)`.

use palette::{Mix, Srgb};

use crate::ClassifyError;

/// An ordered list of class colors as lowercase `#rrggbb` strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<String>,
}

impl Palette {
    /// Generates `count` colors evenly spaced along `stops`.
    ///
    /// The first and last outputs are the first and last stops. When
    /// `count` equals the number of stops, the stops come back unchanged
    /// apart from hex normalization.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::EmptyPalette`] if `stops` is empty, or
    /// [`ClassifyError::InvalidColor`] if a stop cannot be parsed.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn generate<S: AsRef<str>>(stops: &[S], count: usize) -> Result<Self, ClassifyError> {
        if stops.is_empty() {
            return Err(ClassifyError::EmptyPalette);
        }

        let parsed: Vec<Srgb<f32>> = stops
            .iter()
            .map(|s| parse_to_srgb(s.as_ref()))
            .collect::<Result<_, _>>()?;

        if count == 0 {
            return Ok(Self { colors: Vec::new() });
        }

        if parsed.len() == 1 || count == 1 {
            return Ok(Self {
                colors: vec![srgb_to_hex(parsed[0]); count],
            });
        }

        let segments = parsed.len() - 1;
        let colors = (0..count)
            .map(|i| {
                let t = i as f32 / (count - 1) as f32;
                let position = t * segments as f32;
                let segment = (position.floor() as usize).min(segments - 1);
                let local = position - segment as f32;
                srgb_to_hex(parsed[segment].mix(parsed[segment + 1], local))
            })
            .collect();

        Ok(Self { colors })
    }

    /// Returns the color for class `index`.
    #[must_use]
    pub fn color(&self, index: usize) -> Option<&str> {
        self.colors.get(index).map(String::as_str)
    }

    /// Returns all colors in class order.
    #[must_use]
    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    /// Returns the number of colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Returns `true` if the palette has no colors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

fn parse_to_srgb(color: &str) -> Result<Srgb<f32>, ClassifyError> {
    let parsed = csscolorparser::parse(color).map_err(|e| ClassifyError::InvalidColor {
        color: color.to_string(),
        message: e.to_string(),
    })?;
    let [r, g, b, _] = parsed.to_rgba8();
    Ok(Srgb::new(r, g, b).into_format())
}

fn srgb_to_hex(color: Srgb<f32>) -> String {
    let c: Srgb<u8> = color.into_format();
    format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue)
}
