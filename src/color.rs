use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

fn hsl_to_color32(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0).round() as u8,
        (rgb.green * 255.0).round() as u8,
        (rgb.blue * 255.0).round() as u8,
    )
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
///
/// Used for overlay lines, starting from blue-green.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| hsl_to_color32((160.0 + (i as f32 / n as f32) * 360.0) % 360.0, 0.65, 0.5))
        .collect()
}

// ---------------------------------------------------------------------------
// Sign colours for anomaly bars
// ---------------------------------------------------------------------------

/// Warm colour for positive anomalies, cool colour for negative ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignPalette {
    pub positive: Color32,
    pub negative: Color32,
}

impl Default for SignPalette {
    fn default() -> Self {
        Self {
            positive: hsl_to_color32(0.0, 0.8, 0.5),
            negative: hsl_to_color32(220.0, 0.8, 0.5),
        }
    }
}

impl SignPalette {
    /// Pick the colour for a value. Zero counts as positive.
    pub fn color_for(&self, value: f64) -> Color32 {
        if value < 0.0 {
            self.negative
        } else {
            self.positive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_colours() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(5);
        assert_eq!(p.len(), 5);
        for (i, a) in p.iter().enumerate() {
            for b in &p[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn sign_colours_are_red_and_blue() {
        let s = SignPalette::default();
        assert!(s.positive.r() > s.positive.b());
        assert!(s.negative.b() > s.negative.r());
        assert_eq!(s.color_for(-0.1), s.negative);
        assert_eq!(s.color_for(0.0), s.positive);
    }
}
