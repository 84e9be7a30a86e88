use serde_json::{Value, json};

/// Number of distinct polygon colors; feature color indices cycle through it.
pub const PALETTE_SIZE: usize = 6;

/// Property the paint expressions read the palette slot from.
pub const COLOR_INDEX_PROPERTY: &str = "colorIndex";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Hsl {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl std::fmt::Display for Hsl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.hue, self.saturation, self.lightness)
    }
}

/// Fixed six-hue table shared by the fill and outline layers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PolygonPalette {
    pub hues: [u16; PALETTE_SIZE],
    pub saturation: u8,
    pub fill_lightness: u8,
    pub outline_lightness: u8,
    pub fill_opacity: f64,
    pub line_width: f64,
}

impl Default for PolygonPalette {
    fn default() -> Self {
        Self {
            hues: [210, 270, 330, 30, 90, 150],
            saturation: 70,
            fill_lightness: 50,
            outline_lightness: 40,
            fill_opacity: 0.3,
            line_width: 2.0,
        }
    }
}

impl PolygonPalette {
    /// Hue for a palette slot; anything out of range maps to the last entry.
    pub fn hue(&self, color_index: usize) -> u16 {
        self.hues
            .get(color_index)
            .copied()
            .unwrap_or(self.hues[PALETTE_SIZE - 1])
    }

    pub fn fill_color(&self, color_index: usize) -> Hsl {
        Hsl {
            hue: self.hue(color_index),
            saturation: self.saturation,
            lightness: self.fill_lightness,
        }
    }

    pub fn outline_color(&self, color_index: usize) -> Hsl {
        Hsl {
            hue: self.hue(color_index),
            saturation: self.saturation,
            lightness: self.outline_lightness,
        }
    }

    /// `["match", ["get", "colorIndex"], 0, c0, ..., 5, c5, fallback]`
    fn match_expression(&self, color: impl Fn(usize) -> Hsl) -> Value {
        let mut expr = vec![json!("match"), json!(["get", COLOR_INDEX_PROPERTY])];
        for i in 0..PALETTE_SIZE {
            expr.push(json!(i));
            expr.push(json!(color(i).to_string()));
        }
        expr.push(json!(color(PALETTE_SIZE - 1).to_string()));
        Value::Array(expr)
    }

    pub fn fill_paint(&self) -> Value {
        json!({
            "fill-color": self.match_expression(|i| self.fill_color(i)),
            "fill-opacity": self.fill_opacity,
        })
    }

    pub fn outline_paint(&self) -> Value {
        json!({
            "line-color": self.match_expression(|i| self.outline_color(i)),
            "line-width": self.line_width,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{PALETTE_SIZE, PolygonPalette};
    use serde_json::json;

    #[test]
    fn colors_render_as_css_hsl() {
        let p = PolygonPalette::default();
        assert_eq!(p.fill_color(0).to_string(), "hsl(210, 70%, 50%)");
        assert_eq!(p.outline_color(3).to_string(), "hsl(30, 70%, 40%)");
    }

    #[test]
    fn out_of_range_uses_last_entry() {
        let p = PolygonPalette::default();
        assert_eq!(p.hue(PALETTE_SIZE), 150);
        assert_eq!(p.hue(usize::MAX), 150);
    }

    #[test]
    fn fill_paint_is_match_expression() {
        let paint = PolygonPalette::default().fill_paint();
        assert_eq!(
            paint,
            json!({
                "fill-color": [
                    "match", ["get", "colorIndex"],
                    0, "hsl(210, 70%, 50%)",
                    1, "hsl(270, 70%, 50%)",
                    2, "hsl(330, 70%, 50%)",
                    3, "hsl(30, 70%, 50%)",
                    4, "hsl(90, 70%, 50%)",
                    5, "hsl(150, 70%, 50%)",
                    "hsl(150, 70%, 50%)"
                ],
                "fill-opacity": 0.3
            })
        );
    }

    #[test]
    fn outline_paint_uses_darker_shade() {
        let paint = PolygonPalette::default().outline_paint();
        assert_eq!(paint["line-color"][3], json!("hsl(210, 70%, 40%)"));
        assert_eq!(paint["line-width"], json!(2.0));
    }
}
