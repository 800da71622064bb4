/// Linear RGBA color with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const RED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);

    /// Opaque color from hue, saturation and brightness, all in `[0, 1]`.
    ///
    /// Hues outside `[0, 1]` produce black.
    pub fn hsv(hue: f32, saturation: f32, brightness: f32) -> Self {
        let c = brightness * saturation;
        let x = c * (1.0 - ((hue * 6.0) % 2.0 - 1.0).abs());
        let m = brightness - c;

        let (r, g, b) = match hue {
            h if h < 0.0 => (0.0, 0.0, 0.0),
            h if h < 1.0 / 6.0 => (c, x, 0.0),
            h if h < 2.0 / 6.0 => (x, c, 0.0),
            h if h < 3.0 / 6.0 => (0.0, c, x),
            h if h < 4.0 / 6.0 => (0.0, x, c),
            h if h < 5.0 / 6.0 => (x, 0.0, c),
            h if h <= 1.0 => (c, 0.0, x),
            _ => (0.0, 0.0, 0.0),
        };

        Self::rgb(r + m, g + m, b + m)
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<Color> for wgpu::Color {
    fn from(color: Color) -> Self {
        wgpu::Color {
            r: color.r as f64,
            g: color.g as f64,
            b: color.b as f64,
            a: color.a as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_rgb(color: Color, r: f32, g: f32, b: f32) {
        assert_abs_diff_eq!(color.r, r, epsilon = 1e-5);
        assert_abs_diff_eq!(color.g, g, epsilon = 1e-5);
        assert_abs_diff_eq!(color.b, b, epsilon = 1e-5);
        assert_eq!(color.a, 1.0);
    }

    #[test]
    fn primary_hues() {
        assert_rgb(Color::hsv(0.0, 1.0, 1.0), 1.0, 0.0, 0.0);
        assert_rgb(Color::hsv(1.0 / 3.0, 1.0, 1.0), 0.0, 1.0, 0.0);
        assert_rgb(Color::hsv(2.0 / 3.0, 1.0, 1.0), 0.0, 0.0, 1.0);
    }

    #[test]
    fn secondary_hue() {
        // Yellow sits halfway between red and green.
        assert_rgb(Color::hsv(1.0 / 6.0, 1.0, 1.0), 1.0, 1.0, 0.0);
    }

    #[test]
    fn zero_saturation_is_grey() {
        assert_rgb(Color::hsv(0.4, 0.0, 0.5), 0.5, 0.5, 0.5);
    }

    #[test]
    fn out_of_range_hue_is_black() {
        assert_rgb(Color::hsv(1.5, 1.0, 1.0), 0.0, 0.0, 0.0);
    }
}
