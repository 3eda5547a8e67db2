use eframe::egui::{Color32, ColorImage};
use ndarray::Array2;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            hsl_to_color32(Hsl::new(hue, 0.75, 0.55))
        })
        .collect()
}

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Heat colormap: scalar → Color32
// ---------------------------------------------------------------------------

/// Dark purple → red → pale yellow ramp for `t` in `[0, 1]`.
pub fn heat_color(t: f32) -> Color32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let hue = 280.0 + t * 140.0; // wraps through red to yellow
    let lightness = 0.04 + 0.82 * t;
    hsl_to_color32(Hsl::new(hue % 360.0, 0.85, lightness))
}

/// Rasterise a `(rows, cols)` matrix into an image, row 0 at the bottom so
/// low frequencies / low coefficients sit at the bottom of the plot.
pub fn heatmap_image(values: &Array2<f32>, lo: f32, hi: f32) -> ColorImage {
    let (rows, cols) = values.dim();
    let mut image = ColorImage::new([cols.max(1), rows.max(1)], Color32::BLACK);
    let span = if (hi - lo).abs() > f32::EPSILON { hi - lo } else { 1.0 };
    for ((r, c), &v) in values.indexed_iter() {
        let y = rows - 1 - r;
        image.pixels[y * cols + c] = heat_color((v - lo) / span);
    }
    image
}
