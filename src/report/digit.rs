use crate::MNIST_HW;

/// Pixels whose 0..255 value is at least this are drawn filled.
const INK_THRESHOLD: f64 = 220.0;

/// Renders a 28x28 image as text, two characters per pixel so the digit
/// keeps its aspect ratio in a terminal.
pub fn render_digit(image: &[f64]) -> String {
    let mut out = String::with_capacity(MNIST_HW * (MNIST_HW * 2 * 3 + 1));
    for row in image.chunks(MNIST_HW).take(MNIST_HW) {
        for &px in row {
            let value = (255.0 * px).round();
            out.push_str(if value >= INK_THRESHOLD { "██" } else { "░░" });
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NINPUT;

    #[test]
    fn renders_one_line_per_pixel_row() {
        let mut image = vec![0.0; NINPUT];
        image[0] = 1.0;
        image[MNIST_HW + 1] = 0.9;
        image[2 * MNIST_HW] = 0.5;

        let text = render_digit(&image);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), MNIST_HW);
        assert!(lines.iter().all(|l| l.chars().count() == 2 * MNIST_HW));
        assert!(lines[0].starts_with("████░░"));
        assert!(lines[1].starts_with("░░██"));
        assert!(lines[2].starts_with("░░░░"));
    }
}
