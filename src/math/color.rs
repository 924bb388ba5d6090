/// HSL to RGB, all components in [0, 1]
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    if s <= 0.0 {
        return [l, l, l];
    }

    let p = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let q = 2.0 * l - p;

    [
        hue_to_channel(q, p, h + 1.0 / 3.0),
        hue_to_channel(q, p, h),
        hue_to_channel(q, p, h - 1.0 / 3.0),
    ]
}

fn hue_to_channel(q: f32, p: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);

    if t < 1.0 / 6.0 {
        q + (p - q) * 6.0 * t
    } else if t < 0.5 {
        p
    } else if t < 2.0 / 3.0 {
        q + (p - q) * 6.0 * (2.0 / 3.0 - t)
    } else {
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 0.01)
    }

    #[test]
    fn test_hsl_to_rgb_red() {
        assert!(close(hsl_to_rgb(0.0, 1.0, 0.5), [1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_hsl_to_rgb_blue() {
        assert!(close(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_hsl_to_rgb_grey() {
        assert!(close(hsl_to_rgb(0.3, 0.0, 0.4), [0.4, 0.4, 0.4]));
    }

    #[test]
    fn test_hsl_to_rgb_white() {
        assert!(close(hsl_to_rgb(0.7, 0.7, 1.0), [1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_backdrop_palette_is_blue_purple() {
        // Hues used by the floating shapes
        for h in [0.6, 0.75, 0.9] {
            let [r, g, b] = hsl_to_rgb(h, 0.7, 0.6);
            assert!(b >= g, "hue {} should lean blue, got {:?}", h, [r, g, b]);
            for c in [r, g, b] {
                assert!((0.0..=1.0).contains(&c));
            }
        }
    }
}
