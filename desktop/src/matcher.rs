//! Finding a template on a screen capture.
//!
//! Scores are zero-mean normalized cross-correlation in `[-1, 1]`, so a flat
//! or uniformly bright window never looks like a button. The raw correlation
//! comes from `imageproc`'s template matcher; window means and variances come
//! from its integral images.

use {
    image::{GrayImage, ImageBuffer, Luma},
    imageproc::{
        definitions::Image,
        integral_image::{integral_image, integral_squared_image},
        template_matching::{find_extremes, match_template, MatchTemplateMethod},
    },
};

/// Variances (sum of squared deviations) at or below this are treated as flat.
const FLAT_EPSILON: f64 = 1e-6;

/// A template occurrence on the searched image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Found {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub score: f32,
}

/// Finds the best position of `template` in `haystack` scoring at least `confidence`.
///
/// Equal scores are resolved in favor of the first position in row-major
/// order. Flat templates carry no pattern to correlate and are never found.
pub fn locate(haystack: &GrayImage, template: &GrayImage, confidence: f32) -> Option<Found> {
    let (width, height) = template.dimensions();
    if width == 0 || height == 0 || width > haystack.width() || height > haystack.height() {
        return None;
    }
    let scores = correlation_coefficients(haystack, template)?;
    let extremes = find_extremes(&scores);
    if extremes.max_value < confidence {
        return None;
    }
    let (x, y) = extremes.max_value_location;
    Some(Found {
        x,
        y,
        width,
        height,
        score: extremes.max_value,
    })
}

/// Score of every template position, indexed by the top-left corner.
fn correlation_coefficients(
    haystack: &GrayImage,
    template: &GrayImage,
) -> Option<Image<Luma<f32>>> {
    let (width, height) = template.dimensions();
    let n = f64::from(width) * f64::from(height);
    let template_sum: f64 = template.pixels().map(|p| f64::from(p.0[0])).sum();
    let template_sum_sq: f64 = template.pixels().map(|p| f64::from(p.0[0]).powi(2)).sum();
    let template_variance = template_sum_sq - template_sum * template_sum / n;
    if template_variance <= FLAT_EPSILON {
        return None;
    }

    let products = match_template(haystack, template, MatchTemplateMethod::CrossCorrelation);
    let sums: Image<Luma<u64>> = integral_image(haystack);
    let squares: Image<Luma<u64>> = integral_squared_image(haystack);
    let window = |table: &Image<Luma<u64>>, x: u32, y: u32| {
        let total = table.get_pixel(x + width, y + height).0[0] + table.get_pixel(x, y).0[0];
        let cut = table.get_pixel(x + width, y).0[0] + table.get_pixel(x, y + height).0[0];
        (total - cut) as f64
    };

    Some(ImageBuffer::from_fn(products.width(), products.height(), |x, y| {
        let sum = window(&sums, x, y);
        let window_variance = window(&squares, x, y) - sum * sum / n;
        if window_variance <= FLAT_EPSILON {
            return Luma([0.0]);
        }
        let numerator = f64::from(products.get_pixel(x, y).0[0]) - sum * template_sum / n;
        let score = numerator / (template_variance * window_variance).sqrt();
        Luma([score.clamp(-1.0, 1.0) as f32])
    }))
}

#[cfg(test)]
fn noise(width: u32, height: u32, seed: u32) -> GrayImage {
    let mut state = seed.max(1);
    GrayImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        image::Luma([(state >> 24) as u8])
    })
}

#[cfg(test)]
fn crop(image: &GrayImage, x: u32, y: u32, width: u32, height: u32) -> GrayImage {
    image::imageops::crop_imm(image, x, y, width, height).to_image()
}

#[test]
fn finds_small_template() {
    let haystack = noise(64, 48, 7);
    let template = crop(&haystack, 21, 17, 6, 6);

    let found = locate(&haystack, &template, 0.85).expect("template should be found");
    assert_eq!((found.x, found.y, found.width, found.height), (21, 17, 6, 6));
    assert!(found.score > 0.999, "score: {}", found.score);
}

#[test]
fn finds_large_template_at_any_offset() {
    let haystack = noise(320, 240, 99);
    for (x, y) in [(128, 96), (129, 96), (130, 98), (131, 97), (3, 201)] {
        let template = crop(&haystack, x, y, 40, 36);
        let found = locate(&haystack, &template, 0.85)
            .unwrap_or_else(|| panic!("template at ({x}, {y}) should be found"));
        assert_eq!((found.x, found.y, found.width, found.height), (x, y, 40, 36));
        assert!(found.score > 0.999, "score at ({x}, {y}): {}", found.score);
    }
}

#[test]
fn finds_one_of_repeated_buttons() {
    let button = noise(24, 12, 42);
    let mut haystack = GrayImage::from_pixel(300, 60, image::Luma([40]));
    let columns: [u32; 9] = [5, 37, 71, 102, 133, 166, 197, 231, 262];
    for x in columns {
        image::imageops::replace(&mut haystack, &button, i64::from(x), 23);
    }

    let found = locate(&haystack, &button, 0.85).expect("template should be found");
    assert!(columns.contains(&found.x), "found at {}", found.x);
    assert_eq!(found.y, 23);
}

#[test]
fn absent_template_is_not_found() {
    let haystack = noise(200, 150, 11);
    let template = GrayImage::from_fn(16, 16, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            image::Luma([255])
        } else {
            image::Luma([0])
        }
    });
    assert_eq!(locate(&haystack, &template, 0.85), None);
}

#[test]
fn uniform_screen_is_not_a_button() {
    let template = noise(24, 12, 42);
    for level in [0, 40, 200, 255] {
        let haystack = GrayImage::from_pixel(100, 80, image::Luma([level]));
        assert_eq!(locate(&haystack, &template, 0.85), None, "level {level}");
    }
}

#[test]
fn ignores_brightness_and_contrast() {
    let haystack = noise(64, 48, 3);
    let template = GrayImage::from_fn(20, 10, |x, y| {
        image::Luma([haystack.get_pixel(30 + x, 10 + y).0[0] / 2 + 60])
    });

    let found = locate(&haystack, &template, 0.85).expect("template should be found");
    assert_eq!((found.x, found.y), (30, 10));
}

#[test]
fn flat_template_is_never_found() {
    let haystack = noise(40, 30, 8);
    let template = GrayImage::from_pixel(6, 6, image::Luma([128]));
    assert_eq!(locate(&haystack, &template, 0.0), None);
}

#[test]
fn template_larger_than_screen_is_not_found() {
    let haystack = noise(10, 10, 5);
    let template = noise(11, 4, 6);
    assert_eq!(locate(&haystack, &template, 0.0), None);
}
