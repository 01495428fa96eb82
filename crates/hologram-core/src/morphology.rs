use ndarray::Array2;

/// Offsets of an elliptical structuring element of the given diameter,
/// relative to its own center. Diameter 1 degenerates to a single pixel.
fn ellipse_offsets(kernel_size: usize) -> Vec<(i32, i32)> {
    let radius = (kernel_size as i32 - 1) / 2;
    if radius == 0 {
        return vec![(0, 0)];
    }
    let r2 = (radius * radius) as f64;
    let mut offsets = Vec::new();
    for dr in -radius..=radius {
        for dc in -radius..=radius {
            // Scale rows/cols by 1.0 (same aspect, matches cv2.getStructuringElement
            // for a near-circular element at small kernel sizes).
            if (dr * dr + dc * dc) as f64 <= r2 + 0.5 {
                offsets.push((dr, dc));
            }
        }
    }
    offsets
}

/// Binary erosion: a pixel stays `true` only if every offset of the
/// structuring element lands on a `true` pixel (out-of-bounds counts false).
pub fn erode(mask: &Array2<bool>, kernel_size: usize) -> Array2<bool> {
    let (h, w) = mask.dim();
    let offsets = ellipse_offsets(kernel_size);
    let mut result = Array2::from_elem((h, w), false);

    for row in 0..h {
        for col in 0..w {
            if !mask[[row, col]] {
                continue;
            }
            let all_true = offsets.iter().all(|&(dr, dc)| {
                let nr = row as i32 + dr;
                let nc = col as i32 + dc;
                nr >= 0
                    && nr < h as i32
                    && nc >= 0
                    && nc < w as i32
                    && mask[[nr as usize, nc as usize]]
            });
            result[[row, col]] = all_true;
        }
    }

    result
}

/// Binary dilation: a pixel becomes `true` if any offset of the structuring
/// element lands on a `true` pixel.
pub fn dilate(mask: &Array2<bool>, kernel_size: usize) -> Array2<bool> {
    let (h, w) = mask.dim();
    let offsets = ellipse_offsets(kernel_size);
    let mut result = Array2::from_elem((h, w), false);

    for row in 0..h {
        for col in 0..w {
            let any_true = offsets.iter().any(|&(dr, dc)| {
                let nr = row as i32 + dr;
                let nc = col as i32 + dc;
                nr >= 0
                    && nr < h as i32
                    && nc >= 0
                    && nc < w as i32
                    && mask[[nr as usize, nc as usize]]
            });
            result[[row, col]] = any_true;
        }
    }

    result
}

/// Opening: erosion followed by dilation. Removes small isolated foreground
/// specks while preserving the shape of larger regions.
pub fn opening(mask: &Array2<bool>, kernel_size: usize) -> Array2<bool> {
    dilate(&erode(mask, kernel_size), kernel_size)
}

/// Closing: dilation followed by erosion. Fills small holes and gaps inside
/// foreground regions.
pub fn closing(mask: &Array2<bool>, kernel_size: usize) -> Array2<bool> {
    erode(&dilate(mask, kernel_size), kernel_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_removes_single_pixel_speck() {
        let mut mask = Array2::from_elem((10, 10), false);
        mask[[5, 5]] = true;
        let opened = opening(&mask, 3);
        assert!(!opened.iter().any(|&v| v));
    }

    #[test]
    fn opening_preserves_large_block() {
        let mut mask = Array2::from_elem((10, 10), false);
        for r in 2..8 {
            for c in 2..8 {
                mask[[r, c]] = true;
            }
        }
        let opened = opening(&mask, 3);
        assert!(opened[[5, 5]]);
    }

    #[test]
    fn closing_fills_single_pixel_hole() {
        let mut mask = Array2::from_elem((10, 10), true);
        mask[[5, 5]] = false;
        let closed = closing(&mask, 3);
        assert!(closed[[5, 5]]);
    }
}
