use image::GrayImage;
use ndarray::Array2;

/// Extracts a square grayscale patch of `size x size` centered at `(cx, cy)`,
/// clamping to image bounds at the edges.
pub fn extract_patch_gray(gray: &GrayImage, cx: u32, cy: u32, size: u32) -> Array2<f32> {
    let half = (size / 2) as i32;
    let (w, h) = gray.dimensions();
    Array2::from_shape_fn((size as usize, size as usize), |(row, col)| {
        let x = (cx as i32 - half + col as i32).clamp(0, w as i32 - 1) as u32;
        let y = (cy as i32 - half + row as i32).clamp(0, h as i32 - 1) as u32;
        gray.get_pixel(x, y)[0] as f32
    })
}

/// Histogram-of-oriented-gradients descriptor over a square patch:
/// `orientations` unsigned bins per cell, `cell_size`-pixel square cells,
/// blocks of `block_cells x block_cells` cells with L2-Hys normalization
/// (clip at 0.2, renormalize) — the standard Dalal-Triggs recipe used for
/// both the SIFT-like keypoint descriptor and the dynamic-behavior
/// classifier's feature extractor.
pub fn histogram_descriptor(patch: &Array2<f32>, orientations: usize, cell_size: u32, block_cells: u32) -> Vec<f32> {
    let (h, w) = patch.dim();
    let cells_y = h / cell_size as usize;
    let cells_x = w / cell_size as usize;

    let mut cell_hists = vec![vec![0.0_f32; orientations]; cells_y * cells_x];

    for row in 1..h.saturating_sub(1) {
        for col in 1..w.saturating_sub(1) {
            let gx = patch[[row, col + 1]] - patch[[row, col - 1]];
            let gy = patch[[row + 1, col]] - patch[[row - 1, col]];
            let magnitude = (gx * gx + gy * gy).sqrt();
            if magnitude < 1e-6 {
                continue;
            }
            // Unsigned orientation in [0, 180).
            let mut angle = gy.atan2(gx).to_degrees();
            if angle < 0.0 {
                angle += 180.0;
            }
            if angle >= 180.0 {
                angle -= 180.0;
            }

            let bin_width = 180.0 / orientations as f32;
            let bin = ((angle / bin_width) as usize).min(orientations - 1);

            let cell_row = row / cell_size as usize;
            let cell_col = col / cell_size as usize;
            if cell_row < cells_y && cell_col < cells_x {
                cell_hists[cell_row * cells_x + cell_col][bin] += magnitude;
            }
        }
    }

    let mut descriptor = Vec::new();
    if cells_y < block_cells as usize || cells_x < block_cells as usize {
        for hist in &cell_hists {
            descriptor.extend_from_slice(hist);
        }
        return l2_hys_normalize(descriptor);
    }

    for by in 0..=(cells_y - block_cells as usize) {
        for bx in 0..=(cells_x - block_cells as usize) {
            let mut block = Vec::with_capacity((block_cells * block_cells) as usize * orientations);
            for cy in by..by + block_cells as usize {
                for cx in bx..bx + block_cells as usize {
                    block.extend_from_slice(&cell_hists[cy * cells_x + cx]);
                }
            }
            descriptor.extend(l2_hys_normalize(block));
        }
    }

    descriptor
}

fn l2_hys_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
    for x in v.iter_mut() {
        *x /= norm;
    }
    for x in v.iter_mut() {
        *x = x.min(0.2);
    }
    let norm2 = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
    for x in v.iter_mut() {
        *x /= norm2;
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_patch_yields_zero_descriptor() {
        let patch = Array2::from_elem((16, 16), 100.0_f32);
        let desc = histogram_descriptor(&patch, 9, 8, 2);
        assert!(desc.iter().all(|&v| v.abs() < 1e-6));
    }

    #[test]
    fn edge_patch_yields_nonzero_descriptor() {
        let patch = Array2::from_shape_fn((16, 16), |(_, c)| if c < 8 { 0.0 } else { 255.0 });
        let desc = histogram_descriptor(&patch, 9, 8, 2);
        assert!(desc.iter().any(|&v| v.abs() > 1e-6));
    }

    #[test]
    fn descriptor_is_l2_normalized_per_block() {
        let patch = Array2::from_shape_fn((16, 16), |(r, c)| ((r + c) % 16) as f32 * 16.0);
        let desc = histogram_descriptor(&patch, 9, 8, 2);
        let norm: f32 = desc.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!(norm > 0.0 && norm.is_finite());
    }
}
