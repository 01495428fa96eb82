use crate::frame::Frame;

use super::homography::Homography;

/// Bilinearly samples a BGR frame at fractional coordinates, returning
/// black (0,0,0) for samples that fall outside the frame.
pub fn bilinear_sample_bgr(frame: &Frame, x: f64, y: f64) -> [f32; 3] {
    let (h, w) = (frame.height(), frame.width());

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    let fx = (x - x0 as f64) as f32;
    let fy = (y - y0 as f64) as f32;

    let sample = |r: i64, c: i64| -> [f32; 3] {
        if r >= 0 && r < h as i64 && c >= 0 && c < w as i64 {
            let p = frame.pixel(r as usize, c as usize);
            [p[0] as f32, p[1] as f32, p[2] as f32]
        } else {
            [0.0, 0.0, 0.0]
        }
    };

    let v00 = sample(y0, x0);
    let v10 = sample(y0, x1);
    let v01 = sample(y1, x0);
    let v11 = sample(y1, x1);

    let mut out = [0.0_f32; 3];
    for ch in 0..3 {
        out[ch] = v00[ch] * (1.0 - fx) * (1.0 - fy)
            + v10[ch] * fx * (1.0 - fy)
            + v01[ch] * (1.0 - fx) * fy
            + v11[ch] * fx * fy;
    }
    out
}

/// Warps `frame` into the reference frame's coordinate system using the
/// inverse mapping defined by `homography` (which maps target -> reference,
/// so for each reference pixel we invert to find its source location).
///
/// Uses row-level Rayon parallelism once the output exceeds
/// [`crate::consts::PARALLEL_PIXEL_THRESHOLD`] pixels.
pub fn warp_frame(frame: &Frame, homography: &Homography, out_height: usize, out_width: usize) -> Frame {
    use rayon::prelude::*;

    let inverse = match homography.0.try_inverse() {
        Some(inv) => Homography(inv),
        None => return Frame::zeros(out_height, out_width),
    };

    let total = out_height * out_width;
    let mut data = ndarray::Array3::<u8>::zeros((out_height, out_width, 3));

    if total >= crate::consts::PARALLEL_PIXEL_THRESHOLD {
        let rows: Vec<Vec<[u8; 3]>> = (0..out_height)
            .into_par_iter()
            .map(|row| {
                (0..out_width)
                    .map(|col| warp_pixel(frame, &inverse, row, col))
                    .collect()
            })
            .collect();
        for (row, row_data) in rows.into_iter().enumerate() {
            for (col, px) in row_data.into_iter().enumerate() {
                data[[row, col, 0]] = px[0];
                data[[row, col, 1]] = px[1];
                data[[row, col, 2]] = px[2];
            }
        }
    } else {
        for row in 0..out_height {
            for col in 0..out_width {
                let px = warp_pixel(frame, &inverse, row, col);
                data[[row, col, 0]] = px[0];
                data[[row, col, 1]] = px[1];
                data[[row, col, 2]] = px[2];
            }
        }
    }

    Frame::new(data)
}

fn warp_pixel(frame: &Frame, inverse: &Homography, row: usize, col: usize) -> [u8; 3] {
    let (sx, sy) = inverse.apply(col as f64, row as f64);
    if !sx.is_finite() || !sy.is_finite() {
        return [0, 0, 0];
    }
    let sampled = bilinear_sample_bgr(frame, sx, sy);
    [
        sampled[0].round().clamp(0.0, 255.0) as u8,
        sampled[1].round().clamp(0.0, 255.0) as u8,
        sampled[2].round().clamp(0.0, 255.0) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;

    #[test]
    fn identity_homography_leaves_frame_unchanged() {
        let mut frame = Frame::zeros(10, 10);
        frame.data[[5, 5, 2]] = 200;
        let warped = warp_frame(&frame, &Homography::identity(), 10, 10);
        assert_eq!(warped.data[[5, 5, 2]], 200);
    }

    #[test]
    fn translation_homography_shifts_content() {
        let mut frame = Frame::zeros(20, 20);
        frame.data[[5, 5, 2]] = 255;
        // Maps target coords to reference coords shifted by (+2, +3): a
        // pixel at reference (7, 8) should sample target (5, 5).
        #[rustfmt::skip]
        let h = Homography(Matrix3::new(
            1.0, 0.0, 2.0,
            0.0, 1.0, 3.0,
            0.0, 0.0, 1.0,
        ));
        let warped = warp_frame(&frame, &h, 20, 20);
        assert!(warped.data[[8, 7, 2]] > 200);
    }
}
