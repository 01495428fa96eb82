use ndarray::Array3;

/// A single BGR frame, 8 bits per channel.
///
/// Pixel data is row-major, shape = (height, width, 3), channel order B, G, R
/// — matching the layout frame-grabbers in this family of pipelines hand
/// back.
#[derive(Clone, Debug)]
pub struct Frame {
    pub data: Array3<u8>,
}

impl Frame {
    pub fn new(data: Array3<u8>) -> Self {
        debug_assert_eq!(data.shape()[2], 3, "Frame must have 3 channels (BGR)");
        Self { data }
    }

    pub fn zeros(height: usize, width: usize) -> Self {
        Self {
            data: Array3::zeros((height, width, 3)),
        }
    }

    pub fn width(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn height(&self) -> usize {
        self.data.shape()[0]
    }

    #[inline]
    pub fn pixel(&self, row: usize, col: usize) -> [u8; 3] {
        [
            self.data[[row, col, 0]],
            self.data[[row, col, 1]],
            self.data[[row, col, 2]],
        ]
    }

    pub fn same_dims(&self, other: &Frame) -> bool {
        self.width() == other.width() && self.height() == other.height()
    }
}

/// Axis-aligned integer bounding box. `w` and `h` are always >= 1 when
/// constructed through region-extraction code paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BBox {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn x2(&self) -> u32 {
        self.x + self.w
    }

    pub fn y2(&self) -> u32 {
        self.y + self.h
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// Whether this box is entirely within a `width` x `height` frame.
    pub fn within_bounds(&self, width: u32, height: u32) -> bool {
        self.w >= 1 && self.h >= 1 && self.x2() <= width && self.y2() <= height
    }

    /// Intersection-over-union against another box.
    pub fn iou(&self, other: &BBox) -> f32 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = self.x2().min(other.x2());
        let iy2 = self.y2().min(other.y2());

        if ix2 <= ix1 || iy2 <= iy1 {
            return 0.0;
        }

        let inter = (ix2 - ix1) as u64 * (iy2 - iy1) as u64;
        let union = self.area() + other.area() - inter;
        if union == 0 {
            0.0
        } else {
            inter as f32 / union as f32
        }
    }
}

/// A detected region with its verification outcome.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DetectionRecord {
    pub bbox: BBox,
    pub confidence: f32,
    pub is_hologram: bool,
    pub frame_index: usize,
}
