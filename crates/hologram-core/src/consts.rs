/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f32 = 1e-6;

// --- Frame Aligner defaults ---

pub const DEFAULT_MAX_FEATURES: usize = 5000;
pub const DEFAULT_RANSAC_THRESHOLD: f64 = 5.0;
pub const MIN_FEATURES_FOR_REFERENCE: usize = 10;
pub const MIN_MATCHES_FOR_HOMOGRAPHY: usize = 10;
pub const LOWE_RATIO: f32 = 0.75;
pub const RANSAC_MAX_ITERATIONS: usize = 500;
pub const RANSAC_CONFIDENCE: f64 = 0.995;

// --- Chromaticity Accumulator defaults ---

pub const DEFAULT_BUFFER_SIZE: usize = 30;
pub const DEFAULT_SATURATION_THRESHOLD: f32 = 0.2;
pub const DEFAULT_HIGHLIGHT_THRESHOLD: u8 = 250;
pub const DEFAULT_MIN_AREA: usize = 100;
pub const ACCUMULATOR_MORPH_KERNEL: usize = 5;
pub const MIN_REGION_THRESHOLD_FLOOR: f32 = 0.1;

// --- HSV Region Selector defaults ---

pub const DEFAULT_S_PERCENTILE: f32 = 70.0;
pub const DEFAULT_V_PERCENTILE: f32 = 60.0;
pub const DEFAULT_MIN_REGION_AREA: usize = 100;
pub const DEFAULT_HUE_VARIANCE_THRESHOLD: f32 = 0.15;
pub const MIN_SATURATION_FLOOR: f32 = 40.0;
pub const MIN_VALUE_FLOOR: f32 = 50.0;
pub const SELECTOR_CLOSE_KERNEL: usize = 7;
pub const SELECTOR_OPEN_KERNEL: usize = 3;
pub const MIN_HUE_SAMPLES: usize = 10;

// --- Dynamic Behavior Verifier defaults ---

pub const DEFAULT_BACKGROUND_FRAMES: usize = 15;
pub const DEFAULT_HUE_ENERGY_THRESHOLD: f32 = 0.15;
pub const HOG_PATCH_SIZE: u32 = 64;
pub const HOG_ORIENTATIONS: usize = 9;
pub const HOG_CELL_SIZE: u32 = 8;
pub const HOG_BLOCK_CELLS: u32 = 2;

// --- Pipeline Coordinator defaults ---

pub const DEFAULT_UPDATE_INTERVAL: usize = 10;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.6;
pub const NMS_IOU_THRESHOLD: f32 = 0.5;
pub const ACCUMULATOR_REGION_THRESHOLD: f32 = 0.5;
