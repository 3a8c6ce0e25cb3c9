use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

use platerect::config::RectifyConfig;
use platerect::detect::corners::{CornerSource, FallbackReason};
use platerect::geometry::Corners;
use platerect::image::ImageRgba8;
use platerect::pipeline::{PlateRectifier as CoreRectifier, Rectified};

// ── Tsify types for TypeScript interface generation ──

/// Rectifier configuration passed from JavaScript. Missing fields keep their defaults.
#[derive(Tsify, Serialize, Deserialize, Default)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct WasmRectifyConfig {
    /// Edge threshold as a fraction of the strongest gradient (default: 0.3).
    #[serde(default)]
    pub edge_threshold: Option<f32>,
    /// Minimum edge pixels before falling back (default: 10).
    #[serde(default)]
    pub min_edge_points: Option<usize>,
    /// Fallback rectangle margin per side (default: 0.05).
    #[serde(default)]
    pub default_margin: Option<f64>,
    /// RGBA colour for output pixels outside the source (default: [0, 0, 0, 0]).
    #[serde(default)]
    pub fill: Option<[u8; 4]>,
    /// Longest side used for detection, 0 = full size (default: 0).
    #[serde(default)]
    pub detect_max_dim: Option<u32>,
    /// Edge points kept before hull construction (default: 1000).
    #[serde(default)]
    pub max_hull_points: Option<usize>,
    /// Coverage below this marks a result as suspect (default: 0.5).
    #[serde(default)]
    pub min_coverage: Option<f64>,
}

/// Plate corners in source pixel coordinates, `[x, y]` each.
#[derive(Tsify, Serialize, Deserialize, Clone, Copy)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct WasmCorners {
    pub top_left: [f64; 2],
    pub top_right: [f64; 2],
    pub bottom_right: [f64; 2],
    pub bottom_left: [f64; 2],
}

/// Detected corners returned to JavaScript.
#[derive(Tsify, Serialize, Deserialize)]
#[tsify(into_wasm_abi)]
pub struct WasmCornerEstimate {
    pub corners: WasmCorners,
    /// `"detected"` or `"fallback"`.
    pub source: String,
    /// Why detection fell back, when it did.
    pub fallback_reason: Option<String>,
}

impl From<Corners> for WasmCorners {
    fn from(c: Corners) -> Self {
        let [tl, tr, br, bl] = c.to_array();
        WasmCorners {
            top_left: tl,
            top_right: tr,
            bottom_right: br,
            bottom_left: bl,
        }
    }
}

impl From<WasmCorners> for Corners {
    fn from(c: WasmCorners) -> Self {
        Corners::from_array([c.top_left, c.top_right, c.bottom_right, c.bottom_left])
    }
}

// ── Rectifier wrapper ──

/// License-plate rectifier for use from JavaScript/TypeScript.
#[wasm_bindgen]
pub struct PlateRectifier {
    inner: CoreRectifier,
}

#[wasm_bindgen]
impl PlateRectifier {
    /// Create a new rectifier with the given configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<WasmRectifyConfig>) -> Result<PlateRectifier, JsError> {
        let config = config.unwrap_or_default();
        let mut core_config = RectifyConfig::default();

        if let Some(t) = config.edge_threshold {
            core_config.edge_threshold = t;
        }
        if let Some(n) = config.min_edge_points {
            core_config.min_edge_points = n;
        }
        if let Some(m) = config.default_margin {
            core_config.default_margin = m;
        }
        if let Some(f) = config.fill {
            core_config.fill = f;
        }
        if let Some(d) = config.detect_max_dim {
            core_config.detect_max_dim = d;
        }
        if let Some(n) = config.max_hull_points {
            core_config.max_hull_points = n;
        }
        if let Some(c) = config.min_coverage {
            core_config.min_coverage = c;
        }
        core_config
            .validate()
            .map_err(|e| JsError::new(&e.to_string()))?;

        Ok(PlateRectifier {
            inner: CoreRectifier::new(core_config),
        })
    }

    /// Estimate plate corners in an RGBA image (4 bytes per pixel).
    #[wasm_bindgen(js_name = detectCorners)]
    pub fn detect_corners(&self, data: &[u8], width: u32, height: u32) -> Result<JsValue, JsError> {
        let img = rgba_image(data, width, height)?;
        let est = self.inner.detect_corners(&img);

        let (source, fallback_reason) = match est.source {
            CornerSource::Detected => ("detected", None),
            CornerSource::Fallback(reason) => ("fallback", Some(describe_fallback(reason))),
        };
        let out = WasmCornerEstimate {
            corners: est.corners.into(),
            source: source.to_string(),
            fallback_reason,
        };
        serde_wasm_bindgen::to_value(&out).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Rectify an RGBA image. Corners are detected when not supplied.
    pub fn rectify(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        corners: Option<WasmCorners>,
    ) -> Result<RectifiedPlate, JsError> {
        let img = rgba_image(data, width, height)?;
        let corners = match corners {
            Some(c) => Corners::from(c),
            None => self.inner.detect_corners(&img).corners,
        };

        let out = self
            .inner
            .rectify(&img, &corners)
            .map_err(|e| JsError::new(&e.to_string()))?;
        let suspect = out.is_suspect(self.inner.config().min_coverage);
        Ok(RectifiedPlate { inner: out, suspect })
    }
}

/// A rectified plate image returned to JavaScript.
#[wasm_bindgen]
pub struct RectifiedPlate {
    inner: Rectified,
    suspect: bool,
}

#[wasm_bindgen]
impl RectifiedPlate {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.image.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.image.height
    }

    /// Fraction of output pixels sampled from the source image.
    #[wasm_bindgen(getter)]
    pub fn coverage(&self) -> f64 {
        self.inner.coverage.fraction()
    }

    /// Whether coverage fell below the configured minimum.
    #[wasm_bindgen(getter)]
    pub fn suspect(&self) -> bool {
        self.suspect
    }

    /// Source corners the plate was rectified from.
    pub fn corners(&self) -> Result<JsValue, JsError> {
        let c = WasmCorners::from(self.inner.corners);
        serde_wasm_bindgen::to_value(&c).map_err(|e| JsError::new(&e.to_string()))
    }

    /// RGBA pixels, ready for `new ImageData(pixels, width, height)`.
    pub fn pixels(&self) -> js_sys::Uint8ClampedArray {
        let packed = self.inner.image.clone().into_packed();
        js_sys::Uint8ClampedArray::from(packed.as_slice())
    }
}

fn rgba_image(data: &[u8], width: u32, height: u32) -> Result<ImageRgba8, JsError> {
    let expected = ImageRgba8::byte_len(width, height)
        .ok_or_else(|| JsError::new(&format!("image size {width}x{height} is too large")))?;
    if data.len() != expected {
        return Err(JsError::new(&format!(
            "RGBA data length {} does not match {}x{}x4 = {}",
            data.len(),
            width,
            height,
            expected,
        )));
    }
    ImageRgba8::from_rgba(width, height, data.to_vec()).map_err(|e| JsError::new(&e.to_string()))
}

fn describe_fallback(reason: FallbackReason) -> String {
    match reason {
        FallbackReason::InsufficientEdges { found, required } => {
            format!("only {found} edge points, need {required}")
        }
        FallbackReason::SmallHull { vertices } => {
            format!("convex hull has {vertices} vertices")
        }
    }
}
