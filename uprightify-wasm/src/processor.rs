use uprightify_core::pipeline::{orient_with, OrientOutcome};
use wasm_bindgen::prelude::*;

use crate::params::OrientOptions;
use crate::utils::console_log;

/// An encoded oriented image plus what was done to it.
#[wasm_bindgen]
pub struct OrientedImage {
    outcome: OrientOutcome,
}

#[wasm_bindgen]
impl OrientedImage {
    /// Encoded output bytes.
    #[wasm_bindgen(getter)]
    pub fn bytes(&self) -> Vec<u8> {
        self.outcome.image.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn rotated(&self) -> bool {
        self.outcome.report.decision.rotated
    }

    #[wasm_bindgen(getter)]
    pub fn flipped(&self) -> bool {
        self.outcome.report.decision.flipped
    }

    #[wasm_bindgen(getter, js_name = exifOrientation)]
    pub fn exif_orientation(&self) -> Option<u32> {
        self.outcome.report.exif_orientation
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.outcome.report.output_dimensions.0
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.outcome.report.output_dimensions.1
    }

    /// Scores the decision was made on:
    /// `[rotateNone, rotate90, flipNone, flipVertical]`.
    #[wasm_bindgen(getter, js_name = initialScores)]
    pub fn initial_scores(&self) -> js_sys::Float64Array {
        let s = &self.outcome.report.initial_score;
        js_sys::Float64Array::from(&[s.rotate_none, s.rotate_90, s.flip_none, s.flip_vertical][..])
    }
}

/// Main image processor for uprightify.
#[wasm_bindgen]
pub struct UprightifyProcessor;

#[wasm_bindgen]
impl UprightifyProcessor {
    /// Orient an image with the given options.
    ///
    /// # Arguments
    /// * `image_bytes` - Input image as byte array (PNG, JPEG, WebP, etc.)
    /// * `options` - Processing options
    ///
    /// # Returns
    /// Encoded image bytes in the format selected by `options`
    #[wasm_bindgen(js_name = orientImage)]
    pub fn orient_image(image_bytes: &[u8], options: &OrientOptions) -> Result<Vec<u8>, JsValue> {
        Ok(Self::orient_detailed(image_bytes, options)?.outcome.image)
    }

    /// Like `orientImage`, but also returns the decision and scores.
    #[wasm_bindgen(js_name = orientDetailed)]
    pub fn orient_detailed(
        image_bytes: &[u8],
        options: &OrientOptions,
    ) -> Result<OrientedImage, JsValue> {
        let outcome = orient_with(image_bytes, &options.inner)
            .map_err(|e| JsValue::from_str(&format!("Failed to orient image: {}", e)))?;

        let d = outcome.report.decision;
        web_sys::console::debug_1(&JsValue::from_str(&format!(
            "uprightify: rotated={} flipped={}",
            d.rotated, d.flipped
        )));
        if let Some(o) = outcome.report.exif_orientation.filter(|&o| o != 1) {
            console_log!("uprightify: applied EXIF orientation {}", o);
        }

        Ok(OrientedImage { outcome })
    }
}
