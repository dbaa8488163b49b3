use uprightify_core::codec::OutputFormat;
use uprightify_core::pipeline::OrientParams;
use wasm_bindgen::prelude::*;

/// Processing options for the orientation pipeline.
#[wasm_bindgen]
pub struct OrientOptions {
    pub(crate) inner: OrientParams,
}

#[wasm_bindgen]
impl OrientOptions {
    /// Create options with a custom downscale bound and output format.
    #[wasm_bindgen(constructor)]
    pub fn new(max_dimension: u32, apply_exif: bool, format: &str) -> Result<OrientOptions, JsValue> {
        if max_dimension == 0 {
            return Err(JsValue::from_str("maxDimension must be greater than 0"));
        }
        let mut inner = OrientParams::standard().with_output(parse_format(format)?);
        inner.max_dimension = max_dimension;
        inner.apply_exif = apply_exif;
        Ok(Self { inner })
    }

    /// Standard preset: 500px working size, JPEG output.
    #[wasm_bindgen(js_name = standard)]
    pub fn standard() -> Self {
        Self {
            inner: OrientParams::standard(),
        }
    }

    /// Fast preset: smaller working size and cheaper filter.
    #[wasm_bindgen(js_name = fast)]
    pub fn fast() -> Self {
        Self {
            inner: OrientParams::fast(),
        }
    }

    /// Full resolution preset: no downscaling, PNG output.
    #[wasm_bindgen(js_name = fullResolution)]
    pub fn full_resolution() -> Self {
        Self {
            inner: OrientParams::full_resolution(),
        }
    }

    /// Look up a preset by name (`standard`, `fast`, `full_resolution`).
    #[wasm_bindgen(js_name = fromPreset)]
    pub fn from_preset(name: &str) -> Result<OrientOptions, JsValue> {
        OrientParams::from_preset(name)
            .map(|inner| Self { inner })
            .ok_or_else(|| JsValue::from_str(&format!("Unknown preset '{}'", name)))
    }

    /// Switch to JPEG output with the given quality (1-100).
    #[wasm_bindgen(js_name = setJpegQuality)]
    pub fn set_jpeg_quality(&mut self, quality: u8) {
        self.inner.output = OutputFormat::Jpeg {
            quality: quality.clamp(1, 100),
        };
    }

    #[wasm_bindgen(getter, js_name = maxDimension)]
    pub fn max_dimension(&self) -> u32 {
        self.inner.max_dimension
    }

    #[wasm_bindgen(getter, js_name = mimeType)]
    pub fn mime_type(&self) -> String {
        match self.inner.output {
            OutputFormat::Jpeg { .. } => "image/jpeg".to_string(),
            OutputFormat::Png => "image/png".to_string(),
        }
    }
}

fn parse_format(name: &str) -> Result<OutputFormat, JsValue> {
    OutputFormat::from_name(name)
        .ok_or_else(|| JsValue::from_str("Output format must be 'jpeg' or 'png'"))
}
