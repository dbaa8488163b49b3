/// Full orientation pipeline:
/// decode -> EXIF orientation -> downscale -> score/rotate/flip -> encode
use std::path::Path;

use image::imageops::FilterType;
use tracing::debug;

use crate::codec::{decode, encode, OutputFormat};
use crate::edge_detect::EdgeParams;
use crate::error::Result;
use crate::exif_orientation::read_exif_orientation_from_bytes;
use crate::grid::GridProfiles;
use crate::pixel_buffer::PixelBuffer;
use crate::preprocess::{Preprocessor, DEFAULT_MAX_DIMENSION};
use crate::scorer::{
    OrientResult, OrientationDecision, OrientationScore, OrientationScorer, ScoreWeights,
};

/// Processing parameters for the orientation pipeline.
#[derive(Debug, Clone, Copy)]
pub struct OrientParams {
    /// Inputs larger than this on either side are downscaled before scoring.
    pub max_dimension: u32,
    pub filter: FilterType,
    pub edge: EdgeParams,
    pub weights: ScoreWeights,
    /// Honor the EXIF orientation tag before scoring.
    pub apply_exif: bool,
    pub output: OutputFormat,
}

impl Default for OrientParams {
    fn default() -> Self {
        Self::standard()
    }
}

impl OrientParams {
    pub fn standard() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            filter: FilterType::CatmullRom,
            edge: EdgeParams::default(),
            weights: ScoreWeights::default(),
            apply_exif: true,
            output: OutputFormat::default(),
        }
    }

    /// Smaller working size and a cheaper filter for large batches.
    pub fn fast() -> Self {
        Self {
            max_dimension: 250,
            filter: FilterType::Triangle,
            ..Self::standard()
        }
    }

    /// Never downscale; scores the image at its native size.
    pub fn full_resolution() -> Self {
        Self {
            max_dimension: u32::MAX,
            output: OutputFormat::Png,
            ..Self::standard()
        }
    }

    pub fn from_preset(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::standard()),
            "fast" => Some(Self::fast()),
            "full_resolution" => Some(Self::full_resolution()),
            _ => None,
        }
    }

    pub fn all_presets() -> Vec<(&'static str, Self)> {
        vec![
            ("standard", Self::standard()),
            ("fast", Self::fast()),
            ("full_resolution", Self::full_resolution()),
        ]
    }

    /// Return a copy with a different output format.
    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }

    pub fn preprocessor(&self) -> Preprocessor {
        Preprocessor {
            max_dimension: self.max_dimension,
            filter: self.filter,
        }
    }
}

/// What happened to one image, for logging and diagnostics.
#[derive(Debug, Clone)]
pub struct OrientReport {
    pub exif_orientation: Option<u32>,
    pub source_dimensions: (u32, u32),
    /// Dimensions after EXIF orientation and downscaling.
    pub analyzed_dimensions: (u32, u32),
    pub output_dimensions: (u32, u32),
    pub decision: OrientationDecision,
    pub initial_score: OrientationScore,
    pub score: OrientationScore,
    pub profiles: GridProfiles,
}

#[derive(Debug, Clone)]
pub struct OrientOutcome {
    /// Encoded output image.
    pub image: Vec<u8>,
    pub report: OrientReport,
}

fn preprocess(
    buf: PixelBuffer,
    exif_orientation: Option<u32>,
    params: &OrientParams,
) -> Result<PixelBuffer> {
    let orientation = exif_orientation.filter(|_| params.apply_exif);
    params.preprocessor().apply(buf, orientation)
}

/// Preprocess and score a buffer the caller already decoded.
pub fn orient_buffer(
    buf: PixelBuffer,
    exif_orientation: Option<u32>,
    params: &OrientParams,
) -> Result<OrientResult> {
    let buf = preprocess(buf, exif_orientation, params)?;
    Ok(OrientationScorer::new(buf, params.edge, params.weights).run())
}

/// Decode, preprocess and score without encoding the result.
pub fn analyze(bytes: &[u8], params: &OrientParams) -> Result<(OrientResult, OrientReport)> {
    let buf = decode(bytes)?;
    let source_dimensions = buf.dimensions();
    let exif_orientation = read_exif_orientation_from_bytes(bytes);

    let buf = preprocess(buf, exif_orientation, params)?;
    let analyzed_dimensions = buf.dimensions();
    let result = OrientationScorer::new(buf, params.edge, params.weights).run();

    let report = OrientReport {
        exif_orientation,
        source_dimensions,
        analyzed_dimensions,
        output_dimensions: result.buffer.dimensions(),
        decision: result.decision,
        initial_score: result.initial_score,
        score: result.score,
        profiles: result.profiles.clone(),
    };
    debug!(
        ?source_dimensions,
        ?analyzed_dimensions,
        ?exif_orientation,
        rotated = report.decision.rotated,
        flipped = report.decision.flipped,
        "Oriented image"
    );
    Ok((result, report))
}

/// Orient an encoded image and re-encode it with `params.output`.
pub fn orient_with(bytes: &[u8], params: &OrientParams) -> Result<OrientOutcome> {
    let (result, report) = analyze(bytes, params)?;
    let image = encode(&result.buffer, params.output)?;
    Ok(OrientOutcome { image, report })
}

/// Orient an encoded image with the standard parameters.
pub fn orient(bytes: &[u8]) -> Result<Vec<u8>> {
    Ok(orient_with(bytes, &OrientParams::standard())?.image)
}

/// Read, orient and write a single image file.
pub fn process_file(
    input_path: &Path,
    output_path: &Path,
    params: &OrientParams,
) -> Result<OrientReport> {
    let bytes = std::fs::read(input_path)?;
    let outcome = orient_with(&bytes, params)?;
    std::fs::write(output_path, &outcome.image)?;
    Ok(outcome.report)
}
