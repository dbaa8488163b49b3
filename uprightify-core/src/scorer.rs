/// Orientation scoring and the rotate/flip decision procedure.
///
/// ```text
/// Initial -> Scored -> RotationDecided -> FlipDecided -> Final
/// ```
/// Rotation is decided first. When a transform is applied the buffer is
/// replaced and every profile and score is recomputed from the new buffer
/// before the next decision.
use tracing::{debug, info};

use crate::edge_detect::EdgeParams;
use crate::grid::{spread, GridProfiles};
use crate::pixel_buffer::PixelBuffer;

pub const W_BRIGHTNESS: f64 = 10.0;
pub const W_NOISE: f64 = 20.0;

/// Relative weight of the brightness and noise terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub brightness: f64,
    pub noise: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            brightness: W_BRIGHTNESS,
            noise: W_NOISE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationScore {
    pub rotate_none: f64,
    pub rotate_90: f64,
    pub flip_none: f64,
    pub flip_vertical: f64,
}

impl OrientationScore {
    pub fn from_profiles(p: &GridProfiles, w: &ScoreWeights) -> Self {
        let rb = &p.brightness_rows;
        let rn = &p.noise_rows;

        // Brightness should fall from top to bottom while noise rises;
        // the +1 keeps each term non-negative.
        Self {
            rotate_none: spread(rb) * w.brightness + spread(rn) * w.noise,
            rotate_90: spread(&p.brightness_columns) * w.brightness
                + spread(&p.noise_columns) * w.noise,
            flip_none: (rb[0] - rb[2] + 1.0) * w.brightness + (rn[2] - rn[0] + 1.0) * w.noise,
            flip_vertical: (rb[2] - rb[0] + 1.0) * w.brightness
                + (rn[0] - rn[2] + 1.0) * w.noise,
        }
    }

    pub fn prefers_rotation(&self) -> bool {
        self.rotate_none < self.rotate_90
    }

    pub fn prefers_flip(&self) -> bool {
        self.flip_none < self.flip_vertical
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerState {
    Initial,
    Scored,
    RotationDecided,
    FlipDecided,
    Final,
}

/// Which transforms the scorer applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrientationDecision {
    pub rotated: bool,
    pub flipped: bool,
}

impl OrientationDecision {
    pub fn is_noop(&self) -> bool {
        !self.rotated && !self.flipped
    }
}

/// Terminal output of the scorer: the final buffer plus the state it was judged on.
#[derive(Debug, Clone)]
pub struct OrientResult {
    pub buffer: PixelBuffer,
    pub profiles: GridProfiles,
    pub score: OrientationScore,
    /// Scores of the buffer as it entered the scorer.
    pub initial_score: OrientationScore,
    pub decision: OrientationDecision,
}

#[derive(Debug, Clone)]
struct Scored {
    profiles: GridProfiles,
    score: OrientationScore,
}

pub struct OrientationScorer {
    state: ScorerState,
    buffer: PixelBuffer,
    edge: EdgeParams,
    weights: ScoreWeights,
    scored: Option<Scored>,
    initial_score: Option<OrientationScore>,
    decision: OrientationDecision,
}

impl OrientationScorer {
    pub fn new(buffer: PixelBuffer, edge: EdgeParams, weights: ScoreWeights) -> Self {
        Self {
            state: ScorerState::Initial,
            buffer,
            edge,
            weights,
            scored: None,
            initial_score: None,
            decision: OrientationDecision::default(),
        }
    }

    pub fn state(&self) -> ScorerState {
        self.state
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn profiles(&self) -> Option<&GridProfiles> {
        self.scored.as_ref().map(|s| &s.profiles)
    }

    pub fn score(&self) -> Option<OrientationScore> {
        self.scored.as_ref().map(|s| s.score)
    }

    pub fn decision(&self) -> OrientationDecision {
        self.decision
    }

    fn rescore(&self) -> Scored {
        let profiles = GridProfiles::compute(&self.buffer, &self.edge);
        let score = OrientationScore::from_profiles(&profiles, &self.weights);
        debug!(
            width = self.buffer.width(),
            height = self.buffer.height(),
            rotate_none = score.rotate_none,
            rotate_90 = score.rotate_90,
            flip_none = score.flip_none,
            flip_vertical = score.flip_vertical,
            "Scored buffer"
        );
        Scored { profiles, score }
    }

    fn current_score(&mut self) -> OrientationScore {
        if let Some(s) = &self.scored {
            return s.score;
        }
        let scored = self.rescore();
        let score = scored.score;
        self.scored = Some(scored);
        score
    }

    /// Advance by one transition and return the new state.
    pub fn step(&mut self) -> ScorerState {
        let current = self.state;
        self.state = match current {
            ScorerState::Initial => {
                let score = self.current_score();
                self.initial_score = Some(score);
                ScorerState::Scored
            }
            ScorerState::Scored => {
                if self.current_score().prefers_rotation() {
                    info!("Rotating 90 degrees");
                    self.buffer = self.buffer.rotate90();
                    self.scored = Some(self.rescore());
                    self.decision.rotated = true;
                }
                ScorerState::RotationDecided
            }
            ScorerState::RotationDecided => {
                if self.current_score().prefers_flip() {
                    info!("Flipping vertically");
                    self.buffer = self.buffer.flip_vertical();
                    self.scored = Some(self.rescore());
                    self.decision.flipped = true;
                }
                ScorerState::FlipDecided
            }
            ScorerState::FlipDecided | ScorerState::Final => ScorerState::Final,
        };
        self.state
    }

    /// Run the remaining transitions and return the final buffer and state.
    pub fn run(mut self) -> OrientResult {
        while self.step() != ScorerState::Final {}

        let score = self.current_score();
        let profiles = match self.scored.take() {
            Some(s) => s.profiles,
            None => self.rescore().profiles,
        };
        OrientResult {
            buffer: self.buffer,
            profiles,
            score,
            initial_score: self.initial_score.unwrap_or(score),
            decision: self.decision,
        }
    }
}
