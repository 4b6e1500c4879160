use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker the orchestration layer puts in the name of synthesized utterances
pub const GENERATED_MARKER: &str = "_gen_";

#[derive(Error, Debug, PartialEq)]
pub enum MatrixError {
    #[error("Matrix data has {actual} values, expected {rows}x{cols}")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        actual: usize,
    },
}

/// Dense row-major matrix (mel channels x frames for spectrograms)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self, MatrixError> {
        let matrix = Self { rows, cols, data };
        matrix.validate()?;
        Ok(matrix)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// (min, max) over all values; (0, 0) when empty
    pub fn value_range(&self) -> (f32, f32) {
        if self.data.is_empty() {
            return (0.0, 0.0);
        }
        self.data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Shapes whose element count overflows `usize` never match
    pub fn validate(&self) -> Result<(), MatrixError> {
        if self.rows.checked_mul(self.cols) != Some(self.data.len()) {
            return Err(MatrixError::ShapeMismatch {
                rows: self.rows,
                cols: self.cols,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

/// One utterance as produced by the loader/recorder and the encoders
///
/// Read-only once registered with the panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub name: String,
    pub speaker_name: String,
    /// Mono waveform; may be empty when only embeddings were kept
    #[serde(default)]
    pub wav: Vec<f32>,
    pub sample_rate: u32,
    pub spec: Matrix,
    pub speaker_embed: Vec<f32>,
    #[serde(default)]
    pub emotion_embed: Option<Vec<f32>>,
    #[serde(default)]
    pub partial_embeds: Option<Vec<Vec<f32>>>,
    /// Produced by the synthesizer rather than loaded or recorded
    #[serde(default)]
    pub synth: bool,
}

impl Utterance {
    pub fn is_generated(&self) -> bool {
        self.name.contains(GENERATED_MARKER)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn utterance(name: &str, speaker: &str, embed: Vec<f32>) -> Utterance {
        Utterance {
            name: name.to_string(),
            speaker_name: speaker.to_string(),
            wav: vec![0.0; 160],
            sample_rate: 16000,
            spec: Matrix::new(2, 3, vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5]).unwrap(),
            speaker_embed: embed,
            emotion_embed: None,
            partial_embeds: None,
            synth: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::utterance;
    use super::*;

    #[test]
    fn test_matrix_shape_is_checked() {
        assert!(Matrix::new(2, 2, vec![0.0; 4]).is_ok());
        assert_eq!(
            Matrix::new(2, 2, vec![0.0; 3]),
            Err(MatrixError::ShapeMismatch {
                rows: 2,
                cols: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn test_overflowing_shape_is_rejected() {
        let huge = 1usize << (usize::BITS / 2 + 1);
        assert_eq!(
            Matrix::new(huge, huge, vec![]),
            Err(MatrixError::ShapeMismatch {
                rows: huge,
                cols: huge,
                actual: 0
            })
        );

        let json = format!(r#"{{"rows": {huge}, "cols": {huge}, "data": []}}"#);
        let decoded: Matrix = serde_json::from_str(&json).unwrap();
        assert!(decoded.validate().is_err());
    }

    #[test]
    fn test_value_range() {
        let m = Matrix::new(1, 3, vec![-2.0, 0.5, 4.0]).unwrap();
        assert_eq!(m.value_range(), (-2.0, 4.0));
        assert_eq!(Matrix::new(0, 0, vec![]).unwrap().value_range(), (0.0, 0.0));
    }

    #[test]
    fn test_generated_marker() {
        assert!(utterance("p225_gen_00003", "p225", vec![]).is_generated());
        assert!(!utterance("p225_001", "p225", vec![]).is_generated());
    }

    #[test]
    fn test_utterance_from_json_defaults() {
        let json = r#"{
            "name": "rec_1",
            "speaker_name": "user01",
            "sample_rate": 16000,
            "spec": {"rows": 1, "cols": 2, "data": [0.0, 1.0]},
            "speaker_embed": [0.1, 0.2]
        }"#;
        let u: Utterance = serde_json::from_str(json).unwrap();
        assert!(u.wav.is_empty());
        assert!(u.emotion_embed.is_none());
        assert!(!u.synth);
    }
}
