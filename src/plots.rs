//! Serializable plot models rendered by the front end
//!
//! The panel never draws pixels itself: every `draw_*` operation turns its
//! inputs into one of these models and pushes it to the view.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utterance::Matrix;

/// Speaker colours for projection scatter plots (RGB)
pub const COLORMAP: [[u8; 3]; 14] = [
    [0, 127, 70],
    [255, 0, 0],
    [255, 217, 38],
    [0, 135, 255],
    [165, 0, 165],
    [255, 167, 255],
    [97, 142, 151],
    [0, 255, 255],
    [255, 96, 38],
    [142, 76, 0],
    [33, 0, 127],
    [0, 0, 0],
    [183, 183, 183],
    [76, 255, 0],
];

/// Heatmap colour range used for embeddings
pub const EMBED_COLOR_RANGE: (f32, f32) = (0.0, 0.30);

/// Emotion embeddings are laid out as 13 rows of 3
pub const EMOTION_EMBED_SHAPE: (usize, usize) = (13, 3);

#[derive(Error, Debug, PartialEq)]
pub enum PlotError {
    #[error("Cannot reshape {len} values into {rows}x{cols}")]
    BadShape { len: usize, rows: usize, cols: usize },

    #[error("Cannot plot an empty embedding")]
    Empty,
}

/// Which figure row a plot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Which {
    Current,
    Generated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPlot {
    pub title: String,
    pub rows: usize,
    pub cols: usize,
    /// Row-major values
    pub values: Vec<f32>,
    pub color_range: (f32, f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrogramPlot {
    pub title: String,
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f32>,
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    /// Loaded or recorded utterance
    Circle,
    /// Synthesized utterance
    Cross,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub x: f32,
    pub y: f32,
    pub color: [u8; 3],
    pub marker: Marker,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionPlot {
    Empty,
    Placeholder { message: String },
    Points { title: String, points: Vec<ProjectedPoint> },
}

/// A single refresh pushed to the view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "plot", rename_all = "snake_case")]
pub enum PlotUpdate {
    SpeakerEmbed {
        which: Which,
        suptitle: String,
        heatmap: Option<HeatmapPlot>,
    },
    EmotionEmbed {
        which: Which,
        suptitle: String,
        heatmap: Option<HeatmapPlot>,
    },
    Spectrogram {
        which: Which,
        spectrogram: Option<SpectrogramPlot>,
    },
    SpeakerProjection {
        projection: ProjectionPlot,
    },
    EmotionProjection {
        projection: ProjectionPlot,
    },
}

/// Lay out an embedding as a heatmap
///
/// Without an explicit shape the embedding is folded into `floor(sqrt(n))` rows.
pub fn heatmap(
    embed: &[f32],
    shape: Option<(usize, usize)>,
    title: &str,
) -> Result<HeatmapPlot, PlotError> {
    if embed.is_empty() {
        return Err(PlotError::Empty);
    }

    let len = embed.len();
    let (rows, cols) = match shape {
        Some(shape) => shape,
        None => {
            let rows = (len as f64).sqrt() as usize;
            (rows, len / rows)
        }
    };

    if rows.checked_mul(cols) != Some(len) {
        return Err(PlotError::BadShape { len, rows, cols });
    }

    Ok(HeatmapPlot {
        title: title.to_string(),
        rows,
        cols,
        values: embed.to_vec(),
        color_range: EMBED_COLOR_RANGE,
    })
}

pub fn spectrogram(spec: &Matrix, title: &str) -> SpectrogramPlot {
    let (min, max) = spec.value_range();
    SpectrogramPlot {
        title: title.to_string(),
        rows: spec.rows,
        cols: spec.cols,
        values: spec.data.clone(),
        min,
        max,
    }
}

/// Colour for the speaker at `index` in the sorted speaker list (wraps past 14)
pub fn speaker_color(index: usize) -> [u8; 3] {
    COLORMAP[index % COLORMAP.len()]
}

pub fn placeholder_message(missing: usize) -> String {
    format!("Add {} more points to\ngenerate the projections", missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_heatmap_shape() {
        let embed = vec![0.1; 256];
        let plot = heatmap(&embed, None, "speaker embed").unwrap();
        assert_eq!((plot.rows, plot.cols), (16, 16));
        assert_eq!(plot.color_range, (0.0, 0.30));
    }

    #[test]
    fn test_non_square_heatmap_shape() {
        // floor(sqrt(40)) = 6 does not divide 40
        assert_eq!(
            heatmap(&vec![0.0; 40], None, "x"),
            Err(PlotError::BadShape {
                len: 40,
                rows: 6,
                cols: 6
            })
        );
        // floor(sqrt(12)) = 3 -> 3x4
        let plot = heatmap(&vec![0.0; 12], None, "x").unwrap();
        assert_eq!((plot.rows, plot.cols), (3, 4));
    }

    #[test]
    fn test_emotion_heatmap_shape() {
        let plot = heatmap(&vec![0.2; 39], Some(EMOTION_EMBED_SHAPE), "emotion embed").unwrap();
        assert_eq!((plot.rows, plot.cols), (13, 3));
        assert!(heatmap(&vec![0.2; 40], Some(EMOTION_EMBED_SHAPE), "emotion embed").is_err());
    }

    #[test]
    fn test_empty_embed_is_rejected() {
        assert_eq!(heatmap(&[], None, "x"), Err(PlotError::Empty));
    }

    #[test]
    fn test_speaker_color_wraps() {
        assert_eq!(speaker_color(0), COLORMAP[0]);
        assert_eq!(speaker_color(14), COLORMAP[0]);
        assert_eq!(speaker_color(15), COLORMAP[1]);
    }

    #[test]
    fn test_placeholder_message() {
        assert_eq!(
            placeholder_message(3),
            "Add 3 more points to\ngenerate the projections"
        );
    }

    #[test]
    fn test_spectrogram_keeps_range() {
        let spec = Matrix::new(2, 2, vec![-4.0, -1.0, 0.0, 2.0]).unwrap();
        let plot = spectrogram(&spec, "mel spectrogram");
        assert_eq!((plot.min, plot.max), (-4.0, 2.0));
        assert_eq!(plot.values.len(), 4);
    }

    #[test]
    fn test_plot_update_serializes_tagged() {
        let update = PlotUpdate::Spectrogram {
            which: Which::Generated,
            spectrogram: None,
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["plot"], "spectrogram");
        assert_eq!(json["which"], "generated");
    }
}
