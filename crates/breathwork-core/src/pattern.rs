//! Breathing patterns and their display semantics.
//!
//! A pattern is a fixed sequence of phase durations in seconds. The display
//! name may select special-cased labels or animation, but the timing engine
//! only ever sees `sequence`.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub name: String,
    /// Phase durations in seconds.
    pub sequence: Vec<f64>,
}

/// How a phase transition is animated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Animation {
    /// Easing spread across the whole phase duration.
    Eased,
    /// Fixed-length snap regardless of phase duration.
    Snap { millis: u64 },
}

/// Labels, colors and animation used to render a pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presentation {
    pub labels: Vec<&'static str>,
    pub colors: Vec<&'static str>,
    pub animation: Animation,
}

impl Presentation {
    pub fn label(&self, phase: usize) -> &'static str {
        self.labels[phase % self.labels.len()]
    }

    pub fn color(&self, phase: usize) -> &'static str {
        self.colors[phase % self.colors.len()]
    }
}

const DEFAULT_LABELS: [&str; 4] = ["Inhale", "Hold", "Exhale", "Hold"];
const DEFAULT_COLORS: [&str; 4] = ["#60a5fa", "#a78bfa", "#34d399", "#fbbf24"];
const TWO_TONE_COLORS: [&str; 2] = ["#60a5fa", "#f87171"];

const BREATH_OF_FIRE: &str = "Breath of Fire";
const HA_BREATH: &str = "Ha Breath";

impl Pattern {
    /// Build a validated pattern.
    ///
    /// # Errors
    /// Returns an error if the sequence is empty or any duration is not a
    /// positive finite number.
    pub fn new(name: impl Into<String>, sequence: Vec<f64>) -> Result<Self, ValidationError> {
        let pattern = Self {
            name: name.into(),
            sequence,
        };
        pattern.validate()?;
        Ok(pattern)
    }

    /// Check the sequence invariants. Patterns loaded through serde skip
    /// `new`, so callers re-validate before starting a session.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sequence.is_empty() {
            return Err(ValidationError::EmptyCollection(format!(
                "pattern '{}' has no phases",
                self.name
            )));
        }
        if let Some((i, d)) = self
            .sequence
            .iter()
            .enumerate()
            .find(|(_, d)| !d.is_finite() || **d <= 0.0)
        {
            return Err(ValidationError::InvalidValue {
                field: format!("sequence[{i}]"),
                message: format!("phase duration must be positive, got {d}"),
            });
        }
        Ok(())
    }

    /// Parse a dash-separated key such as `4-7-8`.
    pub fn from_key(name: impl Into<String>, key: &str) -> Result<Self, ValidationError> {
        let sequence = key
            .split('-')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|_| ValidationError::InvalidValue {
                        field: "pattern".into(),
                        message: format!("'{part}' is not a duration"),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(name, sequence)
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn duration(&self, phase: usize) -> Option<f64> {
        self.sequence.get(phase).copied()
    }

    pub fn cycle_secs(&self) -> f64 {
        self.sequence.iter().sum()
    }

    /// Key identifying the timing, e.g. `"4-7-8"`.
    pub fn key(&self) -> String {
        self.sequence
            .iter()
            .map(|d| {
                if d.fract() == 0.0 {
                    format!("{}", *d as u64)
                } else {
                    format!("{d}")
                }
            })
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn presentation(&self) -> Presentation {
        match self.name.as_str() {
            BREATH_OF_FIRE => Presentation {
                labels: vec!["Inhale", "Exhale"],
                colors: TWO_TONE_COLORS.to_vec(),
                animation: Animation::Snap { millis: 300 },
            },
            HA_BREATH => Presentation {
                labels: vec!["Inhale", "Ha"],
                colors: TWO_TONE_COLORS.to_vec(),
                animation: Animation::Eased,
            },
            _ => {
                let n = self.len().clamp(1, DEFAULT_LABELS.len());
                Presentation {
                    labels: DEFAULT_LABELS[..n].to_vec(),
                    colors: DEFAULT_COLORS[..n].to_vec(),
                    animation: Animation::Eased,
                }
            }
        }
    }

    /// Built-in pattern catalogue.
    pub fn presets() -> Vec<Pattern> {
        [
            ("4-7-8", vec![4.0, 7.0, 8.0]),
            ("Box Breathing", vec![4.0, 4.0, 4.0, 4.0]),
            ("Coherent Breathing", vec![5.0, 5.0]),
            ("Triangle", vec![4.0, 4.0, 4.0]),
            (HA_BREATH, vec![4.0, 2.0]),
            (BREATH_OF_FIRE, vec![1.0, 1.0]),
            ("Extended Exhale", vec![4.0, 8.0]),
        ]
        .into_iter()
        .map(|(name, sequence)| Pattern {
            name: name.to_string(),
            sequence,
        })
        .collect()
    }

    /// Case-insensitive lookup by name or timing key.
    pub fn find_preset(name: &str) -> Option<Pattern> {
        Self::presets()
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name) || p.key() == name)
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Pattern {
            name: "4-7-8".into(),
            sequence: vec![4.0, 7.0, 8.0],
        }
    }
}
