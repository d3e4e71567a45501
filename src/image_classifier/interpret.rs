use crate::error::InferenceError;
use crate::label_registry::LabelRegistry;
use serde::Serialize;
use std::collections::BTreeMap;

pub const BINARY_THRESHOLD: f32 = 0.5;
pub const NORMAL_LABEL: &str = "normal";
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionRecord {
    pub has_defect: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<BTreeMap<String, f32>>,
}

impl DecisionRecord {
    /// Short text shown to humans: the label in multi-class mode,
    /// otherwise the binary verdict.
    pub fn prediction(&self) -> String {
        match (&self.label, self.has_defect) {
            (Some(label), _) => label.clone(),
            (None, true) => "Defect Detected".to_string(),
            (None, false) => "No Defect".to_string(),
        }
    }
}

pub fn interpret(
    raw_output: &[f32],
    registry: &LabelRegistry,
) -> Result<DecisionRecord, InferenceError> {
    match raw_output {
        [] => Err(InferenceError::InvalidOutput(
            "model returned an empty output".to_string(),
        )),
        [score] => {
            let confidence = checked_score(*score, 0)?;
            if !(0.0..=1.0).contains(&confidence) {
                return Err(InferenceError::InvalidOutput(format!(
                    "binary score {} is outside [0, 1]",
                    confidence
                )));
            }
            Ok(DecisionRecord {
                has_defect: confidence > BINARY_THRESHOLD,
                label: None,
                confidence,
                probabilities: None,
            })
        }
        scores => {
            let predicted = stable_argmax(scores);
            let confidence = checked_score(scores[predicted], predicted)?;
            let label = match registry.name_for(predicted) {
                Ok(name) => name.to_string(),
                Err(InferenceError::LabelNotFound(_)) => UNKNOWN_LABEL.to_string(),
                Err(e) => return Err(e),
            };
            let probabilities: BTreeMap<String, f32> = registry
                .iter()
                .filter_map(|(index, name)| scores.get(index).map(|s| (name.to_string(), *s)))
                .collect();

            Ok(DecisionRecord {
                has_defect: !label.eq_ignore_ascii_case(NORMAL_LABEL),
                label: Some(label),
                confidence,
                probabilities: Some(probabilities),
            })
        }
    }
}

/// Index of the highest score; the lowest index wins ties.
pub fn stable_argmax(scores: &[f32]) -> usize {
    let mut best = 0;
    for (index, score) in scores.iter().enumerate().skip(1) {
        if *score > scores[best] {
            best = index;
        }
    }
    best
}

fn checked_score(score: f32, index: usize) -> Result<f32, InferenceError> {
    if score.is_finite() {
        Ok(score)
    } else {
        Err(InferenceError::InvalidOutput(format!(
            "score at index {} is {}",
            index, score
        )))
    }
}
