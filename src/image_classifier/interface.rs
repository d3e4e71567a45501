use crate::error::InferenceError;
use crate::image_classifier::geometry::InputGeometry;
use crate::image_classifier::preprocess::NormalizedTensor;

/// A loaded model, seen as an opaque scored-probability function.
///
/// Implementations must allow concurrent `score` calls; wrap one that does
/// not in [`ModelScorerSerialized`](super::impl_serialized::ModelScorerSerialized).
pub trait ModelScorer: Send + Sync {
    fn input_geometry(&self) -> &InputGeometry;

    /// Raw output values for the single example in `tensor`.
    fn score(&self, tensor: &NormalizedTensor) -> Result<Vec<f32>, InferenceError>;
}
