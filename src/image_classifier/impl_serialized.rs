use crate::error::InferenceError;
use crate::image_classifier::geometry::InputGeometry;
use crate::image_classifier::interface::ModelScorer;
use crate::image_classifier::preprocess::NormalizedTensor;
use std::sync::{Arc, Mutex, PoisonError};

/// Lets only one `score` call reach the inner model at a time.
pub struct ModelScorerSerialized {
    inner: Arc<dyn ModelScorer + Send + Sync>,
    guard: Mutex<()>,
}

impl ModelScorerSerialized {
    pub fn new(inner: Arc<dyn ModelScorer + Send + Sync>) -> Self {
        Self {
            inner,
            guard: Mutex::new(()),
        }
    }
}

impl ModelScorer for ModelScorerSerialized {
    fn input_geometry(&self) -> &InputGeometry {
        self.inner.input_geometry()
    }

    fn score(&self, tensor: &NormalizedTensor) -> Result<Vec<f32>, InferenceError> {
        // The guard protects no data; a panicked call must not block later ones.
        let _lock = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner.score(tensor)
    }
}
