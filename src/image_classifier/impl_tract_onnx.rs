use crate::error::InferenceError;
use crate::image_classifier::geometry::InputGeometry;
use crate::image_classifier::interface::ModelScorer;
use crate::image_classifier::preprocess::NormalizedTensor;
use std::path::Path;
use tract_onnx::prelude::*;
use tract_onnx::tract_hir::internal::DimLike;

pub struct ModelScorerTractOnnx {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
    geometry: InputGeometry,
}

impl ModelScorerTractOnnx {
    pub fn new(model_path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| InferenceError::ModelLoad(format!("{}: {}", model_path.display(), e)))?;

        let input_fact = model
            .model()
            .input_fact(0)
            .map_err(|e| InferenceError::ModelLoad(e.to_string()))?;

        // Symbolic dimensions (batch, dynamic height/width) come back as None.
        let dims: Vec<Option<usize>> = input_fact
            .shape
            .iter()
            .map(|dim| dim.to_usize().ok())
            .collect();
        let geometry = InputGeometry::from_dims(&dims)?;

        Ok(Self { model, geometry })
    }
}

impl ModelScorer for ModelScorerTractOnnx {
    fn input_geometry(&self) -> &InputGeometry {
        &self.geometry
    }

    fn score(&self, tensor: &NormalizedTensor) -> Result<Vec<f32>, InferenceError> {
        let input = Tensor::from_shape(tensor.shape(), tensor.data())
            .map_err(|e| InferenceError::Execution(e.to_string()))?;

        let outputs = self
            .model
            .run(tvec!(input.into_tvalue()))
            .map_err(|e| InferenceError::Execution(e.to_string()))?;

        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::InvalidOutput("model produced no outputs".to_string()))?
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::InvalidOutput(e.to_string()))?;

        Ok(output.iter().copied().collect())
    }
}
