use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Cannot decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Unsupported model input geometry: {0}")]
    UnsupportedGeometry(String),

    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Cannot load model: {0}")]
    ModelLoad(String),

    #[error("No label registered for output index {0}")]
    LabelNotFound(usize),

    #[error("Labels '{first}' and '{second}' share output index {index}")]
    DuplicateLabelIndex {
        index: usize,
        first: String,
        second: String,
    },

    #[error("Label map error: {0}")]
    LabelMap(String),

    #[error("Tensor shape {shape:?} needs {expected} values, got {actual}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid model output: {0}")]
    InvalidOutput(String),

    #[error("Model execution failed: {0}")]
    Execution(String),
}
