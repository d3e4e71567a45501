use crate::image_classifier::pipeline::DefectClassifier;
use crate::library::logger::interface::Logger;
use std::sync::Arc;

pub struct AppState {
    pub classifier: DefectClassifier,
    pub model_path: String,
    pub body_limit_bytes: usize,
    pub logger: Arc<dyn Logger + Send + Sync>,
}

impl AppState {
    pub fn new(
        classifier: DefectClassifier,
        model_path: String,
        body_limit_bytes: usize,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Self {
        Self {
            classifier,
            model_path,
            body_limit_bytes,
            logger: logger.with_namespace("http"),
        }
    }
}
