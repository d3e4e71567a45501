use crate::error::InferenceError;
use crate::image_classifier::geometry::InputGeometry;
use crate::image_classifier::interface::ModelScorer;
use crate::image_classifier::interpret::{interpret, DecisionRecord};
use crate::image_classifier::preprocess::{normalize, PreprocessPolicy};
use crate::label_registry::LabelRegistry;
use crate::library::logger::interface::Logger;
use std::sync::Arc;

/// Immutable inference context built once at startup and shared by all
/// requests.
#[derive(Clone)]
pub struct DefectClassifier {
    pub(super) model: Option<Arc<dyn ModelScorer + Send + Sync>>,
    pub(super) registry: Arc<LabelRegistry>,
    pub(super) policy: PreprocessPolicy,
    /// Worker pool for bulk requests; `None` classifies items in order on the
    /// calling thread.
    pub(super) bulk_pool: Option<Arc<rayon::ThreadPool>>,
    pub(super) logger: Arc<dyn Logger + Send + Sync>,
}

impl DefectClassifier {
    pub fn new(
        model: Option<Arc<dyn ModelScorer + Send + Sync>>,
        registry: LabelRegistry,
        policy: PreprocessPolicy,
        bulk_parallelism: usize,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Self {
        let logger = logger.with_namespace("classifier");
        let bulk_pool = build_bulk_pool(bulk_parallelism, logger.as_ref());

        Self {
            model,
            registry: Arc::new(registry),
            policy,
            bulk_pool,
            logger,
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn input_geometry(&self) -> Option<&InputGeometry> {
        self.model.as_ref().map(|model| model.input_geometry())
    }

    pub fn registry(&self) -> &LabelRegistry {
        &self.registry
    }

    pub fn classify(&self, image_bytes: &[u8]) -> Result<DecisionRecord, InferenceError> {
        let image = image::load_from_memory(image_bytes)?;

        let tensor = normalize(&image, self.input_geometry(), &self.policy)?;

        let model = self
            .model
            .as_ref()
            .ok_or(InferenceError::ModelUnavailable)?;
        let raw_output = model.score(&tensor)?;

        interpret(&raw_output, &self.registry)
    }
}

fn build_bulk_pool(
    parallelism: usize,
    logger: &(dyn Logger + Send + Sync),
) -> Option<Arc<rayon::ThreadPool>> {
    if parallelism <= 1 {
        return None;
    }

    match rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism)
        .thread_name(|index| format!("bulk-{}", index))
        .build()
    {
        Ok(pool) => Some(Arc::new(pool)),
        Err(e) => {
            let _ = logger.warn(&format!(
                "Cannot start {} bulk workers, classifying sequentially: {}",
                parallelism, e
            ));
            None
        }
    }
}
