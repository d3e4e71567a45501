use config::Config;
use http_api::state::AppState;
use image_classifier::impl_serialized::ModelScorerSerialized;
use image_classifier::impl_tract_onnx::ModelScorerTractOnnx;
use image_classifier::interface::ModelScorer;
use image_classifier::pipeline::DefectClassifier;
use label_registry::LabelRegistry;
use library::logger::impl_console::LoggerConsole;
use library::logger::interface::Logger;
use std::sync::Arc;

mod config;
mod error;
mod http_api;
mod image_classifier;
mod label_registry;
mod library;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;

    let logger: Arc<dyn Logger + Send + Sync> =
        Arc::new(LoggerConsole::new(config.logger_timezone));

    let registry = load_registry(&config, logger.as_ref())?;

    let model = load_model(&config, logger.as_ref());

    let classifier = DefectClassifier::new(
        model,
        registry,
        config.preprocess_policy(),
        config.bulk_parallelism,
        logger.clone(),
    );

    let state = Arc::new(AppState::new(
        classifier,
        config.model_path.display().to_string(),
        config.body_limit_bytes,
        logger.clone(),
    ));

    let app = http_api::router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let _ = logger.info(&format!("Listening on http://{}", listener.local_addr()?));

    axum::serve(listener, app).await?;

    Ok(())
}

/// A supplied label map must be valid; without one the built-in table is used.
fn load_registry(
    config: &Config,
    logger: &(dyn Logger + Send + Sync),
) -> Result<LabelRegistry, Box<dyn std::error::Error + Send + Sync>> {
    if !config.label_map_path.exists() {
        let _ = logger.warn(&format!(
            "Label map not found at {}, using default labels",
            config.label_map_path.display()
        ));
        return Ok(LabelRegistry::default_registry());
    }

    let registry = LabelRegistry::from_json_file(&config.label_map_path)?;
    let _ = logger.info(&format!(
        "Loaded {} labels from {}",
        registry.len(),
        config.label_map_path.display()
    ));
    Ok(registry)
}

/// A missing or broken model is not fatal: the service starts and every
/// prediction reports the model as unavailable.
fn load_model(
    config: &Config,
    logger: &(dyn Logger + Send + Sync),
) -> Option<Arc<dyn ModelScorer + Send + Sync>> {
    if !config.model_path.exists() {
        let _ = logger.warn(&format!(
            "Model file not found at {}",
            config.model_path.display()
        ));
        return None;
    }

    match ModelScorerTractOnnx::new(&config.model_path) {
        Ok(model) => {
            let _ = logger.info(&format!(
                "Model loaded from {} with input {}",
                config.model_path.display(),
                model.input_geometry()
            ));
            let model: Arc<dyn ModelScorer + Send + Sync> = Arc::new(model);
            if config.serialize_scoring {
                Some(Arc::new(ModelScorerSerialized::new(model)))
            } else {
                Some(model)
            }
        }
        Err(e) => {
            let _ = logger.error(&format!("Error loading model: {}", e));
            None
        }
    }
}
