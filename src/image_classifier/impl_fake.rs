use crate::error::InferenceError;
use crate::image_classifier::geometry::InputGeometry;
use crate::image_classifier::interface::ModelScorer;
use crate::image_classifier::preprocess::NormalizedTensor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type ScoreFn = dyn Fn(&NormalizedTensor) -> Vec<f32> + Send + Sync;

pub struct ModelScorerFake {
    geometry: InputGeometry,
    score_fn: Box<ScoreFn>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    last_shape: Mutex<Option<Vec<usize>>>,
}

impl ModelScorerFake {
    /// Always answers with `output`.
    pub fn new(geometry: InputGeometry, output: Vec<f32>) -> Self {
        Self::with_fn(geometry, move |_| output.clone())
    }

    pub fn with_fn(
        geometry: InputGeometry,
        score_fn: impl Fn(&NormalizedTensor) -> Vec<f32> + Send + Sync + 'static,
    ) -> Self {
        Self {
            geometry,
            score_fn: Box::new(score_fn),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            last_shape: Mutex::new(None),
        }
    }

    /// Mean pixel value as a binary defect score.
    pub fn mean_brightness(geometry: InputGeometry) -> Self {
        Self::with_fn(geometry, |tensor| {
            let data = tensor.data();
            vec![data.iter().sum::<f32>() / data.len() as f32]
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_shape(&self) -> Option<Vec<usize>> {
        self.last_shape.lock().ok().and_then(|shape| shape.clone())
    }
}

impl ModelScorer for ModelScorerFake {
    fn input_geometry(&self) -> &InputGeometry {
        &self.geometry
    }

    fn score(&self, tensor: &NormalizedTensor) -> Result<Vec<f32>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        if let Ok(mut last_shape) = self.last_shape.lock() {
            *last_shape = Some(tensor.shape().to_vec());
        }
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let output = (self.score_fn)(tensor);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(output)
    }
}
