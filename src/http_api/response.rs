use crate::error::InferenceError;
use crate::image_classifier::bulk::{BulkResultSet, BulkSummary, ItemOutcome};
use crate::image_classifier::interpret::DecisionRecord;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionDetail {
    pub prediction: String,
    pub has_defect: bool,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defect_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_probabilities: Option<BTreeMap<String, f32>>,
}

impl From<&DecisionRecord> for PredictionDetail {
    fn from(record: &DecisionRecord) -> Self {
        Self {
            prediction: record.prediction(),
            has_defect: record.has_defect,
            confidence: record.confidence,
            defect_type: record.label.clone(),
            all_probabilities: record.probabilities.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    #[serde(flatten)]
    pub detail: PredictionDetail,
}

#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct BulkDecision {
    pub image_name: String,
    #[serde(flatten)]
    pub detail: PredictionDetail,
}

#[derive(Debug, Serialize)]
pub struct BulkError {
    pub image_name: String,
    pub prediction: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BulkItem {
    Decision(BulkDecision),
    Error(BulkError),
}

impl From<&ItemOutcome> for BulkItem {
    fn from(outcome: &ItemOutcome) -> Self {
        match outcome {
            ItemOutcome::Decision { image_name, record } => BulkItem::Decision(BulkDecision {
                image_name: image_name.clone(),
                detail: PredictionDetail::from(record),
            }),
            ItemOutcome::Error {
                image_name,
                message,
            } => BulkItem::Error(BulkError {
                image_name: image_name.clone(),
                prediction: format!("Error: {}", message),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub success: bool,
    pub total_images: usize,
    pub results: Vec<BulkItem>,
    pub summary: BulkSummary,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub model_path: String,
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_geometry: Option<String>,
}

pub fn status_for(error: &InferenceError) -> StatusCode {
    match error {
        InferenceError::Decode(_) | InferenceError::UnsupportedGeometry(_) => {
            StatusCode::BAD_REQUEST
        }
        InferenceError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn failure(status: StatusCode, error: impl ToString) -> Response {
    let body = FailureResponse {
        success: false,
        error: error.to_string(),
    };
    (status, Json(body)).into_response()
}

pub fn single(result: Result<DecisionRecord, InferenceError>) -> Response {
    match result {
        Ok(record) => {
            let body = PredictResponse {
                success: true,
                detail: PredictionDetail::from(&record),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => failure(status_for(&e), e),
    }
}

pub fn bulk(results: &BulkResultSet) -> Response {
    let body = BulkResponse {
        success: true,
        total_images: results.len(),
        results: results.outcomes().iter().map(BulkItem::from).collect(),
        summary: results.summary(),
    };
    (StatusCode::OK, Json(body)).into_response()
}
