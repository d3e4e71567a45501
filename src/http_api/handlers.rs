use crate::http_api::response::{self, HealthResponse};
use crate::http_api::state::AppState;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

const SINGLE_FIELD: &str = "file";
const BULK_FIELDS: [&str; 2] = ["files", "file"];

#[derive(Debug)]
struct Upload {
    name: String,
    bytes: Vec<u8>,
}

pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Construction Defect Detection API",
        "status": "running",
        "endpoints": {
            "health": "/health",
            "single_predict": "/predict",
            "bulk_predict": "/predict/bulk",
        },
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let classifier = &state.classifier;
    Json(HealthResponse {
        status: "healthy",
        model_loaded: classifier.model_loaded(),
        model_path: state.model_path.clone(),
        labels: classifier
            .registry()
            .labels()
            .into_iter()
            .map(str::to_string)
            .collect(),
        input_geometry: classifier.input_geometry().map(|g| g.to_string()),
    })
}

pub async fn predict_single(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let uploads = match read_uploads(multipart, &[SINGLE_FIELD]).await {
        Ok(uploads) => uploads,
        Err(response) => return response,
    };
    let Some(upload) = uploads.into_iter().next() else {
        return response::failure(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    let classifier = state.classifier.clone();
    let name = upload.name.clone();
    let result = tokio::task::spawn_blocking(move || classifier.classify(&upload.bytes)).await;

    match result {
        Ok(Ok(record)) => {
            let _ = state.logger.info(&format!(
                "{}: {} ({:.4})",
                name,
                record.prediction(),
                record.confidence
            ));
            response::single(Ok(record))
        }
        Ok(Err(e)) => {
            let _ = state.logger.error(&format!("{}: {}", name, e));
            response::single(Err(e))
        }
        Err(e) => {
            let _ = state.logger.error(&format!("{}: worker failed: {}", name, e));
            response::failure(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

pub async fn predict_bulk(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let uploads = match read_uploads(multipart, &BULK_FIELDS).await {
        Ok(uploads) => uploads,
        Err(response) => return response,
    };
    if uploads.is_empty() {
        return response::failure(StatusCode::BAD_REQUEST, "No files uploaded");
    }

    let items: Vec<(String, Vec<u8>)> = uploads
        .into_iter()
        .map(|upload| (upload.name, upload.bytes))
        .collect();

    let classifier = state.classifier.clone();
    match tokio::task::spawn_blocking(move || classifier.classify_many(&items)).await {
        Ok(results) => response::bulk(&results),
        Err(e) => {
            let _ = state.logger.error(&format!("bulk worker failed: {}", e));
            response::failure(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

async fn read_uploads(
    multipart: Result<Multipart, MultipartRejection>,
    field_names: &[&str],
) -> Result<Vec<Upload>, Response> {
    let mut multipart =
        multipart.map_err(|e| response::failure(StatusCode::BAD_REQUEST, e.body_text()))?;

    collect_fields(&mut multipart, field_names)
        .await
        .map_err(|e| response::failure(StatusCode::BAD_REQUEST, e.body_text()))
}

async fn collect_fields(
    multipart: &mut Multipart,
    field_names: &[&str],
) -> Result<Vec<Upload>, MultipartError> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let wanted = field
            .name()
            .is_some_and(|name| field_names.contains(&name));
        if !wanted {
            continue;
        }

        let name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("image_{}", uploads.len() + 1));
        let bytes = field.bytes().await?.to_vec();
        uploads.push(Upload { name, bytes });
    }

    Ok(uploads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_api::router;
    use crate::image_classifier::pipeline::DefectClassifier;
    use crate::image_classifier::tests::fixture::{corrupt_bytes, solid_png, Fixture};
    use crate::library::logger::impl_fake::LoggerFake;
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "defect-test-boundary";

    struct Part<'a> {
        field: &'a str,
        file_name: Option<&'a str>,
        bytes: Vec<u8>,
    }

    fn part<'a>(field: &'a str, file_name: Option<&'a str>, bytes: Vec<u8>) -> Part<'a> {
        Part {
            field,
            file_name,
            bytes,
        }
    }

    fn multipart_body(parts: &[Part]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            let disposition = match part.file_name {
                Some(file_name) => format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    part.field, file_name
                ),
                None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.field),
            };
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            body.extend_from_slice(&part.bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload_request(uri: &str, parts: &[Part]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    fn app_state(classifier: DefectClassifier) -> Arc<AppState> {
        Arc::new(AppState::new(
            classifier,
            "model.onnx".to_string(),
            1024 * 1024,
            Arc::new(LoggerFake::new()),
        ))
    }

    async fn send(state: Arc<AppState>, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let Json(body) = root().await;

        assert_eq!(body["endpoints"]["bulk_predict"], "/predict/bulk");
        assert_eq!(body["status"], "running");
    }

    #[tokio::test]
    async fn test_health_without_model() {
        let f = Fixture::without_model();

        let Json(health) = health(State(app_state(f.classifier.clone()))).await;

        assert_eq!(health.status, "healthy");
        assert!(!health.model_loaded);
        assert_eq!(health.model_path, "model.onnx");
        assert_eq!(health.labels.len(), 7);
        assert_eq!(health.labels[3], "normal");
        assert_eq!(health.input_geometry, None);
    }

    #[tokio::test]
    async fn test_predict_single_upload() {
        let f = Fixture::brightness();
        let request = upload_request(
            "/predict",
            &[part("file", Some("wall.png"), solid_png(8, 8, [255, 255, 255]))],
        );

        let (status, body) = send(app_state(f.classifier.clone()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["prediction"], "Defect Detected");
        assert_eq!(body["has_defect"], true);
        assert_eq!(f.model().calls(), 1);
    }

    #[tokio::test]
    async fn test_predict_single_ignores_other_fields() {
        let f = Fixture::brightness();
        let request = upload_request(
            "/predict",
            &[part("upload", Some("wall.png"), solid_png(8, 8, [0, 0, 0]))],
        );

        let (status, body) = send(app_state(f.classifier.clone()), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "No file uploaded");
        assert_eq!(f.model().calls(), 0);
    }

    #[tokio::test]
    async fn test_predict_single_corrupt_image() {
        let f = Fixture::brightness();
        let request = upload_request("/predict", &[part("file", Some("x.png"), corrupt_bytes())]);

        let (status, body) = send(app_state(f.classifier.clone()), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Cannot decode image"));
    }

    #[tokio::test]
    async fn test_predict_single_without_model() {
        let f = Fixture::without_model();
        let request = upload_request(
            "/predict",
            &[part("file", Some("wall.png"), solid_png(8, 8, [0, 0, 0]))],
        );

        let (status, body) = send(app_state(f.classifier.clone()), request).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Model not loaded");
    }

    #[tokio::test]
    async fn test_request_that_is_not_multipart() {
        let f = Fixture::brightness();
        let request = Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let (status, body) = send(app_state(f.classifier.clone()), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_truncated_multipart_body() {
        let f = Fixture::brightness();
        let mut bytes = multipart_body(&[part("files", Some("a.png"), solid_png(8, 8, [1, 1, 1]))]);
        bytes.truncate(bytes.len() / 2);
        let request = Request::builder()
            .method("POST")
            .uri("/predict/bulk")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(bytes))
            .unwrap();

        let (status, body) = send(app_state(f.classifier.clone()), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(f.model().calls(), 0);
    }

    #[tokio::test]
    async fn test_bulk_upload_with_one_corrupt_part() {
        let f = Fixture::brightness();
        let request = upload_request(
            "/predict/bulk",
            &[
                part("files", Some("a.png"), solid_png(8, 8, [255, 255, 255])),
                part("files", Some("broken.png"), corrupt_bytes()),
                part("files", None, solid_png(8, 8, [0, 0, 0])),
                part("notes", None, b"ignored".to_vec()),
            ],
        );

        let (status, body) = send(app_state(f.classifier.clone()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["total_images"], 3);
        let results = body["results"].as_array().unwrap();
        let names: Vec<&str> = results
            .iter()
            .map(|result| result["image_name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["a.png", "broken.png", "image_3"]);
        assert_eq!(results[0]["has_defect"], true);
        assert!(results[1]["prediction"]
            .as_str()
            .unwrap()
            .starts_with("Error: Cannot decode image"));
        assert_eq!(results[2]["has_defect"], false);
        assert_eq!(
            body["summary"],
            serde_json::json!({ "defects": 1, "no_defects": 1, "errors": 1 })
        );
    }

    #[tokio::test]
    async fn test_bulk_accepts_file_field() {
        let f = Fixture::brightness();
        let request = upload_request(
            "/predict/bulk",
            &[part("file", Some("single.png"), solid_png(8, 8, [0, 0, 0]))],
        );

        let (status, body) = send(app_state(f.classifier.clone()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_images"], 1);
        assert_eq!(body["results"][0]["image_name"], "single.png");
    }

    #[tokio::test]
    async fn test_bulk_without_files() {
        let f = Fixture::brightness();
        let request = upload_request("/predict/bulk", &[part("notes", None, b"hi".to_vec())]);

        let (status, body) = send(app_state(f.classifier.clone()), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No files uploaded");
    }
}
