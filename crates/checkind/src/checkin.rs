// Face registration and identification routes

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use checkin_core::api::{
    IdentifyResponse, RegisterResponse, FIELD_EVENT_ID, FIELD_IMAGE, FIELD_NAME,
};
use checkin_core::{CosineMatcher, EventId};

use crate::error::ApiError;
use crate::store::Identification;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/identify", post(identify))
}

/// Fields collected from a multipart upload. Unknown fields are ignored.
#[derive(Default)]
struct Upload {
    name: Option<String>,
    event_id: Option<String>,
    image: Option<Vec<u8>>,
}

impl Upload {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut upload = Upload::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Malformed form data: {e}")))?
        {
            let Some(field_name) = field.name().map(str::to_owned) else {
                continue;
            };
            let read_err = |e: axum::extract::multipart::MultipartError| {
                ApiError::bad_request(format!("Malformed form data: {e}"))
            };
            match field_name.as_str() {
                FIELD_IMAGE => upload.image = Some(field.bytes().await.map_err(read_err)?.to_vec()),
                FIELD_EVENT_ID => upload.event_id = Some(field.text().await.map_err(read_err)?),
                FIELD_NAME => upload.name = Some(field.text().await.map_err(read_err)?),
                _ => {}
            }
        }
        Ok(upload)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// POST /register - Store a new face under an event
pub async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<RegisterResponse>, ApiError> {
    let upload = Upload::read(multipart).await?;

    let (Some(name), Some(event_id), Some(image)) = (
        non_empty(upload.name),
        non_empty(upload.event_id),
        upload.image,
    ) else {
        return Err(ApiError::bad_request("Name, event and image required"));
    };

    let event_id: EventId = event_id
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid event"))?;
    if state.store.event(event_id).await.is_none() {
        return Err(ApiError::bad_request("Invalid event"));
    }

    let embedding = state
        .engine
        .encode(image.clone())
        .await?
        .ok_or_else(|| ApiError::bad_request("No face detected"))?;

    let face = state
        .store
        .add_face(&name, event_id, embedding, image)
        .await
        .map_err(|_| ApiError::bad_request("Invalid event"))?;

    tracing::info!(id = face.id, name = %face.name, event_id = %event_id, "face registered");

    Ok(Json(RegisterResponse {
        id: Some(face.id),
        name: face.name,
        event_name: face.event_name,
    }))
}

/// POST /identify - Match a face against one event's registrations
pub async fn identify(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<IdentifyResponse>, ApiError> {
    let upload = Upload::read(multipart).await?;

    let (Some(image), Some(event_id)) = (upload.image, non_empty(upload.event_id)) else {
        return Err(ApiError::bad_request("Image and event required"));
    };

    let Some(query) = state.engine.encode(image).await? else {
        return Ok(Json(IdentifyResponse::no_match("No face detected")));
    };

    // A non-numeric id cannot have registrations.
    let Ok(event_id) = event_id.parse::<EventId>() else {
        return Ok(Json(IdentifyResponse::no_match("No registered faces in this event")));
    };

    let outcome = state
        .store
        .identify(event_id, &query, &CosineMatcher, state.similarity_threshold)
        .await;

    let response = match outcome {
        Identification::NoFaces => IdentifyResponse::no_match("No registered faces in this event"),
        Identification::NoMatch { similarity } => {
            tracing::info!(event_id = %event_id, similarity, "no match");
            IdentifyResponse::no_match("No match")
        }
        Identification::Match { user, similarity } => {
            tracing::info!(event_id = %event_id, name = %user.name, similarity, "match found");
            IdentifyResponse {
                matched: true,
                user: Some(user),
                message: None,
            }
        }
    };

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use serde_json::json;

    async fn with_event(app: &axum::Router, name: &str) {
        let (status, _) =
            send(app, json_request("POST", "/admin/events", json!({ "name": name }))).await;
        assert_eq!(status, 200);
    }

    fn register_request(
        name: &str,
        event: &str,
        image: &[u8],
    ) -> axum::http::Request<axum::body::Body> {
        multipart_request(
            "/register",
            &[Part::Text("name", name), Part::Text("event_id", event), Part::File("image", image)],
        )
    }

    fn identify_request(event: &str, image: &[u8]) -> axum::http::Request<axum::body::Body> {
        multipart_request("/identify", &[Part::File("image", image), Part::Text("event_id", event)])
    }

    #[tokio::test]
    async fn test_register_then_identify() {
        let (app, _) = app();
        with_event(&app, "Expo").await;
        let face = face_jpeg(false);

        let (status, body) = send(&app, register_request("Ann", "1", &face)).await;
        assert_eq!(status, 200);
        assert_eq!(body["name"], "Ann");
        assert_eq!(body["event_name"], "Expo");

        let (status, body) = send(&app, identify_request("1", &face)).await;
        assert_eq!(status, 200);
        assert_eq!(body["match"], true);
        assert_eq!(body["user"]["name"], "Ann");
        assert_eq!(body["user"]["event_name"], "Expo");

        let (_, body) = send(&app, empty_request("GET", "/admin/faces")).await;
        assert_eq!(body[0]["name"], "Ann");
        assert_eq!(body[0]["event_id"], 1);
    }

    #[tokio::test]
    async fn test_identify_no_match_messages() {
        let (app, _) = app();
        with_event(&app, "Expo").await;
        with_event(&app, "Fair").await;
        let face = face_jpeg(false);
        let (status, _) = send(&app, register_request("Ann", "1", &face)).await;
        assert_eq!(status, 200);

        let (_, body) = send(&app, identify_request("2", &face)).await;
        assert_eq!(body, json!({"match": false, "message": "No registered faces in this event"}));

        let (_, body) = send(&app, identify_request("1", &face_jpeg(true))).await;
        assert_eq!(body, json!({"match": false, "message": "No match"}));

        let (_, body) = send(&app, identify_request("1", &blank_jpeg())).await;
        assert_eq!(body, json!({"match": false, "message": "No face detected"}));
    }

    #[tokio::test]
    async fn test_register_validation_errors() {
        let (app, _) = app();
        with_event(&app, "Expo").await;
        let face = face_jpeg(false);

        let missing_name = multipart_request(
            "/register",
            &[Part::Text("event_id", "1"), Part::File("image", &face)],
        );
        let cases = [
            (missing_name, "Name, event and image required"),
            (register_request("Ann", "9", &face), "Invalid event"),
            (register_request("Ann", "x", &face), "Invalid event"),
            (register_request("Ann", "1", b"junk"), "Invalid image file"),
            (register_request("Ann", "1", &blank_jpeg()), "No face detected"),
        ];

        for (request, expected) in cases {
            let (status, body) = send(&app, request).await;
            assert_eq!(status, 400, "{expected}");
            assert_eq!(body["error"], expected);
        }

        let (_, body) = send(&app, empty_request("GET", "/admin/faces")).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_identify_requires_image_and_event() {
        let (app, _) = app();
        let (status, body) =
            send(&app, multipart_request("/identify", &[Part::Text("event_id", "1")])).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Image and event required");
    }
}
