//! Image serving through the byte cache.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use tower::ServiceExt;

use kombu_integration_tests::TestApp;
use kombu_server::config::KombuConfig;
use kombu_server::routes;

/// A throwaway image directory seeded with the named files.
fn image_dir(files: &[(&str, &[u8])]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("kombu-images-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create image dir");
    for (name, bytes) in files {
        std::fs::write(dir.join(name), bytes).expect("write image file");
    }
    dir
}

fn app_with_images(files: &[(&str, &[u8])]) -> TestApp {
    let config = KombuConfig {
        image_dir: image_dir(files),
        ..KombuConfig::default()
    };
    TestApp::with_config(config)
}

#[tokio::test]
async fn serves_bytes_with_a_content_type() {
    let app = app_with_images(&[("tonkotsu.png", b"\x89PNG fake")]);

    let router = routes::router(app.state.clone());
    let response = router
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/images/tonkotsu.png")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("infallible");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).expect("content type"),
        "image/png"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(bytes.as_ref(), b"\x89PNG fake");
}

#[tokio::test]
async fn a_cached_image_survives_deletion_on_disk() {
    let app = app_with_images(&[("shoyu.jpg", b"jpeg bytes")]);

    let (status, _) = app.get("/images/shoyu.jpg").await;
    assert_eq!(status, StatusCode::OK);

    std::fs::remove_file(app.state.config().image_dir.join("shoyu.jpg"))
        .expect("remove image file");

    // Still served from memory.
    let (status, _) = app.get("/images/shoyu.jpg").await;
    assert_eq!(status, StatusCode::OK);

    // Explicit eviction makes the deletion visible.
    let (status, body) = app.delete("/images/shoyu.jpg").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], true);
    let (status, _) = app.get("/images/shoyu.jpg").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_images_are_not_found() {
    let app = app_with_images(&[]);
    let (status, body) = app.get("/images/nothing.png").await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn encoded_traversal_is_rejected() {
    let app = app_with_images(&[]);
    let (status, body) = app.get("/images/..%2Fsecrets.toml").await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"], "bad_request");
}
