mod common;

use actix_web::{test, web, App};
use flatfile_auth::build_app;
use serde_json::json;
use tempfile::TempDir;

#[actix_web::test]
async fn test_health_check() {
    let app = test::init_service(
        App::new().route("/api/health", web::get().to(flatfile_auth::health_check))
    ).await;

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "ok": true }));
}

#[actix_web::test]
async fn test_health_check_is_repeatable() {
    let dir = TempDir::new().unwrap();
    let app = test::init_service(build_app(common::file_backed_state(&dir.path().join("users.json")))).await;

    for _ in 0..5 {
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "ok": true }));
    }

    // health never touches the store
    assert!(!dir.path().join("users.json").exists());
}
