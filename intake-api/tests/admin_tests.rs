//! Tests for the Basic-auth protected admin pages and health probes

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use intake_api::basic_auth_header;
use intake_test_utils::MultipartBody;

#[path = "support/app.rs"]
mod app_support;
use app_support::{
    body_string, listed_file_counts, listed_ids, TestApp, TestResult, ADMIN_USER,
};

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn test_admin_requires_credentials() -> TestResult {
    let app = TestApp::spawn().await?;

    for uri in ["/admin", "/admin/submissions/1"] {
        let response = app.get(uri, None).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        let challenge = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok());
        assert_eq!(challenge, Some("Basic realm=\"Admin\""));
    }

    let request = Request::builder()
        .method(Method::GET)
        .uri("/admin")
        .header(header::AUTHORIZATION, basic_auth_header(ADMIN_USER, "wrong"))
        .body(Body::empty())?;
    let response = app.send(request).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_admin_lists_newest_first_with_file_counts() -> TestResult {
    let app = TestApp::spawn().await?;

    let first = app
        .post_form("/submit", &pairs(&[("business_name", "First Bistro")]), None)
        .await?;
    assert_eq!(first.status(), StatusCode::OK);

    let body = MultipartBody::new()
        .text("business_name", "Second Grill")
        .file("files", "invoice.pdf", b"%PDF")
        .file("files", "prices.csv", b"item,price");
    let second = app.post_multipart("/submit", body, None).await?;
    assert_eq!(second.status(), StatusCode::OK);

    let body = MultipartBody::new()
        .text("business_name", "Third Cafe")
        .file("files", "menu.png", b"\x89PNG");
    let third = app.post_multipart("/submit", body, None).await?;
    assert_eq!(third.status(), StatusCode::OK);

    let response = app.get_admin("/admin").await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await?;

    let rows = app.state.repo.list_with_file_counts().await?;
    let mut expected: Vec<i64> = rows.iter().map(|r| r.submission.id).collect();
    expected.sort_unstable_by(|a, b| b.cmp(a));

    assert_eq!(listed_ids(&html), expected);
    assert_eq!(listed_file_counts(&html), vec![1, 2, 0]);

    let third_pos = html.find("Third Cafe").ok_or("Third Cafe missing")?;
    let first_pos = html.find("First Bistro").ok_or("First Bistro missing")?;
    assert!(third_pos < first_pos);
    Ok(())
}

#[tokio::test]
async fn test_admin_detail_shows_fields_and_files() -> TestResult {
    let app = TestApp::spawn().await?;

    let body = MultipartBody::new()
        .text("business_name", "Detail Diner")
        .text("email", "owner@diner.example")
        .file("files", "menu.pdf", b"%PDF");
    let response = app.post_multipart("/submit", body, None).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let rows = app.state.repo.list_with_file_counts().await?;
    let id = rows[0].submission.id;

    let response = app.get_admin(&format!("/admin/submissions/{}", id)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await?;
    assert!(html.contains("Detail Diner"));
    assert!(html.contains("owner@diner.example"));
    assert!(html.contains("menu.pdf"));

    let response = app
        .get_admin(&format!("/admin/submissions/{}", id + 100))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get_admin("/admin/submissions/not-a-number").await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_admin_escapes_submitted_markup() -> TestResult {
    let app = TestApp::spawn().await?;

    let response = app
        .post_form(
            "/submit",
            &pairs(&[("business_name", "<script>alert(1)</script>")]),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(app.get_admin("/admin").await?).await?;
    assert!(!html.contains("<script>alert(1)</script>"));
    assert!(html.contains("&lt;script&gt;"));
    Ok(())
}

#[tokio::test]
async fn test_health_probes() -> TestResult {
    let app = TestApp::spawn().await?;

    let response = app.get("/health/ping", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await?, "pong");

    let response = app.get("/health/ready", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["details"]["database"]["status"], "healthy");
    Ok(())
}
