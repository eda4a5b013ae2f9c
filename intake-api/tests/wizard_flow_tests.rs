//! End-to-end tests for the onboarding wizard
//!
//! Each test drives the router in-process against its own SQLite file and
//! upload directory.

use std::path::Path;

use axum::http::{header, StatusCode};
use intake_core::TermsAgreed;
use intake_test_utils::{complete_wizard_run, tacos_inc_run, WizardRun};

#[path = "support/app.rs"]
mod app_support;
use app_support::{body_string, location, session_cookie, TestApp, TestResult};

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn test_tacos_inc_wizard_commits_one_row_and_one_file() -> TestResult {
    let app = TestApp::spawn().await?;

    let (_, response) = app.complete_wizard(&tacos_inc_run(), None).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cleared.contains("Max-Age=0"));

    let html = body_string(response).await?;
    assert!(html.contains("Tacos Inc"));
    assert!(html.contains("1 file(s)"));

    let rows = app.state.repo.list_with_file_counts().await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].submission.fields.business_name, "Tacos Inc");
    assert_eq!(rows[0].file_count, 1);

    let detail = app
        .state
        .repo
        .get_detail(rows[0].submission.id)
        .await?
        .ok_or("committed submission missing")?;
    assert_eq!(detail.files.len(), 1);
    assert_eq!(detail.files[0].filename, "menu.pdf");
    assert!(Path::new(&detail.files[0].stored_path).exists());
    assert_eq!(detail.submission.fields.terms_agreed, TermsAgreed::Yes);

    assert!(app.state.pending.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_complete_wizard_stores_every_answer() -> TestResult {
    let app = TestApp::spawn().await?;

    let (_, response) = app.complete_wizard(&complete_wizard_run(), None).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let rows = app.state.repo.list_with_file_counts().await?;
    assert_eq!(rows.len(), 1);
    let fields = &rows[0].submission.fields;
    assert_eq!(fields.business_name, "Pho Real");
    assert_eq!(fields.contact_name, "Linh Tran");
    assert_eq!(fields.prime_vendor_pct, "70");
    assert_eq!(fields.goals, "Cut food cost by 3 points");
    assert_eq!(fields.tier, "2");
    assert_eq!(rows[0].file_count, 2);
    Ok(())
}

#[tokio::test]
async fn test_second_wizard_run_starts_empty() -> TestResult {
    let app = TestApp::spawn().await?;

    let (cookie, first) = app.complete_wizard(&tacos_inc_run(), None).await?;
    assert_eq!(first.status(), StatusCode::OK);

    // Reuse the old cookie: the committed record must not leak into the next run.
    let (_, second) = app.complete_wizard(&WizardRun::empty(), Some(cookie)).await?;
    assert_eq!(second.status(), StatusCode::OK);

    let rows = app.state.repo.list_with_file_counts().await?;
    assert_eq!(rows.len(), 2);
    let newest = &rows[0];
    assert_eq!(newest.submission.fields.business_name, "");
    assert_eq!(newest.submission.fields.tier, "");
    assert_eq!(newest.file_count, 0);
    Ok(())
}

#[tokio::test]
async fn test_get_step_creates_nothing() -> TestResult {
    let app = TestApp::spawn().await?;

    for step in 1..=8 {
        let response = app.get(&format!("/onboarding/step-{}", step), None).await?;
        assert_eq!(response.status(), StatusCode::OK, "step {}", step);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    assert!(app.state.pending.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_onboarding_root_redirects_to_first_step() -> TestResult {
    let app = TestApp::spawn().await?;

    let response = app.get("/onboarding", None).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/onboarding/step-1"));
    Ok(())
}

#[tokio::test]
async fn test_step_page_prefills_saved_answers() -> TestResult {
    let app = TestApp::spawn().await?;

    let response = app
        .post_form(
            "/onboarding/step-2",
            &pairs(&[("business_name", "Tacos <Inc>")]),
            None,
        )
        .await?;
    let cookie = session_cookie(&response).ok_or("no session cookie issued")?;

    let html = body_string(app.get("/onboarding/step-2", Some(&cookie)).await?).await?;
    assert!(html.contains("Tacos &lt;Inc&gt;"));

    let html = body_string(app.get("/onboarding/step-2", None).await?).await?;
    assert!(!html.contains("Tacos"));
    Ok(())
}

#[tokio::test]
async fn test_unknown_steps_are_not_found() -> TestResult {
    let app = TestApp::spawn().await?;

    for uri in [
        "/onboarding/step-0",
        "/onboarding/step-9",
        "/onboarding/intro",
        "/onboarding/step-",
    ] {
        let response = app.get(uri, None).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }

    let response = app
        .post_form(
            "/onboarding/step-9",
            &pairs(&[("business_name", "Nope")]),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(app.state.pending.is_empty());

    let response = app.get("/nowhere", None).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_wizard_commit_without_session_is_rejected() -> TestResult {
    let app = TestApp::spawn().await?;

    let response = app
        .post_form("/submit", &pairs(&[("flow", "wizard")]), None)
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.state.repo.list_with_file_counts().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_tampered_session_cookie_is_ignored() -> TestResult {
    let app = TestApp::spawn().await?;

    let response = app
        .post_form(
            "/onboarding/step-1",
            &pairs(&[("business_name", "Tacos Inc")]),
            None,
        )
        .await?;
    let cookie = session_cookie(&response).ok_or("no session cookie issued")?;

    // Flip the last signature digit.
    let mut tampered = cookie.clone();
    let last = tampered.pop().ok_or("empty cookie")?;
    tampered.push(if last == '0' { '1' } else { '0' });

    let response = app
        .post_form("/submit", &pairs(&[("flow", "wizard")]), Some(&tampered))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post_form("/submit", &pairs(&[("flow", "wizard")]), Some(&cookie))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let rows = app.state.repo.list_with_file_counts().await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].submission.fields.business_name, "Tacos Inc");
    Ok(())
}

#[tokio::test]
async fn test_flow_marker_is_not_stored_as_an_answer() -> TestResult {
    let app = TestApp::spawn().await?;

    let response = app
        .post_form(
            "/onboarding/step-8",
            &pairs(&[("goals", "More margin"), ("flow", "wizard")]),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let cookie = session_cookie(&response).ok_or("no session cookie issued")?;
    let token = cookie.trim_start_matches("intake_session=");
    let session = app.state.signer.verify(token).ok_or("cookie did not verify")?;
    let record = app
        .state
        .pending
        .get_live(&session, chrono::Utc::now())
        .ok_or("no pending record")?;

    assert_eq!(record.fields.get("goals").map(String::as_str), Some("More margin"));
    assert!(!record.fields.contains_key("flow"));
    Ok(())
}

#[tokio::test]
async fn test_final_step_commits_wizard_answers_regardless_of_posted_marker() -> TestResult {
    let app = TestApp::spawn().await?;

    let response = app
        .post_form(
            "/onboarding/step-1",
            &pairs(&[("business_name", "Tacos Inc")]),
            None,
        )
        .await?;
    let cookie = session_cookie(&response).ok_or("no session cookie issued")?;

    let body = intake_test_utils::MultipartBody::new().file("files", "menu.pdf", b"%PDF");
    let response = app
        .post_multipart("/onboarding/step-7", body, Some(&cookie))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // A stale page could still post a direct marker; the redirect decides.
    let answers = pairs(&[("goals", "More margin"), ("flow", "direct")]);
    let response = app
        .post_form("/onboarding/step-8", &answers, Some(&cookie))
        .await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let target = location(&response).ok_or("final step did not redirect")?;
    assert_eq!(target, "/submit?flow=wizard");

    let response = app.post_form(&target, &answers, Some(&cookie)).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let rows = app.state.repo.list_with_file_counts().await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].submission.fields.business_name, "Tacos Inc");
    assert_eq!(rows[0].submission.fields.goals, "More margin");
    assert_eq!(rows[0].submission.fields.terms_agreed, TermsAgreed::Yes);
    assert_eq!(rows[0].file_count, 1);
    assert_eq!(app.uploaded_files()?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_submit_query_marker_without_pending_record_is_rejected() -> TestResult {
    let app = TestApp::spawn().await?;

    let response = app
        .post_form(
            "/submit?flow=wizard",
            &pairs(&[("business_name", "Direct Looking")]),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.state.repo.list_with_file_counts().await?.is_empty());
    Ok(())
}
