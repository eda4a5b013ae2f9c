//! In-process test application over a throwaway SQLite file and upload dir.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderValue, Method, Request, Response, StatusCode},
    Router,
};
use intake_api::{basic_auth_header, create_api_router, AppState, IntakeConfig};
use intake_storage::DbConfig;
use intake_test_utils::{
    multipart_content_type, urlencoded_body, MultipartBody, WizardRun, FINAL_STEP, UPLOAD_STEP,
    URLENCODED,
};
use tempfile::TempDir;
use tower::ServiceExt;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASS: &str = "test-admin-pass";

pub struct TestApp {
    pub state: AppState,
    pub config: IntakeConfig,
    router: Router,
    _dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> TestResult<Self> {
        Self::spawn_with(|_| {}).await
    }

    /// Build the app after letting `tweak` adjust the test configuration.
    pub async fn spawn_with(tweak: impl FnOnce(&mut IntakeConfig)) -> TestResult<Self> {
        let dir = TempDir::new()?;
        let mut config = IntakeConfig {
            upload_dir: dir.path().join("uploads"),
            database: DbConfig::at(dir.path().join("submissions.db")),
            admin: intake_api::AdminCredentials::new(ADMIN_USER, ADMIN_PASS),
            ..IntakeConfig::default()
        };
        tweak(&mut config);

        let state = AppState::bootstrap(&config).await?;
        let router = create_api_router(state.clone(), &config);

        Ok(Self {
            state,
            config,
            router,
            _dir: dir,
        })
    }

    pub async fn send(&self, request: Request<Body>) -> TestResult<Response<Body>> {
        Ok(self.router.clone().oneshot(request).await?)
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResult<Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty())?).await
    }

    pub async fn get_admin(&self, uri: &str) -> TestResult<Response<Body>> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::AUTHORIZATION, basic_auth_header(ADMIN_USER, ADMIN_PASS))
            .body(Body::empty())?;
        self.send(request).await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        pairs: &[(String, String)],
        cookie: Option<&str>,
    ) -> TestResult<Response<Body>> {
        self.post_raw(uri, URLENCODED, urlencoded_body(pairs).into_bytes(), cookie)
            .await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        body: MultipartBody,
        cookie: Option<&str>,
    ) -> TestResult<Response<Body>> {
        self.post_raw(uri, &multipart_content_type(), body.finish(), cookie)
            .await
    }

    pub async fn post_raw(
        &self,
        uri: &str,
        content_type: &str,
        body: Vec<u8>,
        cookie: Option<&str>,
    ) -> TestResult<Response<Body>> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body))?).await
    }

    /// Walk every wizard step, then replay the final post against the 307
    /// target as a browser would.
    ///
    /// The upload step posts multipart only when the run carries files.
    ///
    /// Returns the session cookie and the `/submit` response.
    pub async fn complete_wizard(
        &self,
        run: &WizardRun,
        cookie: Option<String>,
    ) -> TestResult<(String, Response<Body>)> {
        let mut cookie = cookie;

        for step in 1..=FINAL_STEP {
            let uri = format!("/onboarding/step-{}", step);
            let answers = run.answers(step).to_vec();

            let response = if step == UPLOAD_STEP && !run.uploads.is_empty() {
                let body = run
                    .uploads
                    .iter()
                    .fold(MultipartBody::new().texts(&answers), |body, (name, bytes)| {
                        body.file("files", name, bytes)
                    });
                self.post_multipart(&uri, body, cookie.as_deref()).await?
            } else {
                self.post_form(&uri, &answers, cookie.as_deref()).await?
            };

            if step == FINAL_STEP {
                assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
                assert_eq!(location(&response).as_deref(), Some("/submit?flow=wizard"));
            } else {
                assert_eq!(response.status(), StatusCode::SEE_OTHER, "step {}", step);
                let next = format!("/onboarding/step-{}", step + 1);
                assert_eq!(location(&response).as_deref(), Some(next.as_str()));
            }

            if let Some(issued) = session_cookie(&response) {
                cookie = Some(issued);
            }

            if step == FINAL_STEP {
                let session = cookie.clone().ok_or("wizard never issued a session cookie")?;
                let target = location(&response).ok_or("final step did not redirect")?;
                let submit = self.post_form(&target, &answers, Some(&session)).await?;
                return Ok((session, submit));
            }
        }

        Err("wizard has no final step".into())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.config.upload_dir
    }

    /// Files currently in the upload directory.
    pub fn uploaded_files(&self) -> TestResult<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(self.upload_dir())? {
            paths.push(entry?.path());
        }
        paths.sort();
        Ok(paths)
    }
}

/// `name=value` pair of the session cookie set by a response, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter(|value| !value.contains("Max-Age=0"))
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .find(|pair| pair.starts_with("intake_session="))
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v: &HeaderValue| v.to_str().ok())
        .map(str::to_string)
}

pub async fn body_string(response: Response<Body>) -> TestResult<String> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

/// Submission ids in the order the admin listing shows them.
pub fn listed_ids(html: &str) -> Vec<i64> {
    html.split("data-id=\"")
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .filter_map(|id| id.parse().ok())
        .collect()
}

/// File counts in the order the admin listing shows them.
pub fn listed_file_counts(html: &str) -> Vec<usize> {
    html.split("<td class=\"file-count\">")
        .skip(1)
        .filter_map(|rest| rest.split('<').next())
        .filter_map(|count| count.parse().ok())
        .collect()
}
