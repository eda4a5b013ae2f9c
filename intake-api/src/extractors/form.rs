//! HTML form bodies
//!
//! Every form endpoint accepts either `application/x-www-form-urlencoded` or
//! `multipart/form-data`. Both decode into ordered field pairs plus the file
//! parts posted under the `files` key. Bodies over the configured
//! `DefaultBodyLimit` are rejected with 413 before any handler logic runs.

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::{header, StatusCode},
    Form,
};
use intake_core::{DirectPayload, UploadPart};

use crate::constants::FILES_FIELD;
use crate::error::{ApiError, ApiResult};

/// Decoded form fields and uploaded files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    /// Text fields in posted order
    pub fields: Vec<(String, String)>,
    /// File parts posted under `files`, in posted order
    pub files: Vec<UploadPart>,
}

impl FormPayload {
    pub fn into_direct(self) -> DirectPayload {
        DirectPayload {
            fields: self.fields,
            files: self.files,
        }
    }
}

#[axum::async_trait]
impl<S> FromRequest<S> for FormPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase());

        match content_type.as_deref() {
            Some(ct) if ct.starts_with("multipart/form-data") => {
                let multipart = Multipart::from_request(req, state).await.map_err(|rejection| {
                    tracing::warn!(error = %rejection.body_text(), "Rejected multipart body");
                    ApiError::invalid_format("The form could not be read")
                })?;
                read_multipart(multipart).await
            }
            Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => {
                let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state)
                    .await
                    .map_err(|rejection| {
                        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                            ApiError::payload_too_large()
                        } else {
                            tracing::warn!(error = %rejection.body_text(), "Rejected form body");
                            ApiError::invalid_format("The form could not be read")
                        }
                    })?;
                Ok(Self {
                    fields,
                    files: Vec::new(),
                })
            }
            // A bodyless POST carries no content type; anything else is unsupported.
            _ => {
                let body = Bytes::from_request(req, state).await.map_err(|rejection| {
                    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                        ApiError::payload_too_large()
                    } else {
                        ApiError::invalid_format("The form could not be read")
                    }
                })?;
                if body.is_empty() {
                    Ok(Self::default())
                } else {
                    Err(ApiError::invalid_format("Unsupported form encoding"))
                }
            }
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> ApiResult<FormPayload> {
    let mut payload = FormPayload::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let bytes = field.bytes().await?;
                // Browsers post an empty, nameless part when no file was chosen.
                if name != FILES_FIELD || filename.is_empty() {
                    continue;
                }
                payload.files.push(UploadPart {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            None => {
                let value = field.text().await?;
                payload.fields.push((name, value));
            }
        }
    }

    Ok(payload)
}
