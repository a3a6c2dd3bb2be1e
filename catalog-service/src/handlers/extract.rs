//! Request body extraction
//!
//! [`Payload`] accepts either a JSON object or a `multipart/form-data` body.
//! Multipart text parts become string fields (repeated names become lists);
//! a part carrying a file is kept aside as an [`UploadedFile`].

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, Method},
    Json,
};
use serde_json::Value;

use crate::store::Document;

use super::error::{ApiError, ApiOperation};

/// A file part of a multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field name
    pub field: String,
    /// Client-supplied file name
    pub file_name: Option<String>,
    /// Declared content type
    pub content_type: Option<String>,
    /// File contents
    pub bytes: Bytes,
}

/// Parsed request body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    /// Body fields
    pub fields: Document,
    /// File parts, in arrival order
    pub files: Vec<UploadedFile>,
}

impl Payload {
    /// Take the file part named `field`, if one was sent
    pub fn take_file(&mut self, field: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|f| f.field == field)?;
        Some(self.files.remove(index))
    }
}

impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let operation = match *req.method() {
            Method::PUT | Method::PATCH => ApiOperation::Update,
            _ => ApiOperation::Create,
        };
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(operation, e.body_text()))?;
            return read_multipart(multipart, operation).await;
        }

        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(operation, e.body_text()))?;
        match value {
            Value::Object(fields) => Ok(Self {
                fields,
                files: Vec::new(),
            }),
            _ => Err(ApiError::bad_request(
                operation,
                "Request body must be a JSON object",
            )),
        }
    }
}

async fn read_multipart(mut multipart: Multipart, operation: ApiOperation) -> Result<Payload, ApiError> {
    let bad_part = |e: axum::extract::multipart::MultipartError| ApiError::bad_request(operation, e.body_text());
    let mut payload = Payload::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_part)? {
        let name = field.name().unwrap_or_default().to_string();
        if name.is_empty() {
            continue;
        }

        if field.file_name().is_some() {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(bad_part)?;
            payload.files.push(UploadedFile {
                field: name,
                file_name,
                content_type,
                bytes,
            });
            continue;
        }

        let text = field.text().await.map_err(bad_part)?;
        let key = name.strip_suffix("[]").unwrap_or(&name).to_string();
        match payload.fields.get_mut(&key) {
            Some(Value::Array(items)) => items.push(Value::String(text)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(text)]);
            }
            None => {
                let value = if name.ends_with("[]") {
                    Value::Array(vec![Value::String(text)])
                } else {
                    Value::String(text)
                };
                payload.fields.insert(key, value);
            }
        }
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde_json::json;

    const BOUNDARY: &str = "XBOUNDARYX";

    fn multipart_request(body: String) -> Request {
        Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    fn text_part(name: &str, value: &str) -> String {
        format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
    }

    #[tokio::test]
    async fn test_json_object() {
        let req = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Phones"}"#))
            .unwrap();
        let payload = Payload::from_request(req, &()).await.unwrap();
        assert_eq!(payload.fields["name"], "Phones");
        assert!(payload.files.is_empty());
    }

    #[tokio::test]
    async fn test_json_array_rejected() {
        let req = Request::builder()
            .method("PUT")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("[1,2]"))
            .unwrap();
        let err = Payload::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.kind, crate::handlers::ApiErrorKind::BadRequest);
        assert_eq!(err.operation, ApiOperation::Update);
    }

    #[tokio::test]
    async fn test_multipart_fields_and_file() {
        let mut body = text_part("name", "Phones");
        body.push_str(&text_part("colors", "red"));
        body.push_str(&text_part("colors", "blue"));
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"a.png\"\r\n\
             Content-Type: image/png\r\n\r\nPNGDATA\r\n--{BOUNDARY}--\r\n"
        ));

        let mut payload = Payload::from_request(multipart_request(body), &()).await.unwrap();
        assert_eq!(payload.fields["name"], "Phones");
        assert_eq!(payload.fields["colors"], json!(["red", "blue"]));

        let image = payload.take_file("image").unwrap();
        assert_eq!(image.content_type.as_deref(), Some("image/png"));
        assert_eq!(image.file_name.as_deref(), Some("a.png"));
        assert_eq!(&image.bytes[..], b"PNGDATA");
        assert!(payload.take_file("image").is_none());
    }

    #[tokio::test]
    async fn test_multipart_bracket_list() {
        let mut body = text_part("images[]", "a.jpeg");
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        let payload = Payload::from_request(multipart_request(body), &()).await.unwrap();
        assert_eq!(payload.fields["images"], json!(["a.jpeg"]));
    }
}
