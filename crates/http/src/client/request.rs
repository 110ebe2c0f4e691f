//! Rebuildable request descriptions
//!
//! A `reqwest::RequestBuilder` cannot be replayed once sent, and multipart
//! bodies cannot be cloned at all. [`ApiRequest`] keeps everything needed to
//! build the request again, so the pipeline can resubmit it after a token
//! refresh.

use super::ClientError;
use bytes::Bytes;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Serialize;

/// A file attached to a multipart request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FormField {
    Text { name: String, value: String },
    File { name: String, upload: Upload },
}

#[derive(Debug, Clone, Default, PartialEq)]
enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FormField>),
}

/// Method, path, query and body of one API call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn query_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Set a JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Add a text field, turning the body into a multipart form
    #[must_use]
    pub fn text_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_field(FormField::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Add a file field, turning the body into a multipart form
    #[must_use]
    pub fn file_field(mut self, name: impl Into<String>, upload: Upload) -> Self {
        self.push_field(FormField::File {
            name: name.into(),
            upload,
        });
        self
    }

    fn push_field(&mut self, field: FormField) {
        if let RequestBody::Multipart(fields) = &mut self.body {
            fields.push(field);
        } else {
            self.body = RequestBody::Multipart(vec![field]);
        }
    }

    /// Build a fresh `reqwest` request; callable any number of times
    pub(crate) fn build(
        &self,
        client: &reqwest::Client,
        base_url: &str,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let url = format!("{base_url}{}", self.path);
        let mut builder = client.request(self.method.clone(), url);

        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }

        builder = match &self.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(fields) => builder.multipart(build_form(fields)?),
        };

        Ok(builder)
    }
}

fn build_form(fields: &[FormField]) -> Result<Form, ClientError> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            FormField::Text { name, value } => form.text(name.clone(), value.clone()),
            FormField::File { name, upload } => {
                let mut part =
                    Part::bytes(upload.bytes.to_vec()).file_name(upload.file_name.clone());
                if let Some(content_type) = &upload.content_type {
                    part = part.mime_str(content_type)?;
                }
                form.part(name.clone(), part)
            }
        };
    }
    Ok(form)
}

/// Percent-encode one path segment so an id cannot add segments or a query
pub fn path_segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Send count of one logical request
///
/// A 401 is recovered by refreshing the session only while retries remain;
/// the retried send is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt(u8);

impl Attempt {
    /// Resubmissions allowed after an authorization failure
    pub const MAX_AUTH_RETRIES: u8 = 1;

    pub const fn first() -> Self {
        Self(0)
    }

    pub const fn retries(self) -> u8 {
        self.0
    }

    pub const fn can_retry_auth(self) -> bool {
        self.0 < Self::MAX_AUTH_RETRIES
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}
