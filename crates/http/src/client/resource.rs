//! Generic CRUD handle over one backend collection

use super::request::{ApiRequest, path_segment};
use super::{AdminClient, ClientError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Paging, search and filter parameters for a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub filters: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Add a backend-specific filter such as `status=pending`
    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    pub(crate) fn apply(&self, request: ApiRequest) -> ApiRequest {
        let request = request
            .query_opt("page", self.page)
            .query_opt("limit", self.limit)
            .query_opt("search", self.search.as_deref());
        self.filters
            .iter()
            .fold(request, |request, (key, value)| request.query(key.clone(), value))
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: Option<u64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

// Endpoints answer either with a bare array or with a paging envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Envelope(Envelope<T>),
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(alias = "data", alias = "results")]
    items: Vec<T>,
    #[serde(default, alias = "count")]
    total: Option<u64>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    limit: Option<u32>,
}

impl<T> From<Listing<T>> for Page<T> {
    fn from(listing: Listing<T>) -> Self {
        match listing {
            Listing::Bare(items) => Self {
                total: Some(items.len() as u64),
                items,
                page: None,
                limit: None,
            },
            Listing::Envelope(envelope) => Self {
                items: envelope.items,
                total: envelope.total,
                page: envelope.page,
                limit: envelope.limit,
            },
        }
    }
}

/// Decode a listing body in either shape
pub fn parse_page<T: DeserializeOwned>(body: &[u8]) -> Result<Page<T>, ClientError> {
    let listing: Listing<T> = serde_json::from_slice(body)?;
    Ok(listing.into())
}

/// Typed handle for `list`/`get`/`create`/`update`/`delete` on a collection path
pub struct Resource<'a, T> {
    client: &'a AdminClient,
    path: String,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: DeserializeOwned> Resource<'a, T> {
    pub(crate) fn new(client: &'a AdminClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path, path_segment(id))
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<T>, ClientError> {
        let request = query.apply(ApiRequest::get(self.path.as_str()));
        let body = self.client.execute_bytes(&request).await?;
        parse_page(&body)
    }

    pub async fn get(&self, id: &str) -> Result<T, ClientError> {
        self.client
            .execute(&ApiRequest::get(self.item_path(id)))
            .await
    }

    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<T, ClientError> {
        let request = ApiRequest::post(self.path.as_str()).json(body)?;
        self.client.execute(&request).await
    }

    pub async fn update<B: Serialize + ?Sized>(&self, id: &str, body: &B) -> Result<T, ClientError> {
        let request = ApiRequest::put(self.item_path(id)).json(body)?;
        self.client.execute(&request).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.client
            .execute_empty(&ApiRequest::delete(self.item_path(id)))
            .await
    }
}
