//! Minimal REST client for an Appwrite-compatible backend.
//!
//! Only the calls needed by [`crate::storage::AppwriteStore`] and
//! [`crate::catalog::AppwriteCatalogManager`] are covered. Every request
//! carries the project id and API key headers. A 404 is reported as `None`
//! (or `false` for deletes) so callers can tell "missing" from "failed".

use anyhow::{anyhow, Context, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

/// Default Appwrite Cloud endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://cloud.appwrite.io/v1";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A query filter in Appwrite's JSON query syntax.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    OrderAsc(&'static str),
    OrderDesc(&'static str),
    Limit(usize),
    Offset(usize),
    Equal(&'static str, serde_json::Value),
    Select(Vec<&'static str>),
}

impl Query {
    /// Encode as the value of a `queries[]` parameter.
    pub fn to_param(&self) -> String {
        let value = match self {
            Self::OrderAsc(attr) => json!({"method": "orderAsc", "attribute": attr}),
            Self::OrderDesc(attr) => json!({"method": "orderDesc", "attribute": attr}),
            Self::Limit(n) => json!({"method": "limit", "values": [n]}),
            Self::Offset(n) => json!({"method": "offset", "values": [n]}),
            Self::Equal(attr, value) => {
                json!({"method": "equal", "attribute": attr, "values": [value]})
            }
            Self::Select(attrs) => json!({"method": "select", "values": attrs}),
        };
        value.to_string()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Shared HTTP client bound to one project.
#[derive(Debug, Clone)]
pub struct AppwriteClient {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: String,
}

impl AppwriteClient {
    pub fn new(endpoint: &str, project_id: &str, api_key: &str) -> Result<Self> {
        url::Url::parse(endpoint).with_context(|| format!("Invalid endpoint: {}", endpoint))?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Absolute URL for an API path such as `/storage/buckets`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    fn request(&self, method: Method, path: &str, queries: &[Query]) -> RequestBuilder {
        let params: Vec<(&str, String)> = queries.iter().map(|q| ("queries[]", q.to_param())).collect();
        self.http
            .request(method, self.url(path))
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Key", &self.api_key)
            .query(&params)
    }

    async fn send(&self, method: Method, path: &str, builder: RequestBuilder) -> Result<Option<Response>> {
        let response = builder
            .send()
            .await
            .with_context(|| format!("{} {} failed", method, path))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_default();
            return Err(anyhow!("{} {} returned {}: {}", method, path, status, message));
        }
        Ok(Some(response))
    }

    /// GET a JSON resource; `None` when it does not exist.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, queries: &[Query]) -> Result<Option<T>> {
        let builder = self.request(Method::GET, path, queries);
        match self.send(Method::GET, path, builder).await? {
            Some(response) => Ok(Some(response.json().await?)),
            None => Ok(None),
        }
    }

    /// GET raw bytes; `None` when the resource does not exist.
    pub async fn get_bytes(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let builder = self.request(Method::GET, path, &[]);
        match self.send(Method::GET, path, builder).await? {
            Some(response) => Ok(Some(response.bytes().await?.to_vec())),
            None => Ok(None),
        }
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.write_json(Method::POST, path, body).await
    }

    pub async fn patch_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.write_json(Method::PATCH, path, body).await
    }

    async fn write_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let builder = self.request(method.clone(), path, &[]).json(body);
        let response = self
            .send(method.clone(), path, builder)
            .await?
            .ok_or_else(|| anyhow!("{} {} returned 404", method, path))?;
        Ok(response.json().await?)
    }

    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: reqwest::multipart::Form) -> Result<T> {
        let builder = self.request(Method::POST, path, &[]).multipart(form);
        let response = self
            .send(Method::POST, path, builder)
            .await?
            .ok_or_else(|| anyhow!("POST {} returned 404", path))?;
        Ok(response.json().await?)
    }

    /// DELETE a resource. Returns false if it did not exist.
    pub async fn delete(&self, path: &str) -> Result<bool> {
        let builder = self.request(Method::DELETE, path, &[]);
        Ok(self.send(Method::DELETE, path, builder).await?.is_some())
    }
}
