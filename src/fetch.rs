//! HTTP client abstraction for making requests to the BNUPremios API

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, RequestBuilder,
};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::Error;
use premios_auth::{extract_error_message, Credential};

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    timeout: Option<Duration>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            query_params: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Attach the bearer credential
    pub fn bearer_auth(mut self, credential: &Credential) -> Self {
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", credential.as_str())) {
            self.headers.insert(AUTHORIZATION, value);
        }
        self
    }

    /// Add a query parameter
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query_params.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, Error> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    /// Limit how long the whole request may take
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn build(&self) -> Result<RequestBuilder, Error> {
        let mut url = Url::parse(&self.url)?;

        if !self.query_params.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                query_pairs.append_pair(key, value);
            }
        }

        let mut req = self
            .client
            .request(self.method.clone(), url.as_str())
            .headers(self.headers.clone());

        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        if let Some(body) = &self.body {
            req = req.body(body.clone());
        }

        Ok(req)
    }

    async fn send(&self) -> Result<String, Error> {
        let response = self.build()?.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: extract_error_message(&text),
            });
        }

        Ok(text)
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let text = self.send().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Execute the request, ignoring the response body
    pub async fn execute_empty(&self) -> Result<(), Error> {
        self.send().await.map(|_| ())
    }
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a POST request
    pub fn post<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::POST)
    }

    /// Create a PUT request
    pub fn put<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::PUT)
    }

    /// Create a DELETE request
    pub fn delete<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::DELETE)
    }
}
