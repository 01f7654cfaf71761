//! A client for a remote plotline sample source.
//!
//! Lets a zoom controller run against a remote plotline server instead of the
//! in-process store. The underlying hyper client owns a connection pool, so
//! one [RemoteSampler] should be reused across requests.

use crate::error::ReductionError;
use crate::models::{SampleRequest, SampleResponse, SeriesKey, StepRange};
use crate::sampler::Sampled;
use crate::zoom::SampleSource;

use async_trait::async_trait;
use axum::http::header;
use hyper::{Body, Client, Method, Request};
use url::Url;

/// Client for the `/v1/sample` endpoint of a remote plotline server.
pub struct RemoteSampler {
    /// Underlying hyper HTTP client
    client: Client<hyper::client::HttpConnector>,
    /// Resolved endpoint URL
    endpoint: Url,
}

impl RemoteSampler {
    /// Return a RemoteSampler for a server base URL.
    ///
    /// # Arguments
    ///
    /// * `base`: Server base URL, e.g. `http://localhost:8080`
    pub fn new(base: &Url) -> Result<Self, ReductionError> {
        let endpoint = base.join("v1/sample")?;
        Ok(Self {
            client: Client::new(),
            endpoint,
        })
    }
}

#[async_trait]
impl SampleSource for RemoteSampler {
    async fn fetch(
        &self,
        key: &SeriesKey,
        range: Option<(u64, u64)>,
        max_points: usize,
        preview: bool,
    ) -> Result<Sampled, ReductionError> {
        let request_data = SampleRequest {
            key: key.clone(),
            range: range.map(|(min, max)| StepRange { min, max }),
            max_points,
            preview,
        };
        let body = serde_json::to_vec(&request_data)?;
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.as_str())
            .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(body))?;
        let response = self.client.request(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReductionError::RemoteStatus { status });
        }
        let bytes = hyper::body::to_bytes(response.into_body()).await?;
        let decoded: SampleResponse = serde_json::from_slice(&bytes)?;
        Ok(Sampled {
            points: decoded.points,
            mode: decoded.mode,
            total: decoded.total,
        })
    }
}
