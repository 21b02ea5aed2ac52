//! QJob Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{HealthResponse, StatusResponse, SubmitRequest, SubmitResponse};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// QJob Server Client
///
/// Provides a high-level interface to the QJob HTTP API.
///
/// # Example
///
/// ```no_run
/// use qjob_sdk::QJobClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = QJobClient::connect("http://127.0.0.1:8080").await?;
/// # Ok(())
/// # }
/// ```
pub struct QJobClient {
    client: Client,
    base_url: Url,
}

impl QJobClient {
    /// Connect to a QJob server
    ///
    /// # Arguments
    ///
    /// * `url` - Server base URL (e.g., `http://127.0.0.1:8080`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();
        let base_url =
            Url::parse(url).map_err(|e| SdkError::InvalidUrl(format!("{}: {}", url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(SdkError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                url
            )));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| SdkError::InvalidUrl(e.to_string()))
    }

    /// `job/{id}` with the id as one escaped path segment
    fn job_endpoint(&self, job_id: &str) -> Result<Url> {
        let mut url = self.endpoint("job/")?;
        url.path_segments_mut()
            .map_err(|()| SdkError::InvalidUrl(format!("{}: cannot be a base", self.base_url)))?
            .pop_if_empty()
            .push(job_id);
        Ok(url)
    }

    /// Submit a circuit
    ///
    /// Rejected submissions (`IGNORED`, `FAILED`) are returned as responses;
    /// only server-side failures are errors.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use qjob_sdk::{QJobClient, SubmitRequest};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = QJobClient::connect("http://127.0.0.1:8080").await?;
    /// let response = client
    ///     .submit(&SubmitRequest::new("OPENQASM 2.0; qreg q[1]; x q[0];").shots(10))
    ///     .await?;
    ///
    /// println!("Job ID: {:?} ({})", response.job_id, response.status);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit(&self, request: &SubmitRequest) -> Result<SubmitResponse> {
        let response = self
            .client
            .put(self.endpoint("job")?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body: SubmitResponse = parse_body(response).await?;
        if status.is_server_error() {
            return Err(SdkError::Server {
                status: status.as_u16(),
                message: body.reason.unwrap_or_else(|| body.status.clone()),
            });
        }
        Ok(body)
    }

    /// Fetch a job's status
    ///
    /// # Errors
    /// - `SdkError::NotFound` if the server does not know the id
    pub async fn status(&self, job_id: &str) -> Result<StatusResponse> {
        let url = self.job_endpoint(job_id)?;
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(SdkError::NotFound(job_id.to_string())),
            status if status.is_success() => parse_body(response).await,
            status => Err(SdkError::Server {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Poll until the job reaches a terminal state
    ///
    /// # Errors
    /// - `SdkError::Timeout` if the job is still running after `timeout`
    pub async fn wait_for_terminal(
        &self,
        job_id: &str,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<StatusResponse> {
        let deadline = Instant::now() + timeout;
        loop {
            let status = self.status(job_id).await?;
            if status.is_terminal() {
                return Ok(status);
            }
            if Instant::now() + poll_interval > deadline {
                return Err(SdkError::Timeout(job_id.to_string()));
            }
            sleep(poll_interval).await;
        }
    }

    /// Server liveness and queue depth
    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self.client.get(self.endpoint("health")?).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SdkError::Server {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        parse_body(response).await
    }
}

async fn parse_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| SdkError::Server {
        status: status.as_u16(),
        message: format!(
            "unexpected response ({}): {}",
            e,
            String::from_utf8_lossy(&bytes)
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_rejects_bad_urls() {
        assert!(matches!(
            QJobClient::connect("not a url").await,
            Err(SdkError::InvalidUrl(_))
        ));
        assert!(matches!(
            QJobClient::connect("ftp://127.0.0.1:8080").await,
            Err(SdkError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_endpoints_join_base_url() {
        let client = QJobClient::connect("http://127.0.0.1:8080").await.unwrap();
        assert_eq!(
            client.endpoint("job/abc").unwrap().as_str(),
            "http://127.0.0.1:8080/job/abc"
        );
    }

    #[tokio::test]
    async fn test_job_id_is_one_path_segment() {
        let client = QJobClient::connect("http://127.0.0.1:8080/qjob/").await.unwrap();

        let plain = client.job_endpoint("abc-123").unwrap();
        assert_eq!(plain.as_str(), "http://127.0.0.1:8080/qjob/job/abc-123");

        let hostile = client.job_endpoint("../health?x=1#frag").unwrap();
        assert_eq!(hostile.path(), "/qjob/job/..%2Fhealth%3Fx=1%23frag");
        assert!(hostile.query().is_none());
        assert!(hostile.fragment().is_none());
    }
}
