//! Asynchronous imaging-window search: submit, follow `Location`, poll until terminal.

use crate::{ClientError, Credentials, PollPolicy, Settings};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, LOCATION};
use reqwest::Url;
use stapi_types::vendor::{ImagingWindow, ImagingWindowSearch, JobState, JobStatusBody};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Where a single job invocation stands.
#[derive(Debug)]
enum JobPhase {
    Submitted(Url),
    Polling { location: Url, polls: u32 },
    Done(Vec<ImagingWindow>),
    Failed { code: String, message: String },
    TimedOut { polls: u32, waited: Duration },
    Cancelled,
}

/// Runs search jobs against `POST {base}/imaging-windows/search`.
///
/// Holds no per-job state; one instance can serve concurrent jobs and shares the
/// underlying connection pool between them.
#[derive(Clone)]
pub struct AsyncJobClient {
    http: reqwest::Client,
    search_url: String,
    domain: Url,
    policy: PollPolicy,
}

impl AsyncJobClient {
    pub fn new(http: reqwest::Client, settings: &Settings) -> Self {
        Self {
            http,
            search_url: settings.iw_search_url(),
            domain: settings.api_domain.clone(),
            policy: settings.poll,
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Submit `request` and wait for the job to reach DONE or FAILED.
    pub async fn run_job(
        &self,
        request: &ImagingWindowSearch,
        credentials: &Credentials,
    ) -> Result<Vec<ImagingWindow>, ClientError> {
        self.run_job_with_cancel(request, credentials, &CancellationToken::new())
            .await
    }

    /// Like `run_job`, but ends early with `Cancelled` when `cancel` fires, including
    /// while a submit or poll request is in flight.
    pub async fn run_job_with_cancel(
        &self,
        request: &ImagingWindowSearch,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> Result<Vec<ImagingWindow>, ClientError> {
        let started = Instant::now();
        let mut phase = tokio::select! {
            biased;
            _ = cancel.cancelled() => JobPhase::Cancelled,
            location = self.submit(request, credentials) => JobPhase::Submitted(location?),
        };
        loop {
            phase = match phase {
                JobPhase::Submitted(location) => {
                    tracing::debug!(job_location = %location, "search job submitted");
                    JobPhase::Polling { location, polls: 0 }
                }
                JobPhase::Polling { location, polls } => {
                    let polled = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        body = self.poll(&location, credentials) => Some(body?),
                    };
                    match polled {
                        Some(body) => {
                            self.advance(location, polls + 1, body, started, cancel)
                                .await?
                        }
                        None => JobPhase::Cancelled,
                    }
                }
                JobPhase::Done(windows) => {
                    tracing::debug!(count = windows.len(), "search job done");
                    return Ok(windows);
                }
                JobPhase::Failed { code, message } => {
                    tracing::warn!(code = %code, message = %message, "search job failed");
                    return Err(ClientError::UpstreamJob { code, message });
                }
                JobPhase::TimedOut { polls, waited } => {
                    tracing::warn!(polls, ?waited, "search job poll budget exhausted");
                    return Err(ClientError::TimedOut { polls, waited });
                }
                JobPhase::Cancelled => {
                    tracing::debug!("search job cancelled");
                    return Err(ClientError::Cancelled);
                }
            };
        }
    }

    async fn advance(
        &self,
        location: Url,
        polls: u32,
        body: JobStatusBody,
        started: Instant,
        cancel: &CancellationToken,
    ) -> Result<JobPhase, ClientError> {
        let next = match body.state() {
            JobState::Done => match body.imaging_windows {
                Some(windows) => JobPhase::Done(windows),
                None => {
                    return Err(ClientError::Protocol(
                        "job status DONE without imaging_windows".to_string(),
                    ))
                }
            },
            JobState::Failed => JobPhase::Failed {
                code: body.error_code_text(),
                message: body.error_message_text(),
            },
            JobState::Pending(status) => {
                tracing::trace!(status, polls, "search job pending");
                let waited = started.elapsed();
                let out_of_polls = self.policy.max_polls.is_some_and(|max| polls >= max);
                let out_of_time = self
                    .policy
                    .max_wait
                    .is_some_and(|max| waited + self.policy.interval > max);
                if out_of_polls || out_of_time {
                    JobPhase::TimedOut { polls, waited }
                } else {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => JobPhase::Cancelled,
                        _ = tokio::time::sleep(self.policy.interval) => {
                            JobPhase::Polling { location, polls }
                        }
                    }
                }
            }
        };
        Ok(next)
    }

    async fn submit(
        &self,
        request: &ImagingWindowSearch,
        credentials: &Credentials,
    ) -> Result<Url, ClientError> {
        let res = self
            .http
            .post(&self.search_url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, credentials.header_value())
            .json(request)
            .send()
            .await?;
        let status = res.status();
        // Redirects are not followed; a 3xx carrying Location is an accepted submission.
        if !(status.is_success() || status.is_redirection()) {
            return Err(ClientError::from_response(res).await);
        }
        let location = match res.headers().get(LOCATION) {
            Some(v) => v
                .to_str()
                .map_err(|_| ClientError::Protocol("location header is not valid text".into()))?
                .to_string(),
            None => {
                let headers: Vec<String> =
                    res.headers().keys().map(|k| k.to_string()).collect();
                let body = res.text().await.unwrap_or_default();
                return Err(ClientError::Protocol(format!(
                    "header 'location' not found: {:?}, status {}, body {}",
                    headers, status, body
                )));
            }
        };
        self.resolve_location(&location)
    }

    async fn poll(
        &self,
        location: &Url,
        credentials: &Credentials,
    ) -> Result<JobStatusBody, ClientError> {
        let res = self
            .http
            .get(location.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, credentials.header_value())
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(ClientError::from_response(res).await);
        }
        let text = res.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ClientError::Decode(format!("job status: {}: {}", e, text)))
    }

    /// Absolute locations are kept; relative ones are joined onto the API domain.
    fn resolve_location(&self, location: &str) -> Result<Url, ClientError> {
        self.domain
            .join(location.trim())
            .map_err(|e| ClientError::Protocol(format!("invalid location {:?}: {}", location, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(domain: &str) -> AsyncJobClient {
        let settings = Settings::with_urls(domain, &format!("{}/tasking/v2", domain)).unwrap();
        AsyncJobClient::new(reqwest::Client::new(), &settings)
    }

    #[test]
    fn relative_location_joins_domain() {
        let c = client("https://api.planet.com");
        let url = c
            .resolve_location("/tasking/v2/imaging-windows/search/abc")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.planet.com/tasking/v2/imaging-windows/search/abc"
        );
    }

    #[test]
    fn absolute_location_is_kept() {
        let c = client("https://api.planet.com");
        let url = c
            .resolve_location("https://jobs.planet.com/search/abc")
            .unwrap();
        assert_eq!(url.as_str(), "https://jobs.planet.com/search/abc");
    }

    fn search() -> ImagingWindowSearch {
        ImagingWindowSearch {
            datetime: "2025-01-01T00:00:00+00:00/2025-01-02T00:00:00+00:00".to_string(),
            pl_number: "INT-003001".to_string(),
            product: "Assured Tasking".to_string(),
            geometry: stapi_types::Geometry::point(0.0, 0.0),
        }
    }

    #[tokio::test]
    async fn already_cancelled_token_skips_submission() {
        // Unroutable domain: a submission attempt would fail with a transport error.
        let c = client("http://127.0.0.1:9");
        let token = CancellationToken::new();
        token.cancel();
        let err = c
            .run_job_with_cancel(&search(), &Credentials::new("k"), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
    }

    #[tokio::test]
    async fn cancel_interrupts_a_hanging_submission() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let c = client(&format!("http://{}", addr));
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let started = std::time::Instant::now();
        let err = c
            .run_job_with_cancel(&search(), &Credentials::new("k"), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Cancelled), "{:?}", err);
        assert!(started.elapsed() < Duration::from_secs(5));
        server.abort();
    }
}
