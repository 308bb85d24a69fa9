//! Search-job protocol tests against the in-process fake vendor.

use planet_client::fake::{FakeVendor, PollReply, SubmitReply, JOB_PATH};
use planet_client::{AsyncJobClient, CancellationToken, ClientError, Credentials, PollPolicy};
use serde_json::json;
use stapi_types::vendor::ImagingWindowSearch;
use std::time::Duration;

const INTERVAL: Duration = Duration::from_millis(40);

fn search() -> ImagingWindowSearch {
    ImagingWindowSearch {
        datetime: "2025-06-01T00:00:00+00:00/2025-06-08T00:00:00+00:00".to_string(),
        pl_number: "INT-003001".to_string(),
        product: "Assured Tasking".to_string(),
        geometry: stapi_types::Geometry::point(13.4, 52.5),
    }
}

fn windows() -> serde_json::Value {
    json!([
        {
            "id": "iw-1",
            "start_time": "2025-06-02T10:00:00+00:00",
            "end_time": "2025-06-02T10:05:00+00:00",
            "off_nadir_angle_min": 3.5,
            "off_nadir_angle_max": 21.0,
            "satellite_type": "SKYSAT",
            "cloud_forecast": [{ "prediction": 0.4 }]
        }
    ])
}

fn jobs(vendor: &FakeVendor, policy: PollPolicy) -> AsyncJobClient {
    let mut settings = vendor.settings(policy.interval);
    settings.poll = policy;
    AsyncJobClient::new(reqwest::Client::new(), &settings)
}

fn unbounded() -> PollPolicy {
    PollPolicy {
        interval: INTERVAL,
        max_wait: None,
        max_polls: None,
    }
}

fn creds() -> Credentials {
    Credentials::new("tok-1")
}

#[tokio::test]
async fn submission_error_fails_without_polling() {
    let vendor = FakeVendor::start().await;
    vendor
        .set_submit(SubmitReply::Error(403, "forbidden".to_string()))
        .await;
    let err = jobs(&vendor, unbounded())
        .run_job(&search(), &creds())
        .await
        .unwrap_err();
    match err {
        ClientError::UpstreamRequest { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "forbidden");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(vendor.calls().await, 1);
}

#[tokio::test]
async fn missing_location_is_a_protocol_error() {
    let vendor = FakeVendor::start().await;
    vendor.set_submit(SubmitReply::NoLocation).await;
    let err = jobs(&vendor, unbounded())
        .run_job(&search(), &creds())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Protocol(ref m) if m.contains("location")));
    assert_eq!(vendor.calls().await, 1);
}

#[tokio::test]
async fn done_on_first_poll_returns_windows() {
    let vendor = FakeVendor::start().await;
    vendor.push_poll(PollReply::done(windows())).await;
    let result = jobs(&vendor, unbounded())
        .run_job(&search(), &creds())
        .await
        .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id, "iw-1");
    assert_eq!(result[0].cloud_forecast[0].prediction, Some(0.4));

    let requests = vendor.requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].body.as_ref().unwrap()["pl_number"], "INT-003001");
    assert_eq!(requests[1].method, "GET");
    assert_eq!(requests[1].path, JOB_PATH);
    for r in &requests {
        assert_eq!(r.authorization.as_deref(), Some("api-key tok-1"));
    }
}

#[tokio::test]
async fn pending_polls_wait_the_fixed_interval() {
    let vendor = FakeVendor::start().await;
    for _ in 0..3 {
        vendor.push_poll(PollReply::running()).await;
    }
    vendor.push_poll(PollReply::done(windows())).await;
    jobs(&vendor, unbounded())
        .run_job(&search(), &creds())
        .await
        .unwrap();

    let requests = vendor.requests().await;
    assert_eq!(requests.len(), 3 + 2);
    let polls = &requests[1..];
    for pair in polls.windows(2) {
        assert!(pair[1].at.duration_since(pair[0].at) >= INTERVAL);
    }
}

#[tokio::test]
async fn failed_job_carries_vendor_code_and_message() {
    let vendor = FakeVendor::start().await;
    vendor.push_poll(PollReply::running()).await;
    vendor.push_poll(PollReply::failed("X", "Y")).await;
    let err = jobs(&vendor, unbounded())
        .run_job(&search(), &creds())
        .await
        .unwrap_err();
    match err {
        ClientError::UpstreamJob { code, message } => {
            assert_eq!(code, "X");
            assert_eq!(message, "Y");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(vendor.calls().await, 3);
}

#[tokio::test]
async fn poll_http_error_is_terminal() {
    let vendor = FakeVendor::start().await;
    vendor.push_poll(PollReply::running()).await;
    vendor
        .push_poll(PollReply::Error(503, "maintenance".to_string()))
        .await;
    vendor.push_poll(PollReply::done(windows())).await;
    let err = jobs(&vendor, unbounded())
        .run_job(&search(), &creds())
        .await
        .unwrap_err();
    assert_eq!(err.upstream_status(), Some(503));
    assert_eq!(vendor.calls().await, 3);
}

#[tokio::test]
async fn absolute_location_is_polled_as_given() {
    let vendor = FakeVendor::start().await;
    vendor.set_submit(SubmitReply::AbsoluteLocation).await;
    vendor.push_poll(PollReply::done(json!([]))).await;
    let result = jobs(&vendor, unbounded())
        .run_job(&search(), &creds())
        .await
        .unwrap();
    assert!(result.is_empty());
    assert_eq!(vendor.requests().await[1].path, JOB_PATH);
}

#[tokio::test]
async fn done_without_windows_is_a_protocol_error() {
    let vendor = FakeVendor::start().await;
    vendor
        .push_poll(PollReply::Body(json!({ "status": "DONE" })))
        .await;
    let err = jobs(&vendor, unbounded())
        .run_job(&search(), &creds())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Protocol(_)));
}

#[tokio::test]
async fn max_polls_bounds_the_loop() {
    let vendor = FakeVendor::start().await;
    vendor.push_poll(PollReply::running()).await;
    let policy = PollPolicy {
        interval: Duration::from_millis(5),
        max_wait: None,
        max_polls: Some(4),
    };
    let err = jobs(&vendor, policy)
        .run_job(&search(), &creds())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::TimedOut { polls: 4, .. }));
    assert_eq!(vendor.calls().await, 1 + 4);
}

#[tokio::test]
async fn max_wait_bounds_the_loop() {
    let vendor = FakeVendor::start().await;
    vendor.push_poll(PollReply::running()).await;
    let policy = PollPolicy {
        interval: Duration::from_millis(30),
        max_wait: Some(Duration::from_millis(100)),
        max_polls: None,
    };
    let err = jobs(&vendor, policy)
        .run_job(&search(), &creds())
        .await
        .unwrap_err();
    match err {
        ClientError::TimedOut { polls, waited } => {
            assert!(polls >= 1);
            // Gave up only because one more interval would overrun the budget.
            assert!(waited + Duration::from_millis(30) > Duration::from_millis(100));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn cancellation_interrupts_the_wait() {
    let vendor = FakeVendor::start().await;
    vendor.push_poll(PollReply::running()).await;
    let policy = PollPolicy {
        interval: Duration::from_secs(30),
        max_wait: None,
        max_polls: None,
    };
    let client = jobs(&vendor, policy);
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });
    let err = tokio::time::timeout(
        Duration::from_secs(5),
        client.run_job_with_cancel(&search(), &creds(), &token),
    )
    .await
    .expect("cancellation should end the wait")
    .unwrap_err();
    assert!(matches!(err, ClientError::Cancelled));
    assert_eq!(vendor.calls().await, 2);
}
