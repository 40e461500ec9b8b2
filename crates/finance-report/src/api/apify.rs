//! Apify API client
//!
//! Starts an actor run, polls it until it reaches a terminal status and then
//! downloads the run's default dataset.

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{Dataset, DatasetSource};
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};

/// Seconds the API may hold a request open waiting for the run to finish
const WAIT_FOR_FINISH_SECS: u64 = 60;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Apify API client
#[derive(Clone)]
pub struct ApifyClient {
    client: Client,
    api_base: String,
    token: String,
    rate_limiter: SharedRateLimiter,
    actor_timeout: Duration,
}

/// Every response body is wrapped in `{"data": ...}`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActorRun {
    id: String,
    status: String,
    default_dataset_id: String,
}

impl ActorRun {
    fn is_terminal(&self) -> bool {
        matches!(
            self.status.as_str(),
            "SUCCEEDED" | "FAILED" | "ABORTED" | "TIMED-OUT"
        )
    }

    fn succeeded(&self) -> bool {
        self.status == "SUCCEEDED"
    }
}

impl ApifyClient {
    /// Create a client from the report configuration. Requires a token.
    pub fn new(config: &ReportConfig) -> Result<Self> {
        let token = config
            .apify_token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                ReportError::ConfigError("APIFY_TOKEN environment variable not set".to_string())
            })?;

        let client = Client::builder()
            // Long-polling requests stay open up to WAIT_FOR_FINISH_SECS
            .timeout(config.request_timeout + Duration::from_secs(WAIT_FOR_FINISH_SECS))
            .build()?;

        let quota = Quota::per_minute(
            NonZeroU32::new(config.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN),
        );

        Ok(Self {
            client,
            api_base: config.apify_api_base.trim_end_matches('/').to_string(),
            token,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            actor_timeout: config.actor_timeout,
        })
    }

    /// Start a run of `actor_id` with `input`
    async fn start_run(&self, actor_id: &str, input: &Value) -> Result<ActorRun> {
        let url = format!(
            "{}/acts/{}/runs?waitForFinish={WAIT_FOR_FINISH_SECS}",
            self.api_base,
            actor_path(actor_id)
        );
        let run: Envelope<ActorRun> = self.send(self.client.post(&url).json(input)).await?;
        debug!(actor = %actor_id, run_id = %run.data.id, status = %run.data.status, "Actor run started");
        Ok(run.data)
    }

    /// Poll until the run reaches a terminal status or the timeout passes
    async fn wait_for_run(&self, mut run: ActorRun) -> Result<ActorRun> {
        let started = Instant::now();
        while !run.is_terminal() {
            if started.elapsed() >= self.actor_timeout {
                return Err(ReportError::ApiError(format!(
                    "Actor run {} did not finish within {}s (last status {})",
                    run.id,
                    self.actor_timeout.as_secs(),
                    run.status
                )));
            }
            let url = format!(
                "{}/actor-runs/{}?waitForFinish={WAIT_FOR_FINISH_SECS}",
                self.api_base, run.id
            );
            let polled: Envelope<ActorRun> = self.send(self.client.get(&url)).await?;
            run = polled.data;
            debug!(run_id = %run.id, status = %run.status, "Actor run polled");
        }
        Ok(run)
    }

    /// Download every item of a dataset
    async fn dataset_items(&self, dataset_id: &str) -> Result<Vec<Value>> {
        let url = format!("{}/datasets/{dataset_id}/items?clean=true", self.api_base);
        self.send(self.client.get(&url)).await
    }

    /// Send an authenticated request and decode the JSON body
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        // Wait for rate limiter
        self.rate_limiter.until_ready().await;

        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ReportError::RateLimitExceeded {
                provider: "Apify".to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::ApiError(format!("HTTP {status}: {body}")));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl DatasetSource for ApifyClient {
    async fn run_actor(&self, actor_id: &str, input: Value) -> Result<Dataset> {
        info!(actor = %actor_id, "Running actor");
        let run = self.start_run(actor_id, &input).await?;
        let run = self.wait_for_run(run).await?;

        if !run.succeeded() {
            warn!(actor = %actor_id, run_id = %run.id, status = %run.status, "Actor run did not succeed");
            return Err(ReportError::ApiError(format!(
                "Actor {actor_id} run {} finished with status {}",
                run.id, run.status
            )));
        }

        let items = self.dataset_items(&run.default_dataset_id).await?;
        info!(actor = %actor_id, dataset = %run.default_dataset_id, items = items.len(), "Dataset fetched");
        Ok(Dataset::new(run.default_dataset_id, items))
    }
}

/// `user/actor` becomes the `user~actor` form used in API paths
fn actor_path(actor_id: &str) -> String {
    actor_id.replacen('/', "~", 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn test_actor_path() {
        assert_eq!(actor_path("canadesk/yahoo-finance"), "canadesk~yahoo-finance");
        assert_eq!(actor_path("already~escaped"), "already~escaped");
    }

    #[test]
    fn test_run_envelope_parsing() {
        let body = json!({
            "data": {
                "id": "run1",
                "actId": "act1",
                "status": "RUNNING",
                "defaultDatasetId": "ds1"
            }
        });
        let run: Envelope<ActorRun> = serde_json::from_value(body).unwrap();
        assert_eq!(run.data.default_dataset_id, "ds1");
        assert!(!run.data.is_terminal());
    }

    #[test]
    fn test_terminal_statuses() {
        let run = |status: &str| ActorRun {
            id: "run1".to_string(),
            status: status.to_string(),
            default_dataset_id: "ds1".to_string(),
        };
        assert!(run("SUCCEEDED").is_terminal() && run("SUCCEEDED").succeeded());
        assert!(run("TIMED-OUT").is_terminal() && !run("TIMED-OUT").succeeded());
        assert!(!run("TIMING-OUT").is_terminal());
        assert!(!run("READY").is_terminal());
    }

    #[test]
    fn test_client_requires_token() {
        let config = ReportConfig::default();
        assert!(matches!(ApifyClient::new(&config), Err(ReportError::ConfigError(_))));

        let config = ReportConfig::builder()
            .apify_token("token")
            .apify_api_base("http://localhost:1234/v2/")
            .build()
            .unwrap();
        let client = ApifyClient::new(&config).unwrap();
        assert_eq!(client.api_base, "http://localhost:1234/v2");
    }

    /// Canned reply for requests whose request line starts with `prefix`
    struct Route {
        prefix: &'static str,
        status: u16,
        body: Value,
    }

    fn route(prefix: &'static str, status: u16, body: Value) -> Route {
        Route {
            prefix,
            status,
            body,
        }
    }

    fn run_body(status: &str) -> Value {
        json!({"data": {"id": "run1", "status": status, "defaultDatasetId": "ds1"}})
    }

    /// Read one HTTP/1.1 request, headers and body
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&data);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let body_len = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        line.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|len| len.trim().parse::<usize>().unwrap())
                    })
                    .unwrap_or(0);
                if data.len() >= head_end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).into_owned()
    }

    /// Local Apify stand-in. Returns the API base and the requests received.
    async fn serve(routes: Vec<Route>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&received);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let request = read_request(&mut socket).await;
                let (status, body) = routes
                    .iter()
                    .find(|route| request.starts_with(route.prefix))
                    .map_or((404, json!({"error": "no route"})), |route| {
                        (route.status, route.body.clone())
                    });
                log.lock().unwrap().push(request);

                let reason = match status {
                    200 | 201 => "OK",
                    429 => "Too Many Requests",
                    _ => "Not Found",
                };
                let body = body.to_string();
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\ncontent-type: application/json\r\n\
                     content-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        (format!("http://{addr}"), received)
    }

    fn client_for(api_base: &str, actor_timeout: Duration) -> ApifyClient {
        let config = ReportConfig::builder()
            .apify_token("test-token")
            .apify_api_base(api_base)
            .actor_timeout(actor_timeout)
            .build()
            .unwrap();
        ApifyClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_run_actor_polls_until_succeeded() {
        let (api_base, received) = serve(vec![
            route("POST /acts/canadesk~yahoo-finance/runs", 201, run_body("RUNNING")),
            route("GET /actor-runs/run1", 200, run_body("SUCCEEDED")),
            route(
                "GET /datasets/ds1/items",
                200,
                json!([{"ticker": "AAPL"}, {"ticker": "MSFT"}]),
            ),
        ])
        .await;
        let client = client_for(&api_base, Duration::from_secs(30));

        let dataset = client
            .run_actor("canadesk/yahoo-finance", json!({"process": "gi", "tickers": ["AAPL"]}))
            .await
            .unwrap();

        assert_eq!(dataset.id, "ds1");
        assert_eq!(dataset.items.len(), 2);
        assert_eq!(dataset.items[1]["ticker"], "MSFT");

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 3);
        assert!(received[1].starts_with("GET /actor-runs/run1?waitForFinish=60"));
        assert!(received[2].starts_with("GET /datasets/ds1/items?clean=true"));
        assert!(
            received
                .iter()
                .all(|request| request.to_ascii_lowercase().contains("authorization: bearer test-token"))
        );
        assert!(received[0].contains(r#""process":"gi""#));
    }

    #[tokio::test]
    async fn test_run_actor_fails_on_unsuccessful_run() {
        let (api_base, received) = serve(vec![
            route("POST /acts/canadesk~yahoo-finance/runs", 201, run_body("RUNNING")),
            route("GET /actor-runs/run1", 200, run_body("FAILED")),
        ])
        .await;
        let client = client_for(&api_base, Duration::from_secs(30));

        let err = client
            .run_actor("canadesk/yahoo-finance", json!({"process": "gi"}))
            .await
            .unwrap_err();

        match err {
            ReportError::ApiError(msg) => assert!(msg.contains("FAILED")),
            other => panic!("Expected ApiError, got {other:?}"),
        }
        // The dataset of a failed run is never requested
        assert!(
            !received
                .lock()
                .unwrap()
                .iter()
                .any(|request| request.contains("/datasets/"))
        );
    }

    #[tokio::test]
    async fn test_run_actor_maps_429_to_rate_limit() {
        let (api_base, _received) = serve(vec![route(
            "POST /acts/canadesk~yahoo-finance/runs",
            429,
            json!({"error": {"type": "rate-limit-exceeded"}}),
        )])
        .await;
        let client = client_for(&api_base, Duration::from_secs(30));

        let err = client
            .run_actor("canadesk/yahoo-finance", json!({"process": "gi"}))
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::RateLimitExceeded { provider } if provider == "Apify"));
    }

    #[tokio::test]
    async fn test_run_actor_times_out() {
        let (api_base, received) = serve(vec![route(
            "POST /acts/canadesk~yahoo-finance/runs",
            201,
            run_body("RUNNING"),
        )])
        .await;
        let client = client_for(&api_base, Duration::ZERO);

        let err = client
            .run_actor("canadesk/yahoo-finance", json!({"process": "gi"}))
            .await
            .unwrap_err();

        match err {
            ReportError::ApiError(msg) => assert!(msg.contains("did not finish")),
            other => panic!("Expected ApiError, got {other:?}"),
        }
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    #[ignore] // Requires APIFY_TOKEN and network access
    async fn test_run_yahoo_actor() {
        let config = ReportConfig::builder().from_env().build().unwrap();
        let client = ApifyClient::new(&config).unwrap();
        let dataset = client
            .run_actor(&config.yahoo_actor, json!({"process": "gi", "tickers": ["AAPL"]}))
            .await
            .unwrap();
        assert!(!dataset.items.is_empty());
    }
}
