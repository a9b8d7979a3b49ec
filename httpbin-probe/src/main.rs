use core::time::Duration;
use std::sync::LazyLock;

use metrics::counter;
use reqwest::StatusCode;
use retry_exec::{Attempt, RetryError, RetryExecutor, RetryPolicy};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

mod telemetry;

static HTTPBIN_URL: LazyLock<String> = LazyLock::new(|| {
    std::env::var("HTTPBIN_URL").unwrap_or_else(|_| "https://httpbin.org".to_string())
});
static PROBE_INTERVAL_SECS: LazyLock<u64> = LazyLock::new(|| {
    std::env::var("PROBE_INTERVAL_SECS")
        .map(|x| x.parse().expect("PROBE_INTERVAL_SECS must be a number"))
        .unwrap_or(10)
});

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();
    telemetry::init_metrics()?;

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received ctrl-c, shutting down");
                shutdown.cancel();
            }
        }
    });

    let (bounded, unbounded, periodic) = tokio::join!(
        bounded_probe(&http_client),
        unbounded_probe(&http_client, shutdown.clone()),
        periodic_probe(&http_client, shutdown.clone()),
    );
    bounded?;
    unbounded?;
    periodic
}

/// One bounded run: up to 6 attempts spaced 5s apart, then surface whatever
/// status the last attempt produced.
async fn run_bounded(
    http_client: &reqwest::Client,
) -> Result<StatusCode, RetryError<reqwest::Error>> {
    let executor = RetryExecutor::new(RetryPolicy::fixed_backoff(Duration::from_secs(5), 5));
    let url = format!("{}/status/200,401,500", &*HTTPBIN_URL);
    executor
        .execute(
            || probe_once(http_client, &url),
            |status: &StatusCode| !status.is_success(),
            log_retry,
        )
        .await
}

#[instrument(skip(http_client))]
async fn bounded_probe(http_client: &reqwest::Client) -> anyhow::Result<()> {
    let status = run_bounded(http_client).await?;
    if status.is_success() {
        counter!("httpbin_probe.bounded.success").increment(1);
        info!(%status, "Probe succeeded");
    } else {
        counter!("httpbin_probe.bounded.failure").increment(1);
        warn!(%status, "Probe still failing after all retries");
    }
    Ok(())
}

/// Retries forever at a constant 5s until the endpoint finally returns a 2xx.
/// The shutdown token is the only way out while it keeps failing.
#[instrument(skip(http_client, shutdown))]
async fn unbounded_probe(
    http_client: &reqwest::Client,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let executor = RetryExecutor::new(RetryPolicy::infinite_fixed(Duration::from_secs(5)))
        .with_cancellation(shutdown);
    let url = format!("{}/status/200,400,401,404,500", &*HTTPBIN_URL);
    match executor
        .execute(
            || probe_once(http_client, &url),
            |status: &StatusCode| !status.is_success(),
            log_retry,
        )
        .await
    {
        Ok(status) => {
            counter!("httpbin_probe.unbounded.success").increment(1);
            info!(%status, "Probe eventually succeeded");
            Ok(())
        }
        Err(RetryError::Cancelled { attempts }) => {
            info!(attempts, "Unbounded probe cancelled");
            Ok(())
        }
        Err(err) => {
            counter!("httpbin_probe.unbounded.failure").increment(1);
            Err(err.into())
        }
    }
}

/// Re-runs the bounded probe on a fixed interval until shutdown. A failing
/// run is logged and the loop keeps going.
#[instrument(skip(http_client, shutdown))]
async fn periodic_probe(
    http_client: &reqwest::Client,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(Duration::from_secs(*PROBE_INTERVAL_SECS));
    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                info!("Periodic probe stopped");
                return Ok(());
            }
            _ = interval.tick() => {}
        }
        match run_bounded(http_client).await {
            Ok(status) if status.is_success() => {
                counter!("httpbin_probe.periodic.success").increment(1);
                info!(%status, "Periodic probe succeeded");
            }
            Ok(status) => {
                counter!("httpbin_probe.periodic.failure").increment(1);
                warn!(%status, "Periodic probe exhausted its retries");
            }
            Err(err) => {
                counter!("httpbin_probe.periodic.failure").increment(1);
                warn!("Periodic probe failed: {err:?}");
            }
        }
    }
}

async fn probe_once(http_client: &reqwest::Client, url: &str) -> reqwest::Result<StatusCode> {
    http_client.post(url).send().await.map(|r| r.status())
}

fn log_retry(attempt: Attempt<'_, StatusCode>) {
    warn!(
        status = %attempt.outcome,
        attempt = attempt.index,
        wait_secs = attempt.wait.as_secs(),
        "Request failed, waiting before next retry"
    );
}
