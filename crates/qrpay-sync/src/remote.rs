//! # Remote Sync
//!
//! HTTP client for the QR / total service.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Service Endpoints                               │
//! │                                                                         │
//! │  fetch_qr(total)                                                       │
//! │  ──────────────                                                        │
//! │  GET  {base}/qrcode?totalAmount=25.5                                   │
//! │  ◄─── 200 image/png (raw bytes)                                        │
//! │                                                                         │
//! │  push_total(total)                                                     │
//! │  ────────────────                                                      │
//! │  POST {base}/update-total                                              │
//! │       Content-Type: application/json                                   │
//! │       {"totalAmount": 25.5}                                            │
//! │  ◄─── 200 JSON acknowledgement (content unused)                        │
//! │                                                                         │
//! │  Amounts go out as plain numbers: whole totals without a fraction     │
//! │  (10), others with the shortest decimal form (10.5, 12.34).          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Handling
//! - Transport errors (refused, reset, timeout) are retried with
//!   exponential backoff up to `retry.max_retries` times
//! - A push is never sent once a newer push has been issued (see
//!   [`PushTicket`]); the service must not end up holding an older total
//! - Non-2xx answers become [`SyncError::Service`] and are not retried
//! - 2xx answers with an unusable body become [`SyncError::MalformedResponse`]

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use qrpay_core::Money;
use reqwest::header::CONTENT_TYPE;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};
use url::Url;

use crate::config::{ClientConfig, RetrySettings};
use crate::error::{SyncError, SyncResult};

// =============================================================================
// Remote Sync Trait
// =============================================================================

/// The two operations the coordinator needs from the service.
///
/// Implemented over HTTP by [`HttpRemote`]; tests substitute scripted fakes.
#[async_trait]
pub trait RemoteSync: Send + Sync {
    /// Reports the current total to the service.
    ///
    /// Implementations must not send anything once `ticket` is superseded.
    async fn push_total(&self, total: Money, ticket: PushTicket) -> SyncResult<Ack>;

    /// Fetches the payment QR image for `total`.
    async fn fetch_qr(&self, total: Money) -> SyncResult<QrImage>;
}

// =============================================================================
// Push Ordering
// =============================================================================

/// Hands out [`PushTicket`]s and remembers the newest one issued.
#[derive(Debug, Clone, Default)]
pub struct PushSequencer {
    latest: Arc<AtomicU64>,
}

impl PushSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the ticket for the push answering ledger mutation `seq`.
    pub fn issue(&self, seq: u64) -> PushTicket {
        self.latest.fetch_max(seq, Ordering::AcqRel);
        PushTicket {
            seq,
            latest: self.latest.clone(),
        }
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }
}

/// Identifies one push by its ledger `seq`.
#[derive(Debug, Clone)]
pub struct PushTicket {
    seq: u64,
    latest: Arc<AtomicU64>,
}

impl PushTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Seq of the newest push issued so far.
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    /// True once a push for a later mutation has been issued.
    pub fn is_superseded(&self) -> bool {
        self.latest() > self.seq
    }

    fn check(&self) -> SyncResult<()> {
        if self.is_superseded() {
            return Err(SyncError::Superseded {
                seq: self.seq,
                latest: self.latest(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Whatever JSON the service sent back for a push.
#[derive(Debug, Clone, PartialEq)]
pub struct Ack(pub serde_json::Value);

/// Raw QR image bytes as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl QrImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// =============================================================================
// Wire Format
// =============================================================================

/// A money amount serialized as a JSON number.
#[derive(Debug, Clone, Copy)]
struct WireAmount(Money);

impl Serialize for WireAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let cents = self.0.cents();
        if cents % 100 == 0 {
            serializer.serialize_i64(cents / 100)
        } else {
            serializer.serialize_f64(cents as f64 / 100.0)
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTotalBody {
    total_amount: WireAmount,
}

// =============================================================================
// HTTP Remote
// =============================================================================

/// [`RemoteSync`] over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: Url,
    retry: RetrySettings,
}

impl HttpRemote {
    /// Builds the client from configuration.
    pub fn new(config: &ClientConfig) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.service.request_timeout())
            .connect_timeout(config.service.connect_timeout())
            .build()?;

        let mut base_url = config.base_url()?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        debug!(base_url = %base_url, "HTTP remote ready");

        Ok(HttpRemote {
            client,
            base_url,
            retry: config.retry.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn qr_url(&self, total: Money) -> SyncResult<Url> {
        let mut url = self.base_url.join("qrcode")?;
        url.query_pairs_mut()
            .append_pair("totalAmount", &total.to_wire_string());
        Ok(url)
    }

    fn update_total_url(&self) -> SyncResult<Url> {
        Ok(self.base_url.join("update-total")?)
    }

    /// Creates the exponential backoff used between transport retries.
    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.retry.initial_backoff(),
            initial_interval: self.retry.initial_backoff(),
            max_interval: self.retry.max_backoff(),
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// Runs `attempt` until it succeeds, fails non-retryably, or runs out of retries.
    ///
    /// With a `ticket`, every attempt (the first included) is skipped once
    /// the ticket is superseded.
    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        ticket: Option<&PushTicket>,
        mut attempt: F,
    ) -> SyncResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SyncResult<T>>,
    {
        let mut backoff = self.create_backoff();
        let mut retries = 0u32;

        loop {
            if let Some(ticket) = ticket {
                if let Err(e) = ticket.check() {
                    debug!(operation, retry = retries, error = %e, "Abandoning superseded request");
                    return Err(e);
                }
            }

            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && retries < self.retry.max_retries => {
                    retries += 1;
                    let delay = backoff
                        .next_backoff()
                        .unwrap_or_else(|| self.retry.max_backoff());
                    warn!(
                        operation,
                        retry = retries,
                        max_retries = self.retry.max_retries,
                        ?delay,
                        error = %e,
                        "Transport failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Maps a non-success status to [`SyncError::Service`], keeping the body text.
    async fn check_status(resp: reqwest::Response) -> SyncResult<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(SyncError::Service {
            status: status.as_u16(),
            body,
        })
    }

    async fn fetch_qr_once(&self, url: Url) -> SyncResult<QrImage> {
        let resp = Self::check_status(self.client.get(url).send().await?).await?;

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await?;

        if bytes.is_empty() {
            return Err(SyncError::MalformedResponse(
                "QR response body was empty".into(),
            ));
        }

        Ok(QrImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }

    async fn push_total_once(&self, url: Url, body: &UpdateTotalBody) -> SyncResult<Ack> {
        let resp = Self::check_status(self.client.post(url).json(body).send().await?).await?;
        let bytes = resp.bytes().await?;

        serde_json::from_slice(&bytes)
            .map(Ack)
            .map_err(|e| SyncError::MalformedResponse(format!("acknowledgement is not JSON: {}", e)))
    }
}

#[async_trait]
impl RemoteSync for HttpRemote {
    async fn push_total(&self, total: Money, ticket: PushTicket) -> SyncResult<Ack> {
        let url = self.update_total_url()?;
        let body = UpdateTotalBody {
            total_amount: WireAmount(total),
        };

        debug!(seq = ticket.seq(), total = %total.to_wire_string(), "Pushing total");
        self.with_retry("push_total", Some(&ticket), || {
            self.push_total_once(url.clone(), &body)
        })
        .await
    }

    async fn fetch_qr(&self, total: Money) -> SyncResult<QrImage> {
        let url = self.qr_url(total)?;

        debug!(%url, "Fetching QR code");
        self.with_retry("fetch_qr", None, || self.fetch_qr_once(url.clone()))
            .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
