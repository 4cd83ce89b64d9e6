//! Process-lifetime extraction and fallback counters.

use chrono::{DateTime, Utc};
use eisenstein_core::{ExtractionMethod, FallbackReason};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of reasons listed in [`MetricsSummary::top_reasons`].
pub const TOP_REASONS: usize = 5;

/// Shared metrics collector. Clones share the same counters.
#[derive(Debug, Clone)]
pub struct ExtractionMetrics {
    inner: Arc<ExtractionMetricsInner>,
}

#[derive(Debug)]
struct ExtractionMetricsInner {
    // Fallback usage
    total_fallback_usages: AtomicU64,
    last_fallback: parking_lot::Mutex<Option<DateTime<Utc>>>,
    fallback_reasons: parking_lot::Mutex<BTreeMap<String, u64>>,

    // Request outcomes
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    total_processing_ms: parking_lot::Mutex<f64>,
    method_breakdown: parking_lot::Mutex<BTreeMap<ExtractionMethod, u64>>,
}

impl Default for ExtractionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionMetrics {
    /// Creates a new metrics collector.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ExtractionMetricsInner {
                total_fallback_usages: AtomicU64::new(0),
                last_fallback: parking_lot::Mutex::new(None),
                fallback_reasons: parking_lot::Mutex::new(BTreeMap::new()),
                total_requests: AtomicU64::new(0),
                successful_requests: AtomicU64::new(0),
                failed_requests: AtomicU64::new(0),
                total_processing_ms: parking_lot::Mutex::new(0.0),
                method_breakdown: parking_lot::Mutex::new(BTreeMap::new()),
            }),
        }
    }

    /// Records one fallback generation.
    pub fn record_fallback(&self, reason: &FallbackReason) {
        self.inner.total_fallback_usages.fetch_add(1, Ordering::Relaxed);
        *self.inner.last_fallback.lock() = Some(Utc::now());
        *self
            .inner
            .fallback_reasons
            .lock()
            .entry(reason.to_string())
            .or_insert(0) += 1;
    }

    /// Records the outcome of one storyboard request.
    ///
    /// `method` is the extraction strategy that succeeded, if any.
    pub fn record_request(
        &self,
        successful: bool,
        method: Option<ExtractionMethod>,
        processing_time_ms: f64,
    ) {
        self.inner.total_requests.fetch_add(1, Ordering::Relaxed);
        if successful {
            self.inner.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inner.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
        *self.inner.total_processing_ms.lock() += processing_time_ms.max(0.0);
        if let Some(method) = method {
            *self.inner.method_breakdown.lock().entry(method).or_insert(0) += 1;
        }
    }

    /// Gets the number of fallback generations.
    pub fn total_fallback_usages(&self) -> u64 {
        self.inner.total_fallback_usages.load(Ordering::Relaxed)
    }

    /// Gets the count for one fallback reason.
    pub fn fallback_count(&self, reason: &FallbackReason) -> u64 {
        self.inner
            .fallback_reasons
            .lock()
            .get(&reason.to_string())
            .copied()
            .unwrap_or(0)
    }

    /// Gets the number of recorded requests.
    pub fn total_requests(&self) -> u64 {
        self.inner.total_requests.load(Ordering::Relaxed)
    }

    /// Gets the share of requests that produced a structured storyboard (1.0 when none).
    pub fn success_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 1.0;
        }
        self.inner.successful_requests.load(Ordering::Relaxed) as f64 / total as f64
    }

    /// Creates a deep-copied, serializable snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_requests = self.total_requests();
        let total_ms = *self.inner.total_processing_ms.lock();
        MetricsSnapshot {
            total_fallback_usages: self.total_fallback_usages(),
            last_fallback_timestamp: *self.inner.last_fallback.lock(),
            fallback_reasons: self.inner.fallback_reasons.lock().clone(),
            total_requests,
            successful_requests: self.inner.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.inner.failed_requests.load(Ordering::Relaxed),
            average_processing_time_ms: if total_requests == 0 {
                0.0
            } else {
                total_ms / total_requests as f64
            },
            extraction_method_breakdown: self
                .inner
                .method_breakdown
                .lock()
                .iter()
                .map(|(method, count)| (method.to_string(), *count))
                .collect(),
        }
    }

    /// Summarises fallback usage.
    pub fn summary(&self) -> MetricsSummary {
        let snapshot = self.snapshot();

        let mut reasons: Vec<ReasonCount> = snapshot
            .fallback_reasons
            .iter()
            .map(|(reason, count)| ReasonCount {
                reason: reason.clone(),
                count: *count,
            })
            .collect();
        reasons.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.reason.cmp(&b.reason)));
        reasons.truncate(TOP_REASONS);

        let fallback_rate = if snapshot.total_requests == 0 {
            0.0
        } else {
            (snapshot.total_fallback_usages as f64 / snapshot.total_requests as f64).min(1.0)
        };

        MetricsSummary {
            total_fallback_usages: snapshot.total_fallback_usages,
            top_reasons: reasons,
            last_fallback_timestamp: snapshot.last_fallback_timestamp,
            fallback_rate,
            success_rate: self.success_rate(),
        }
    }

    /// Zeroes every counter.
    pub fn reset(&self) {
        self.inner.total_fallback_usages.store(0, Ordering::Relaxed);
        *self.inner.last_fallback.lock() = None;
        self.inner.fallback_reasons.lock().clear();
        self.inner.total_requests.store(0, Ordering::Relaxed);
        self.inner.successful_requests.store(0, Ordering::Relaxed);
        self.inner.failed_requests.store(0, Ordering::Relaxed);
        *self.inner.total_processing_ms.lock() = 0.0;
        self.inner.method_breakdown.lock().clear();
    }
}

/// Serializable snapshot of extraction metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Fallback storyboards generated
    pub total_fallback_usages: u64,
    /// When the last fallback storyboard was generated
    pub last_fallback_timestamp: Option<DateTime<Utc>>,
    /// Fallback count by reason
    pub fallback_reasons: BTreeMap<String, u64>,
    /// Storyboard requests processed
    pub total_requests: u64,
    /// Requests that produced a structured storyboard
    pub successful_requests: u64,
    /// Requests that did not
    pub failed_requests: u64,
    /// Mean processing time per request
    pub average_processing_time_ms: f64,
    /// Successful extractions by strategy
    pub extraction_method_breakdown: BTreeMap<String, u64>,
}

/// One entry of [`MetricsSummary::top_reasons`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReasonCount {
    /// Reason key
    pub reason: String,
    /// Times it was recorded
    pub count: u64,
}

/// Condensed view of fallback usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    /// Fallback storyboards generated
    pub total_fallback_usages: u64,
    /// Most frequent reasons, count descending then name ascending
    pub top_reasons: Vec<ReasonCount>,
    /// When the last fallback storyboard was generated
    pub last_fallback_timestamp: Option<DateTime<Utc>>,
    /// Fallbacks per request
    pub fallback_rate: f64,
    /// Structured successes per request
    pub success_rate: f64,
}
