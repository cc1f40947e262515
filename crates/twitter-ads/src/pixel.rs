//! Pixel request construction — the legacy 1x1 tracking-image URL and the
//! sink trait used to fire it.

use std::sync::{Arc, Mutex};

use url::Url;

use crate::order::OrderSummary;

/// Tracking pixel endpoint. Plain HTTP, matching the vendor's published tag.
pub const PIXEL_ENDPOINT: &str = "http://analytics.twitter.com/i/adsct";

/// Partner label the vendor assigns to this integration.
pub const PARTNER_ID: &str = "Twitter";

/// A fully resolved pixel call, ready to serialize into the image URL.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelRequest {
    pub txn_id: String,
    pub sale_amount: f64,
    pub order_quantity: u64,
}

impl PixelRequest {
    pub fn new(txn_id: impl Into<String>, summary: OrderSummary) -> Self {
        Self {
            txn_id: txn_id.into(),
            sale_amount: summary.sale_amount,
            order_quantity: summary.order_quantity,
        }
    }

    /// A page-view pixel: fixed transaction id, zero totals.
    pub fn page_view(txn_id: impl Into<String>) -> Self {
        Self::new(txn_id, OrderSummary::ZERO)
    }

    /// Build the tracking-image URL. Parameter order is fixed by the vendor.
    pub fn url(&self) -> Url {
        let mut url = Url::parse(PIXEL_ENDPOINT).expect("pixel endpoint is a valid URL");
        url.query_pairs_mut()
            .append_pair("txn_id", &self.txn_id)
            .append_pair("p_id", PARTNER_ID)
            .append_pair("tw_sale_amount", &format_amount(self.sale_amount))
            .append_pair("tw_order_quantity", &self.order_quantity.to_string());
        url
    }
}

/// Render an amount the way the vendor's own tag does: whole values without
/// a trailing fraction, fractional values as-is.
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{}", amount as i64)
    } else {
        amount.to_string()
    }
}

/// Fires pixel requests. Implementations are fire-and-forget: no result
/// reaches the adapter and nothing is retried.
pub trait PixelSink: Send + Sync {
    fn fire(&self, request: &PixelRequest);
}

/// Sink that drops every request, for adapters wired up without a transport.
pub struct NoOpPixelSink;

impl PixelSink for NoOpPixelSink {
    fn fire(&self, _request: &PixelRequest) {}
}

/// In-memory sink that records fired URLs for testing.
#[derive(Default)]
pub struct CapturePixelSink {
    fired: Mutex<Vec<String>>,
}

impl CapturePixelSink {
    pub fn new() -> Self {
        Self {
            fired: Mutex::new(Vec::new()),
        }
    }

    /// Every fired pixel, as the full image URL.
    pub fn fired(&self) -> Vec<String> {
        self.fired.lock().expect("pixel sink mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.fired.lock().expect("pixel sink mutex poisoned").len()
    }

    pub fn clear(&self) {
        self.fired.lock().expect("pixel sink mutex poisoned").clear();
    }
}

impl PixelSink for CapturePixelSink {
    fn fire(&self, request: &PixelRequest) {
        self.fired
            .lock()
            .expect("pixel sink mutex poisoned")
            .push(request.url().to_string());
    }
}

/// Convenience: a no-op sink for adapters that don't need delivery.
pub fn noop_pixel_sink() -> Arc<dyn PixelSink> {
    Arc::new(NoOpPixelSink)
}

/// Convenience: a capture sink for tests.
pub fn capture_pixel_sink() -> Arc<CapturePixelSink> {
    Arc::new(CapturePixelSink::new())
}
