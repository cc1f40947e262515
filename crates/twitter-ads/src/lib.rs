//! Twitter Ads adapter — forwards generic analytics events (page views,
//! purchases, custom events) to the Twitter Ads pixel/tag service.
//!
//! Two dispatch modes, selected at initialization:
//!
//! - **Legacy pixel**: mapped track events and configured page views fire a
//!   1x1 tracking-image GET against `analytics.twitter.com`, carrying the
//!   transaction id plus the aggregated sale amount and order quantity.
//! - **Universal tag**: when a universal tag pixel id is configured, page
//!   views are issued as commands against the vendor's global tag runtime
//!   instead; commands queue until the vendor script is installed.
//!
//! # Modules
//!
//! - [`config`] — adapter options and the event-name → transaction-id mapping
//! - [`order`] — revenue/quantity aggregation for order events
//! - [`pixel`] — pixel request/URL construction and the sink trait
//! - [`tag`] — universal tag runtime (queueing stub, handler/loader traits)
//! - [`adapter`] — mode selection, lifecycle, and dispatch
//! - [`transport`] — reqwest-based fire-and-forget transports

pub mod adapter;
pub mod config;
pub mod order;
pub mod pixel;
pub mod tag;
pub mod transport;

pub use adapter::{AdapterState, TwitterAdsAdapter};
pub use config::{EventMappings, TwitterAdsOptions};
pub use order::OrderSummary;
pub use pixel::{CapturePixelSink, PixelRequest, PixelSink};
pub use tag::{ScriptLoader, TagCommand, TagHandler, UniversalTag};
