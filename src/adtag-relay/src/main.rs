//! AdTag Relay — forwards analytics events from stdin to the Twitter Ads
//! pixel/tag service.
//!
//! Reads one JSON event per line (`{"type":"page"}` or
//! `{"type":"track","event":"signup","properties":{...}}`) and dispatches
//! each through the Twitter Ads adapter. Delivery is best-effort: malformed
//! lines and unmapped events are logged and skipped.

use std::io::{self, BufRead};
use std::sync::Arc;

use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};

use adtag_core::types::{PageEvent, Properties, TrackEvent};
use adtag_twitter_ads::transport::{HttpPixelSink, HttpScriptLoader, LoggingTagHandler};
use adtag_twitter_ads::{TwitterAdsAdapter, TwitterAdsOptions};

#[derive(Parser, Debug)]
#[command(name = "adtag-relay")]
#[command(about = "Forwards analytics events to the Twitter Ads pixel service")]
#[command(version)]
struct Cli {
    /// Config file path (overrides ADTAG_RELAY_CONFIG)
    #[arg(long, env = "ADTAG_RELAY_CONFIG")]
    config: Option<String>,

    /// Page-view transaction id (overrides config)
    #[arg(long, env = "ADTAG_RELAY__PAGE")]
    page: Option<String>,

    /// Universal tag pixel id (overrides config)
    #[arg(long, env = "ADTAG_RELAY__UNIVERSAL_TAG_PIXEL_ID")]
    universal_tag_pixel_id: Option<String>,

    /// Log dispatches without firing any HTTP requests
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

/// One line of relay input.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum InboundMessage {
    Page {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        properties: Properties,
    },
    Track {
        event: String,
        #[serde(default)]
        properties: Properties,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adtag_relay=info,adtag_twitter_ads=info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut options = TwitterAdsOptions::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        TwitterAdsOptions::default()
    });

    // Apply CLI overrides
    if let Some(page) = cli.page {
        options.page = page;
    }
    if let Some(pixel_id) = cli.universal_tag_pixel_id {
        options.universal_tag_pixel_id = pixel_id;
    }

    if !options.any_path_enabled() {
        warn!("no page id, universal tag pixel id, or event mappings configured; nothing will be forwarded");
    }

    let universal = options.uses_universal_tag();
    info!(
        page = %options.page,
        universal_tag = universal,
        mapped_events = options.events.len(),
        dry_run = cli.dry_run,
        "adtag-relay starting up"
    );

    let mut adapter = TwitterAdsAdapter::new(options);
    if !cli.dry_run {
        adapter = adapter
            .with_pixel_sink(Arc::new(HttpPixelSink::new()))
            .with_script_loader(Arc::new(HttpScriptLoader::new()));
    }
    adapter.initialize();

    // No vendor script executes server-side; install a logging handler so
    // queued universal tag commands drain instead of buffering forever.
    if universal {
        adapter.script_loaded(Arc::new(LoggingTagHandler));
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<InboundMessage>(&line) {
            Ok(InboundMessage::Page { name, properties }) => {
                let mut event = PageEvent::new().with_properties(properties);
                if let Some(name) = name {
                    event = event.with_name(name);
                }
                adapter.page(&event);
            }
            Ok(InboundMessage::Track { event, properties }) => {
                adapter.track(&TrackEvent::new(event).with_properties(properties));
            }
            Err(error) => {
                warn!(%error, "skipping malformed input line");
            }
        }
    }

    info!("stdin closed, shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_page_parses() {
        let message: InboundMessage = serde_json::from_str(r#"{"type": "page"}"#).unwrap();
        assert!(matches!(message, InboundMessage::Page { .. }));
    }

    #[test]
    fn test_inbound_track_parses() {
        let message: InboundMessage = serde_json::from_str(
            r#"{"type": "track", "event": "signup", "properties": {"revenue": 10}}"#,
        )
        .unwrap();
        match message {
            InboundMessage::Track { event, properties } => {
                assert_eq!(event, "signup");
                assert_eq!(properties["revenue"], serde_json::json!(10));
            }
            other => panic!("expected track, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<InboundMessage, _> =
            serde_json::from_str(r#"{"type": "identify", "userId": "u-1"}"#);
        assert!(result.is_err());
    }
}
