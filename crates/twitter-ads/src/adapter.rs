//! The Twitter Ads adapter — mode selection at initialization, lifecycle,
//! and per-call dispatch.

use std::sync::Arc;

use tracing::{debug, info, warn};

use adtag_core::{PageEvent, TrackEvent};

use crate::config::TwitterAdsOptions;
use crate::order;
use crate::pixel::{noop_pixel_sink, PixelRequest, PixelSink};
use crate::tag::{
    NoOpScriptLoader, ScriptLoader, TagCommand, TagHandler, UniversalTag,
    UNIVERSAL_TAG_SCRIPT_URL,
};

/// Adapter lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Uninitialized,
    /// Universal tag script load requested, handler not yet installed.
    Initializing,
    Ready,
}

/// Forwards page/track calls from the host analytics runtime to the Twitter
/// Ads pixel or universal tag.
///
/// Legacy pixel dispatch needs no preload and runs in any state; universal
/// tag commands buffer inside [`UniversalTag`] until the vendor script's
/// handler is installed via [`TwitterAdsAdapter::script_loaded`].
pub struct TwitterAdsAdapter {
    options: TwitterAdsOptions,
    state: AdapterState,
    tag: UniversalTag,
    pixel_sink: Arc<dyn PixelSink>,
    script_loader: Arc<dyn ScriptLoader>,
    on_ready: Option<Box<dyn FnOnce() + Send>>,
}

impl TwitterAdsAdapter {
    pub fn new(options: TwitterAdsOptions) -> Self {
        Self {
            options,
            state: AdapterState::Uninitialized,
            tag: UniversalTag::new(),
            pixel_sink: noop_pixel_sink(),
            script_loader: Arc::new(NoOpScriptLoader),
            on_ready: None,
        }
    }

    /// Attach the sink that delivers pixel requests.
    pub fn with_pixel_sink(mut self, sink: Arc<dyn PixelSink>) -> Self {
        self.pixel_sink = sink;
        self
    }

    /// Attach the loader used to request the vendor script.
    pub fn with_script_loader(mut self, loader: Arc<dyn ScriptLoader>) -> Self {
        self.script_loader = loader;
        self
    }

    /// Register the host runtime's one-shot ready signal.
    pub fn with_ready_callback(mut self, on_ready: impl FnOnce() + Send + 'static) -> Self {
        self.on_ready = Some(Box::new(on_ready));
        self
    }

    pub fn options(&self) -> &TwitterAdsOptions {
        &self.options
    }

    pub fn state(&self) -> AdapterState {
        self.state
    }

    /// Select the dispatch mode. With a universal tag pixel id the `init`
    /// command is queued before the script load is requested, so the loaded
    /// script sees it first; otherwise the adapter is immediately ready in
    /// legacy pixel mode.
    pub fn initialize(&mut self) {
        if self.state != AdapterState::Uninitialized {
            warn!(state = ?self.state, "adapter already initialized, ignoring");
            return;
        }

        if self.options.uses_universal_tag() {
            self.tag
                .push(TagCommand::Init(self.options.universal_tag_pixel_id.clone()));
            self.script_loader.load(UNIVERSAL_TAG_SCRIPT_URL);
            self.state = AdapterState::Initializing;
            info!(
                pixel_id = %self.options.universal_tag_pixel_id,
                "universal tag script load requested"
            );
        } else {
            self.state = AdapterState::Ready;
            debug!("no universal tag pixel id, running in legacy pixel mode");
            self.fire_ready();
        }
    }

    /// Install the loaded vendor script's handler. Queued commands drain in
    /// order and the ready signal fires. Repeated calls are ignored.
    pub fn script_loaded(&mut self, handler: Arc<dyn TagHandler>) {
        if self.state != AdapterState::Initializing {
            warn!(state = ?self.state, "unexpected script_loaded, ignoring");
            return;
        }
        self.tag.install(handler);
        self.state = AdapterState::Ready;
        info!("universal tag installed");
        self.fire_ready();
    }

    /// Forward a page view. Universal-tag mode issues `track("PageView")`
    /// against the tag and never fires the legacy pixel; legacy mode fires
    /// the page pixel only when the `page` option is configured.
    pub fn page(&mut self, event: &PageEvent) {
        if self.options.uses_universal_tag() {
            self.tag.push(TagCommand::Track("PageView".into()));
            debug!(event_id = %event.id, "page view issued to universal tag");
            return;
        }

        if self.options.page.is_empty() {
            debug!(event_id = %event.id, "page pixel not configured, dropping page view");
            return;
        }

        self.pixel_sink
            .fire(&PixelRequest::page_view(self.options.page.clone()));
    }

    /// Forward a track call. Unmapped event names are dropped silently;
    /// mapped ones fire the legacy pixel with aggregated order totals, in
    /// either mode.
    pub fn track(&self, event: &TrackEvent) {
        let Some(txn_id) = self.options.events.resolve(&event.name) else {
            debug!(event = %event.name, "unmapped event, dropping");
            return;
        };

        let summary = order::summarize(&event.properties);
        debug!(
            event = %event.name,
            txn_id,
            sale_amount = summary.sale_amount,
            order_quantity = summary.order_quantity,
            "firing track pixel"
        );
        self.pixel_sink.fire(&PixelRequest::new(txn_id, summary));
    }

    fn fire_ready(&mut self) {
        if let Some(on_ready) = self.on_ready.take() {
            on_ready();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventMappings;
    use crate::pixel::capture_pixel_sink;
    use crate::tag::{CaptureScriptLoader, CaptureTagHandler};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn options_with_events() -> TwitterAdsOptions {
        TwitterAdsOptions {
            page: String::new(),
            universal_tag_pixel_id: String::new(),
            events: EventMappings::try_from_pairs([
                ("signup", "c36462a3"),
                ("login", "6137ab24"),
                ("play", "e3196de1"),
                ("Order Completed", "adsf7as8"),
            ])
            .unwrap(),
        }
    }

    #[test]
    fn test_legacy_initialize_skips_script_load() {
        let loader = Arc::new(CaptureScriptLoader::new());
        let mut adapter = TwitterAdsAdapter::new(options_with_events())
            .with_script_loader(loader.clone());
        adapter.initialize();

        assert_eq!(adapter.state(), AdapterState::Ready);
        assert!(loader.requests().is_empty());
    }

    #[test]
    fn test_universal_initialize_queues_init_then_loads_script() {
        let mut options = options_with_events();
        options.universal_tag_pixel_id = "teemo".into();

        let loader = Arc::new(CaptureScriptLoader::new());
        let mut adapter =
            TwitterAdsAdapter::new(options).with_script_loader(loader.clone());
        adapter.initialize();

        assert_eq!(adapter.state(), AdapterState::Initializing);
        assert_eq!(loader.requests(), vec![UNIVERSAL_TAG_SCRIPT_URL.to_string()]);

        // Queued init drains to the handler once the script installs.
        let handler = Arc::new(CaptureTagHandler::new());
        adapter.script_loaded(handler.clone());
        assert_eq!(adapter.state(), AdapterState::Ready);
        assert_eq!(handler.calls(), vec![TagCommand::Init("teemo".into())]);
    }

    #[test]
    fn test_ready_fires_exactly_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        let mut options = options_with_events();
        options.universal_tag_pixel_id = "teemo".into();
        let mut adapter = TwitterAdsAdapter::new(options)
            .with_ready_callback(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        adapter.initialize();
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        adapter.script_loaded(Arc::new(CaptureTagHandler::new()));
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        adapter.script_loaded(Arc::new(CaptureTagHandler::new()));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ready_fires_immediately_in_legacy_mode() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        let mut adapter = TwitterAdsAdapter::new(options_with_events())
            .with_ready_callback(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        adapter.initialize();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_page_without_page_option_emits_nothing() {
        let sink = capture_pixel_sink();
        let mut adapter =
            TwitterAdsAdapter::new(options_with_events()).with_pixel_sink(sink.clone());
        adapter.initialize();

        adapter.page(&PageEvent::new());
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_page_with_page_option_fires_pixel() {
        let mut options = options_with_events();
        options.page = "e3196de1".into();

        let sink = capture_pixel_sink();
        let mut adapter = TwitterAdsAdapter::new(options).with_pixel_sink(sink.clone());
        adapter.initialize();

        adapter.page(&PageEvent::new());
        assert_eq!(
            sink.fired(),
            vec![
                "http://analytics.twitter.com/i/adsct?txn_id=e3196de1&p_id=Twitter&tw_sale_amount=0&tw_order_quantity=0"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_universal_page_tracks_pageview_and_skips_pixel() {
        let mut options = options_with_events();
        options.page = "e3196de1".into();
        options.universal_tag_pixel_id = "teemo".into();

        let sink = capture_pixel_sink();
        let mut adapter = TwitterAdsAdapter::new(options).with_pixel_sink(sink.clone());
        adapter.initialize();

        let handler = Arc::new(CaptureTagHandler::new());
        adapter.script_loaded(handler.clone());

        adapter.page(&PageEvent::new());
        assert_eq!(sink.count(), 0);
        assert_eq!(
            handler.calls(),
            vec![
                TagCommand::Init("teemo".into()),
                TagCommand::Track("PageView".into()),
            ]
        );
    }

    #[test]
    fn test_universal_page_buffers_until_script_loads() {
        let mut options = options_with_events();
        options.universal_tag_pixel_id = "teemo".into();

        let mut adapter = TwitterAdsAdapter::new(options);
        adapter.initialize();
        adapter.page(&PageEvent::new());

        let handler = Arc::new(CaptureTagHandler::new());
        adapter.script_loaded(handler.clone());
        assert_eq!(
            handler.calls(),
            vec![
                TagCommand::Init("teemo".into()),
                TagCommand::Track("PageView".into()),
            ]
        );
    }

    #[test]
    fn test_unmapped_track_emits_nothing() {
        let sink = capture_pixel_sink();
        let mut adapter =
            TwitterAdsAdapter::new(options_with_events()).with_pixel_sink(sink.clone());
        adapter.initialize();

        adapter.track(&TrackEvent::new("unknown event"));
        adapter.track(&TrackEvent::new("toString"));
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_mapped_track_fires_pixel() {
        let sink = capture_pixel_sink();
        let mut adapter =
            TwitterAdsAdapter::new(options_with_events()).with_pixel_sink(sink.clone());
        adapter.initialize();

        adapter.track(&TrackEvent::new("play"));
        assert_eq!(
            sink.fired(),
            vec![
                "http://analytics.twitter.com/i/adsct?txn_id=e3196de1&p_id=Twitter&tw_sale_amount=0&tw_order_quantity=0"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_track_with_revenue() {
        let sink = capture_pixel_sink();
        let mut adapter =
            TwitterAdsAdapter::new(options_with_events()).with_pixel_sink(sink.clone());
        adapter.initialize();

        adapter.track(
            &TrackEvent::new("signup").with_property("revenue", serde_json::json!(10)),
        );
        assert_eq!(
            sink.fired(),
            vec![
                "http://analytics.twitter.com/i/adsct?txn_id=c36462a3&p_id=Twitter&tw_sale_amount=10&tw_order_quantity=0"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_order_completed_aggregates_revenue_and_quantity() {
        let sink = capture_pixel_sink();
        let mut adapter =
            TwitterAdsAdapter::new(options_with_events()).with_pixel_sink(sink.clone());
        adapter.initialize();

        adapter.track(
            &TrackEvent::new("Order Completed")
                .with_property("total", serde_json::json!(30))
                .with_property("revenue", serde_json::json!(25))
                .with_property(
                    "products",
                    serde_json::json!([{"quantity": 1}, {"quantity": 2}]),
                ),
        );
        assert_eq!(
            sink.fired(),
            vec![
                "http://analytics.twitter.com/i/adsct?txn_id=adsf7as8&p_id=Twitter&tw_sale_amount=25&tw_order_quantity=3"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_array_form_events_resolve() {
        let options: TwitterAdsOptions =
            serde_json::from_str(r#"{"events": [{"key": "event", "value": 12}]}"#).unwrap();

        let sink = capture_pixel_sink();
        let mut adapter = TwitterAdsAdapter::new(options).with_pixel_sink(sink.clone());
        adapter.initialize();

        adapter.track(&TrackEvent::new("event"));
        assert_eq!(
            sink.fired(),
            vec![
                "http://analytics.twitter.com/i/adsct?txn_id=12&p_id=Twitter&tw_sale_amount=0&tw_order_quantity=0"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_double_initialize_is_ignored() {
        let loader = Arc::new(CaptureScriptLoader::new());
        let mut options = options_with_events();
        options.universal_tag_pixel_id = "teemo".into();

        let mut adapter =
            TwitterAdsAdapter::new(options).with_script_loader(loader.clone());
        adapter.initialize();
        adapter.initialize();
        assert_eq!(loader.requests().len(), 1);
    }
}
