//! Universal tag runtime — a queueing stand-in for the vendor's global tag
//! function, plus the traits the adapter uses to reach the loaded script.

use std::sync::{Arc, Mutex};

use tracing::debug;

/// Vendor script implementing the universal tag.
pub const UNIVERSAL_TAG_SCRIPT_URL: &str = "https://static.ads-twitter.com/uwt.js";

/// A command issued against the vendor tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagCommand {
    /// Bind the tag to a pixel id before any tracking happens.
    Init(String),
    /// Track a vendor-standard event, e.g. "PageView".
    Track(String),
}

/// The vendor's global tag function, modeled as an injected capability so
/// tests and server-side hosts can substitute it.
pub trait TagHandler: Send + Sync {
    fn call(&self, command: &TagCommand);
}

/// Requests the asynchronous load of the vendor script. Fire-and-forget;
/// the host signals completion through the adapter's `script_loaded`.
pub trait ScriptLoader: Send + Sync {
    fn load(&self, url: &str);
}

/// Queueing stub for the vendor tag: buffers commands until the script's
/// handler is installed, then forwards directly.
pub struct UniversalTag {
    queue: Vec<TagCommand>,
    handler: Option<Arc<dyn TagHandler>>,
}

impl UniversalTag {
    pub fn new() -> Self {
        Self {
            queue: Vec::new(),
            handler: None,
        }
    }

    /// Issue a command: forwarded immediately once the handler is
    /// installed, queued in order otherwise.
    pub fn push(&mut self, command: TagCommand) {
        match &self.handler {
            Some(handler) => handler.call(&command),
            None => {
                debug!(command = ?command, "universal tag not loaded, queueing command");
                self.queue.push(command);
            }
        }
    }

    /// Install the loaded script's handler and drain queued commands to it
    /// in FIFO order.
    pub fn install(&mut self, handler: Arc<dyn TagHandler>) {
        for command in self.queue.drain(..) {
            handler.call(&command);
        }
        self.handler = Some(handler);
    }

    pub fn is_installed(&self) -> bool {
        self.handler.is_some()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

impl Default for UniversalTag {
    fn default() -> Self {
        Self::new()
    }
}

/// Loader that does nothing, for adapters wired up without a transport.
pub struct NoOpScriptLoader;

impl ScriptLoader for NoOpScriptLoader {
    fn load(&self, _url: &str) {}
}

/// In-memory handler that records tag commands for testing.
#[derive(Default)]
pub struct CaptureTagHandler {
    calls: Mutex<Vec<TagCommand>>,
}

impl CaptureTagHandler {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<TagCommand> {
        self.calls.lock().expect("tag handler mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().expect("tag handler mutex poisoned").len()
    }
}

impl TagHandler for CaptureTagHandler {
    fn call(&self, command: &TagCommand) {
        self.calls
            .lock()
            .expect("tag handler mutex poisoned")
            .push(command.clone());
    }
}

/// In-memory loader that records requested script URLs for testing.
#[derive(Default)]
pub struct CaptureScriptLoader {
    requests: Mutex<Vec<String>>,
}

impl CaptureScriptLoader {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("script loader mutex poisoned")
            .clone()
    }
}

impl ScriptLoader for CaptureScriptLoader {
    fn load(&self, url: &str) {
        self.requests
            .lock()
            .expect("script loader mutex poisoned")
            .push(url.to_string());
    }
}
