//! HTTP transports — fire-and-forget delivery for pixel requests and the
//! vendor script fetch. Both spawn onto the ambient Tokio runtime; nothing
//! is retried and no result reaches the adapter.

use reqwest::Client;
use tracing::{debug, info};

use crate::pixel::{PixelRequest, PixelSink};
use crate::tag::{ScriptLoader, TagCommand, TagHandler};

/// Fires pixel requests as plain GETs, the server-side equivalent of the
/// browser's 1x1 tracking image. The response body is never inspected.
pub struct HttpPixelSink {
    client: Client,
}

impl HttpPixelSink {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpPixelSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelSink for HttpPixelSink {
    fn fire(&self, request: &PixelRequest) {
        let url = request.url();
        let client = self.client.clone();
        tokio::spawn(async move {
            match client.get(url.clone()).send().await {
                Ok(response) => {
                    debug!(%url, status = %response.status(), "pixel fired");
                }
                Err(error) => {
                    debug!(%url, %error, "pixel request failed");
                }
            }
        });
    }
}

/// Fetches the vendor script URL. Server-side there is nothing to execute,
/// so this only confirms availability; command delivery goes through
/// whatever [`TagHandler`] the host installs.
pub struct HttpScriptLoader {
    client: Client,
}

impl HttpScriptLoader {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpScriptLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptLoader for HttpScriptLoader {
    fn load(&self, url: &str) {
        let url = url.to_string();
        let client = self.client.clone();
        tokio::spawn(async move {
            match client.get(&url).send().await {
                Ok(response) => {
                    debug!(%url, status = %response.status(), "vendor script fetched");
                }
                Err(error) => {
                    debug!(%url, %error, "vendor script fetch failed");
                }
            }
        });
    }
}

/// Handler that logs tag commands instead of executing the vendor script.
/// Used where no script can run, e.g. the relay binary.
pub struct LoggingTagHandler;

impl TagHandler for LoggingTagHandler {
    fn call(&self, command: &TagCommand) {
        info!(command = ?command, "universal tag command");
    }
}
