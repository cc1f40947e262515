//! Shared types for the AdTag Relay workspace — the event model vendor
//! adapters consume and the common error type.

pub mod error;
pub mod types;

pub use error::{RelayError, RelayResult};
pub use types::{LineItem, PageEvent, Properties, TrackEvent};
