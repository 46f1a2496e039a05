//! State tracking for crawl requests
//!
//! Every queued URL moves through `Queued -> Fetching -> {Extracted | Failed | Blocked}`.

mod request_state;

pub use request_state::RequestState;
