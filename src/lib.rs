//! upnext — a calendar-to-context-feed adapter.
//!
//! On a fixed interval the provider queries a remote calendar feed for events
//! in a rolling "today through tomorrow's early morning" window, normalizes
//! each entry into a flat record, and republishes the batch as a compact XML
//! document under the information name `meeting.feed`.

pub mod config;
pub mod feed;
pub mod provider;
pub mod publish;
pub mod scheduler;
pub mod settings;
pub mod shutdown;
