//! Calendar feed pipeline: window → fetch → parse → serialize.
//!
//! Each refresh cycle walks these submodules in order:
//!
//! - [`window`] - Computes the rolling query window and builds the query URL
//! - [`fetcher`] - Authenticated HTTP retrieval with bounded timeouts
//! - [`parser`] - Normalizes the remote GData-style XML into flat event records
//! - [`serializer`] - Renders the records into the output feed document

pub mod fetcher;
pub mod parser;
pub mod serializer;
pub mod window;

pub use fetcher::{fetch_feed, FetchError};
pub use parser::{parse_feed, EventRecord, ParseError};
pub use serializer::{render_feed, SerializeError};
pub use window::{query_url, query_window, QueryWindow};
