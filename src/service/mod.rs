pub mod http;
pub mod sync_processor;

pub use http::ProfileFetcher;
pub use sync_processor::SyncProcessor;
