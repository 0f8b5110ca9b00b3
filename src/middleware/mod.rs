/// Middleware module
///
/// Request logging and the static file hit counter.

mod metrics;
mod request_logger;

pub use metrics::{FileServerHits, MetricsMiddleware};
pub use request_logger::RequestLogger;
