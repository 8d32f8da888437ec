pub mod error;
pub mod headers;
pub mod traits;

pub use error::MiddlewareError;
pub use headers::{HeadersConfig, HeadersMiddleware, ResponseInterceptor, ResponseSink};
pub use traits::Handler;
