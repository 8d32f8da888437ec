//! 헤더 재작성 미들웨어
//!
//! 경로 정규식 규칙에 따라 HTTP 요청 및 응답의 헤더를 수정합니다.

mod config;
mod interceptor;
mod middleware;
mod processor;
mod sink;

pub use config::{HeaderChangeConfig, HeadersConfig, RuleConfig};
pub use interceptor::ResponseInterceptor;
pub use middleware::HeadersMiddleware;
pub use processor::RequestProcessor;
pub use sink::{BufferedResponse, Flushable, ResponseSink, Upgradable};
