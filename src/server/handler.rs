use std::convert::Infallible;
use std::time::Instant;
use hyper::{Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use tracing::error;
use uuid::Uuid;
use crate::{
    logging::{log_request, RequestLog},
    middleware::{HeadersMiddleware, MiddlewareError},
    proxy::ProxyHandler,
};

/// 헤더 미들웨어를 거쳐 업스트림으로 요청을 넘기는 연결 단위 핸들러
pub struct RequestHandler {
    middleware: HeadersMiddleware,
    proxy: ProxyHandler,
}

impl RequestHandler {
    pub fn new(middleware: HeadersMiddleware, proxy: ProxyHandler) -> Self {
        Self { middleware, proxy }
    }

    pub async fn handle_request(
        &self,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, Infallible> {
        let started = Instant::now();
        let mut log = RequestLog::new(Uuid::new_v4().to_string());
        log.with_request(&req);

        let response = match self.middleware.handle(req, &self.proxy).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "헤더 미들웨어 처리 실패");
                log.with_error(&e);
                middleware_error_response(&e)
            }
        };

        log.with_response(response.status());
        log.duration_ms = started.elapsed().as_millis() as u64;
        log_request(&log);

        Ok(response)
    }

    pub async fn handle_connection<I>(&self, io: I) -> std::result::Result<(), hyper::Error>
    where
        I: hyper::rt::Read + hyper::rt::Write + Send + Unpin + 'static,
    {
        http1::Builder::new()
            .serve_connection(
                io,
                service_fn(|req| self.handle_request(req)),
            )
            .with_upgrades()
            .await
    }
}

fn middleware_error_response(error: &MiddlewareError) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .body(Full::new(Bytes::from(format!("Error: {}", error))))
        .unwrap_or_else(|e| {
            error!(error = %e, "에러 응답 생성 실패");
            Response::new(Full::new(Bytes::from("Internal Server Error")))
        })
}
