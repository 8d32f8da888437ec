use std::sync::Arc;
use bytes::Bytes;
use http_body_util::Full;
use hyper::upgrade::OnUpgrade;
use hyper::{Request, Response};
use tracing::debug;
use crate::middleware::{Handler, MiddlewareError};
use crate::rewrite::{Clock, Diagnostics, RuleStore, SystemClock};
use super::interceptor::ResponseInterceptor;
use super::processor::RequestProcessor;
use super::sink::BufferedResponse;

/// 헤더 재작성 미들웨어
///
/// 요청 헤더를 재작성해 다운스트림 핸들러에 넘기고, 핸들러의 응답을
/// [`ResponseInterceptor`]로 받아 응답 헤더를 재작성합니다.
#[derive(Clone)]
pub struct HeadersMiddleware {
    store: RuleStore,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl HeadersMiddleware {
    pub fn new(store: RuleStore, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            diagnostics,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    /// 요청/응답 한 사이클을 처리합니다.
    ///
    /// 규칙 집합은 사이클 시작 시점의 스냅샷을 끝까지 사용합니다.
    pub async fn handle<B, H>(&self, mut req: Request<B>, next: &H) -> Result<Response<Full<Bytes>>, MiddlewareError>
    where
        B: Send + 'static,
        H: Handler<B> + ?Sized,
    {
        let rules = self.store.snapshot();
        let path = req.uri().path().to_owned();

        let request_pass = RequestProcessor::new(&rules, self.clock.as_ref(), self.diagnostics.as_ref())
            .process(&mut req);
        debug!(path = %path, fired = ?request_pass.fired, defaults = request_pass.defaults_applied, "요청 헤더 규칙 적용");

        let sink = match req.extensions_mut().remove::<OnUpgrade>() {
            Some(on_upgrade) => BufferedResponse::with_upgrade(on_upgrade),
            None => BufferedResponse::new(),
        };
        let mut interceptor = ResponseInterceptor::new(
            sink,
            rules,
            path,
            self.clock.clone(),
            self.diagnostics.clone(),
        );

        next.serve(req, &mut interceptor).await?;

        if let Some(report) = interceptor.report() {
            debug!(handler = next.name(), fired = ?report.fired, defaults = report.defaults_applied, "응답 헤더 규칙 적용");
        }
        let sink = interceptor.finish()?;
        Ok(sink.into_response())
    }
}
