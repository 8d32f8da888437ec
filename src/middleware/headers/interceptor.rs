use std::io;
use std::sync::Arc;
use bytes::BytesMut;
use hyper::header::CONTENT_LENGTH;
use hyper::{HeaderMap, StatusCode};
use crate::rewrite::{Clock, Diagnostics, PassReport, RuleSet, Side};
use super::sink::{Flushable, ResponseSink, Upgradable};

/// 실제 응답 싱크를 감싸 응답 헤더 규칙을 적용하는 데코레이터
///
/// 다운스트림 핸들러가 상태 코드를 확정하는 순간 응답 쪽 규칙을 평가합니다.
/// 본문은 메모리에 모두 모았다가 [`finish`](Self::finish)에서 한 번에 씁니다.
/// 헤더가 확정된 뒤의 헤더 쓰기는 버려지는 별도 맵으로 가므로 실제 응답에 반영되지 않습니다.
pub struct ResponseInterceptor<S> {
    inner: S,
    discarded: HeaderMap,
    buffer: BytesMut,
    head_written: bool,
    path: String,
    rules: Arc<RuleSet>,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn Diagnostics>,
    report: Option<PassReport>,
}

impl<S: ResponseSink> ResponseInterceptor<S> {
    /// `path`는 요청 시점에 캡처한 원래 경로입니다.
    pub fn new(
        inner: S,
        rules: Arc<RuleSet>,
        path: impl Into<String>,
        clock: Arc<dyn Clock>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            inner,
            discarded: HeaderMap::new(),
            buffer: BytesMut::new(),
            head_written: false,
            path: path.into(),
            rules,
            clock,
            diagnostics,
            report: None,
        }
    }

    /// 응답 쪽 평가 결과. 헤더가 확정되기 전에는 `None`
    pub fn report(&self) -> Option<&PassReport> {
        self.report.as_ref()
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn finalize_head(&mut self, status: StatusCode) {
        if self.head_written {
            return;
        }

        let report = self.rules.apply(
            Side::Response,
            &self.path,
            self.inner.headers_mut(),
            self.clock.now(),
            self.diagnostics.as_ref(),
        );
        // 본문 길이는 버퍼링이 끝난 뒤 전송 계층이 다시 계산
        self.inner.headers_mut().remove(CONTENT_LENGTH);

        self.head_written = true;
        self.report = Some(report);
        self.inner.write_head(status);
    }

    /// 헤더를 확정하고(아직이면 200) 모은 본문을 실제 싱크에 한 번에 씁니다.
    pub fn finish(mut self) -> io::Result<S> {
        self.finalize_head(StatusCode::OK);

        if !self.buffer.is_empty() {
            let written = self.inner.write_body(&self.buffer)?;
            if written < self.buffer.len() {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("본문 일부만 기록됨: {}/{}", written, self.buffer.len()),
                ));
            }
        }

        Ok(self.inner)
    }
}

impl<S: ResponseSink> ResponseSink for ResponseInterceptor<S> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        if self.head_written {
            &mut self.discarded
        } else {
            self.inner.headers_mut()
        }
    }

    fn write_head(&mut self, status: StatusCode) {
        self.finalize_head(status);
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<usize> {
        self.finalize_head(StatusCode::OK);
        self.buffer.extend_from_slice(chunk);
        Ok(chunk.len())
    }

    fn upgrader(&mut self) -> Option<&mut dyn Upgradable> {
        self.inner.upgrader()
    }

    fn flusher(&mut self) -> Option<&mut dyn Flushable> {
        self.inner.flusher()
    }

    fn flush(&mut self) -> io::Result<()> {
        // 헤더가 규칙 적용 없이 먼저 나가지 않도록 확정 후 전달
        self.finalize_head(StatusCode::OK);
        self.inner.flush()
    }
}
