use std::io;
use bytes::{Bytes, BytesMut};
use http_body_util::Full;
use hyper::upgrade::OnUpgrade;
use hyper::{HeaderMap, Response, StatusCode};
use crate::middleware::MiddlewareError;

/// 원시 연결 인수(프로토콜 업그레이드) 기능
pub trait Upgradable: Send {
    fn take_upgrade(&mut self) -> Result<OnUpgrade, MiddlewareError>;
}

/// 명시적 flush 기능
pub trait Flushable: Send {
    fn flush_now(&mut self) -> io::Result<()>;
}

/// 응답을 받는 쪽
///
/// 상태 코드를 쓰는 순간(`write_head`)이 헤더 확정 시점입니다. 선택 기능은
/// `upgrader`/`flusher`로 호출 시점에 얻어 오며, 없으면 `None`입니다.
pub trait ResponseSink: Send {
    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn write_head(&mut self, status: StatusCode);

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<usize>;

    fn upgrader(&mut self) -> Option<&mut dyn Upgradable> {
        None
    }

    fn flusher(&mut self) -> Option<&mut dyn Flushable> {
        None
    }

    /// 업그레이드를 지원하지 않는 싱크면 `UpgradeUnsupported`를 반환합니다.
    fn upgrade(&mut self) -> Result<OnUpgrade, MiddlewareError> {
        self.upgrader()
            .ok_or(MiddlewareError::UpgradeUnsupported)?
            .take_upgrade()
    }

    /// flush 기능이 없으면 아무것도 하지 않습니다.
    fn flush(&mut self) -> io::Result<()> {
        match self.flusher() {
            Some(flusher) => flusher.flush_now(),
            None => Ok(()),
        }
    }
}

/// hyper 응답으로 변환되는 메모리 싱크
#[derive(Debug, Default)]
pub struct BufferedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    head_written: bool,
    upgradable: bool,
    on_upgrade: Option<OnUpgrade>,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// 요청에서 꺼낸 `OnUpgrade`로 연결 인수를 지원하는 싱크를 만듭니다.
    pub fn with_upgrade(on_upgrade: OnUpgrade) -> Self {
        Self {
            upgradable: true,
            on_upgrade: Some(on_upgrade),
            ..Self::default()
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseSink for BufferedResponse {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_head(&mut self, status: StatusCode) {
        if !self.head_written {
            self.status = status;
            self.head_written = true;
        }
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<usize> {
        if !self.head_written {
            self.write_head(StatusCode::OK);
        }
        self.body.extend_from_slice(chunk);
        Ok(chunk.len())
    }

    fn upgrader(&mut self) -> Option<&mut dyn Upgradable> {
        if self.upgradable {
            Some(self)
        } else {
            None
        }
    }
}

impl Upgradable for BufferedResponse {
    fn take_upgrade(&mut self) -> Result<OnUpgrade, MiddlewareError> {
        self.on_upgrade.take().ok_or(MiddlewareError::UpgradeTaken)
    }
}
