use std::net::SocketAddr;
use async_trait::async_trait;
use hyper::{Request, Response, StatusCode, Uri};
use hyper::body::Incoming;
use http_body_util::BodyExt;
use hyper_util::client::legacy;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioIo};
use tracing::{debug, error, info, instrument, warn};
use crate::middleware::{Handler, MiddlewareError, ResponseSink};

/// 설정된 업스트림 하나로 요청을 전달하는 다운스트림 핸들러
///
/// 업스트림이 `101 Switching Protocols`로 응답하면 싱크의 연결 인수 기능으로 클라이언트와
/// 업스트림 연결을 이어 붙입니다.
#[derive(Clone)]
pub struct ProxyHandler {
    client: legacy::Client<HttpConnector, Incoming>,
    upstream: SocketAddr,
}

impl ProxyHandler {
    pub fn new(upstream: SocketAddr) -> Self {
        let connector = HttpConnector::new();
        let client = legacy::Client::builder(TokioExecutor::new())
            .build::<_, Incoming>(connector);

        Self { client, upstream }
    }

    pub fn upstream(&self) -> SocketAddr {
        self.upstream
    }
}

#[async_trait]
impl Handler<Incoming> for ProxyHandler {
    fn name(&self) -> &str {
        "proxy"
    }

    #[instrument(skip(self, req, sink), fields(path = %req.uri().path()))]
    async fn serve(&self, req: Request<Incoming>, sink: &mut dyn ResponseSink) -> Result<(), MiddlewareError> {
        let proxied = match build_proxied_request(self.upstream, req) {
            Ok(proxied) => proxied,
            Err(e) => {
                error!(error = %e, "프록시 요청 생성 실패");
                return write_error(sink, StatusCode::BAD_REQUEST, format!("Failed to build request: {}", e));
            }
        };

        let response = match self.client.request(proxied).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "백엔드 요청 실패");
                return write_error(sink, StatusCode::BAD_GATEWAY, format!("Backend request failed: {}", e));
            }
        };

        if response.status() == StatusCode::SWITCHING_PROTOCOLS {
            return bridge_upgrade(response, sink);
        }

        let (parts, body) = response.into_parts();
        let bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                error!(error = %e, "응답 본문 수집 실패");
                return write_error(sink, StatusCode::BAD_GATEWAY, format!("Failed to collect response body: {}", e));
            }
        };
        info!(status = %parts.status, bytes_size = bytes.len(), "백엔드 응답 수신");

        sink.headers_mut().extend(parts.headers);
        sink.write_head(parts.status);
        sink.write_body(&bytes)?;
        Ok(())
    }
}

fn build_proxied_request(
    upstream: SocketAddr,
    req: Request<Incoming>,
) -> Result<Request<Incoming>, hyper::http::Error> {
    let path_and_query = req.uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let uri: Uri = format!("http://{}{}", upstream, path_and_query).parse()?;

    let (mut parts, body) = req.into_parts();
    parts.uri = uri;
    Ok(Request::from_parts(parts, body))
}

/// 업스트림의 101 응답을 클라이언트에 그대로 전달하고, 양쪽 업그레이드가 끝나면
/// 두 연결 사이에서 바이트를 양방향으로 복사합니다.
fn bridge_upgrade(mut response: Response<Incoming>, sink: &mut dyn ResponseSink) -> Result<(), MiddlewareError> {
    let client = match sink.upgrade() {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "클라이언트 연결 인수 불가, 업그레이드 중단");
            return write_error(sink, StatusCode::BAD_GATEWAY, format!("Upgrade failed: {}", e));
        }
    };
    let upstream = hyper::upgrade::on(&mut response);

    let (parts, _) = response.into_parts();
    sink.headers_mut().extend(parts.headers);
    sink.write_head(StatusCode::SWITCHING_PROTOCOLS);

    tokio::spawn(async move {
        match tokio::try_join!(client, upstream) {
            Ok((client, upstream)) => {
                let mut client = TokioIo::new(client);
                let mut upstream = TokioIo::new(upstream);
                match tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
                    Ok((sent, received)) => debug!(sent, received, "업그레이드 연결 종료"),
                    Err(e) => debug!(error = %e, "업그레이드 연결 중단"),
                }
            }
            Err(e) => error!(error = %e, "연결 업그레이드 실패"),
        }
    });

    Ok(())
}

fn write_error(sink: &mut dyn ResponseSink, status: StatusCode, message: String) -> Result<(), MiddlewareError> {
    sink.write_head(status);
    sink.write_body(message.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::headers::BufferedResponse;

    #[test]
    fn test_write_error_goes_through_sink() {
        let mut sink = BufferedResponse::new();
        write_error(&mut sink, StatusCode::BAD_GATEWAY, "Backend request failed".to_string()).unwrap();

        assert_eq!(sink.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(sink.body(), b"Backend request failed");
    }
}
