use std::sync::Arc;
use tokio::net::TcpListener;
use hyper_util::rt::TokioIo;
use crate::settings::ServerSettings;
use tracing::{debug, error, info};
use super::handler::RequestHandler;
use super::Result;

pub struct ServerListener {
    http_listener: TcpListener,
}

impl ServerListener {
    pub async fn new(settings: &ServerSettings) -> Result<Self> {
        let http_listener = TcpListener::bind(format!("0.0.0.0:{}", settings.http_port))
            .await
            .map_err(|e| {
                error!(error = %e, port = settings.http_port, "HTTP 포트 바인딩 실패");
                e
            })?;

        info!(port = settings.http_port, upstream = %settings.upstream, "HTTP 리스너 시작");

        Ok(Self { http_listener })
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.http_listener.local_addr()?)
    }

    pub async fn run(self, handler: Arc<RequestHandler>) -> Result<()> {
        loop {
            match self.http_listener.accept().await {
                Ok((stream, peer)) => {
                    debug!(peer = %peer, "HTTP 연결 수락");
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        if let Err(err) = handler.handle_connection(io).await {
                            error!(error = %err, "HTTP 연결 처리 실패");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "HTTP 연결 수락 실패");
                }
            }
        }
    }
}
