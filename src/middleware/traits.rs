use async_trait::async_trait;
use hyper::Request;
use super::headers::ResponseSink;
use super::MiddlewareError;

/// 헤더 재작성 뒤에 실행되는 다운스트림 핸들러
///
/// 핸들러는 (이미 재작성된) 요청을 받아 상태 코드, 헤더, 본문을 싱크에 씁니다.
#[async_trait]
pub trait Handler<B: Send + 'static>: Send + Sync {
    /// 핸들러 이름 (로그용)
    fn name(&self) -> &str;

    async fn serve(&self, req: Request<B>, sink: &mut dyn ResponseSink) -> Result<(), MiddlewareError>;
}
