#[derive(Debug, thiserror::Error)]
pub enum MiddlewareError {
    #[error("응답 싱크가 연결 업그레이드를 지원하지 않음")]
    UpgradeUnsupported,

    #[error("연결 업그레이드가 이미 사용됨")]
    UpgradeTaken,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
