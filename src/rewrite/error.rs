/// 규칙 집합을 컴파일할 때 발생하는 에러
///
/// 모두 설정 구성 시점의 실패이며, 요청 처리 중에는 발생하지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("규칙 {rule}의 경로 패턴이 잘못됨: {pattern} ({source})")]
    InvalidPattern {
        rule: String,
        pattern: String,
        #[source]
        source: regex_lite::Error,
    },

    #[error("헤더 {header}의 replace 패턴이 잘못됨: {pattern} ({source})")]
    InvalidReplace {
        header: String,
        pattern: String,
        #[source]
        source: regex_lite::Error,
    },

    #[error("유효하지 않은 헤더 이름: {header}")]
    InvalidHeaderName { header: String },

    #[error("edit 동작에는 replace 패턴이 필요함: {header}")]
    MissingReplace { header: String },
}
