use super::change::Side;

/// 엔진이 내보내는 비치명적 진단 이벤트
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent<'a> {
    /// 규칙이 발동함
    RuleFired { rule: &'a str, side: Side },
    /// 매칭된 규칙이 없어 기본 변경 목록이 적용됨
    DefaultsFired { side: Side },
    /// 알 수 없는 action 값. 해당 변경만 건너뜀
    UnknownAction { header: &'a str, action: &'a str },
    /// 날짜 매크로의 초 값을 해석하지 못함. 0초로 처리됨
    MalformedMacroOffset { raw: &'a str },
    /// 확장된 값이 헤더 값으로 쓸 수 없는 문자를 포함함
    InvalidHeaderValue { header: &'a str, value: &'a str },
    /// 날짜 매크로를 포함한 replace 패턴이 확장 후 컴파일되지 않음
    InvalidReplace { header: &'a str, pattern: &'a str, reason: String },
}

/// 진단 이벤트 수신자
///
/// 엔진은 구체적인 로깅 구현에 의존하지 않고 이 트레이트로만 보고합니다.
pub trait Diagnostics: Send + Sync {
    fn emit(&self, event: DiagnosticEvent<'_>);
}

/// 모든 이벤트를 버리는 수신자
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn emit(&self, _event: DiagnosticEvent<'_>) {}
}
