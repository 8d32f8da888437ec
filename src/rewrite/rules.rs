use hyper::header::HeaderMap;
use regex_lite::Regex;
use time::OffsetDateTime;
use super::change::{HeaderChange, Side};
use super::diagnostics::{DiagnosticEvent, Diagnostics};
use super::error::RewriteError;

/// "아직 아무 규칙도 매칭되지 않았을 때만 적용"을 뜻하는 예약 패턴
pub const NO_MATCH: &str = "NO_MATCH";

/// 규칙의 경로 패턴
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// 예약 패턴 [`NO_MATCH`]
    NoMatch,
    /// 부분 문자열 검색 의미의 정규식
    Regex(Regex),
}

impl PathPattern {
    pub fn parse(rule: &str, pattern: &str) -> Result<Self, RewriteError> {
        if pattern == NO_MATCH {
            return Ok(PathPattern::NoMatch);
        }

        Regex::new(pattern)
            .map(PathPattern::Regex)
            .map_err(|source| RewriteError::InvalidPattern {
                rule: rule.to_string(),
                pattern: pattern.to_string(),
                source,
            })
    }
}

/// 경로 패턴과 헤더 변경 목록의 묶음
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    pattern: PathPattern,
    request: Vec<HeaderChange>,
    response: Vec<HeaderChange>,
}

impl Rule {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, RewriteError> {
        let name = name.into();
        let pattern = PathPattern::parse(&name, pattern)?;
        Ok(Self {
            name,
            pattern,
            request: Vec::new(),
            response: Vec::new(),
        })
    }

    /// 변경을 그 변경의 쪽(요청/응답) 목록 끝에 추가합니다.
    pub fn with_change(mut self, change: HeaderChange) -> Self {
        match change.side() {
            Side::Request => self.request.push(change),
            Side::Response => self.response.push(change),
        }
        self
    }

    pub fn with_changes(self, changes: impl IntoIterator<Item = HeaderChange>) -> Self {
        changes.into_iter().fold(self, Rule::with_change)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn changes(&self, side: Side) -> &[HeaderChange] {
        match side {
            Side::Request => &self.request,
            Side::Response => &self.response,
        }
    }
}

/// 한 경로에 대해 발동하는 규칙들
#[derive(Debug)]
pub struct Selection<'a> {
    pub fired: Vec<&'a Rule>,
    /// 어떤 규칙도 발동하지 않아 기본 변경을 적용해야 하는지 여부
    pub use_defaults: bool,
}

/// 한 쪽에 대한 평가 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub fired: Vec<String>,
    pub defaults_applied: bool,
}

/// 순서가 있는 규칙 목록과 기본 변경 목록
///
/// 구성 후에는 변경되지 않으며 여러 요청이 동시에 읽기 전용으로 공유합니다.
/// 설정 교체는 [`RuleStore`](super::RuleStore)를 통해 통째로 이루어집니다.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    request_defaults: Vec<HeaderChange>,
    response_defaults: Vec<HeaderChange>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>, defaults: Vec<HeaderChange>) -> Self {
        let (request_defaults, response_defaults) = defaults
            .into_iter()
            .partition(|change| change.side() == Side::Request);

        Self {
            rules,
            request_defaults,
            response_defaults,
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn defaults(&self, side: Side) -> &[HeaderChange] {
        match side {
            Side::Request => &self.request_defaults,
            Side::Response => &self.response_defaults,
        }
    }

    /// 선언 순서대로 규칙을 훑어 발동할 규칙을 고릅니다.
    ///
    /// 첫 매칭에서 멈추지 않습니다. `NO_MATCH` 규칙은 앞선 발동이 하나도 없을 때만
    /// 발동하므로 여러 개가 있어도 최대 하나만 발동합니다.
    pub fn select(&self, path: &str) -> Selection<'_> {
        let mut any_matched = false;
        let mut fired = Vec::new();

        for rule in &self.rules {
            let fires = match &rule.pattern {
                PathPattern::NoMatch => !any_matched,
                PathPattern::Regex(re) => re.is_match(path),
            };

            if fires {
                any_matched = true;
                fired.push(rule);
            }
        }

        Selection {
            fired,
            use_defaults: !any_matched,
        }
    }

    /// 한 쪽에 대해 규칙을 평가하고 헤더에 변경을 적용합니다.
    pub fn apply(
        &self,
        side: Side,
        path: &str,
        headers: &mut HeaderMap,
        now: OffsetDateTime,
        diagnostics: &dyn Diagnostics,
    ) -> PassReport {
        let selection = self.select(path);
        let mut report = PassReport::default();

        for rule in selection.fired {
            diagnostics.emit(DiagnosticEvent::RuleFired { rule: rule.name(), side });
            for change in rule.changes(side) {
                change.apply(headers, now, diagnostics);
            }
            report.fired.push(rule.name().to_string());
        }

        let defaults = self.defaults(side);
        if selection.use_defaults && !defaults.is_empty() {
            diagnostics.emit(DiagnosticEvent::DefaultsFired { side });
            for change in defaults {
                change.apply(headers, now, diagnostics);
            }
            report.defaults_applied = true;
        }

        report
    }
}
