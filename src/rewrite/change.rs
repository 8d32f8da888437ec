use std::borrow::Cow;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use regex_lite::Regex;
use time::OffsetDateTime;
use super::diagnostics::{DiagnosticEvent, Diagnostics, NoopDiagnostics};
use super::error::RewriteError;
use super::macros;

/// 변경이 적용되는 쪽
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Request,
    Response,
}

/// 헤더 변경 동작
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Set,
    Unset,
    Edit,
    Append,
    /// 설정에 적힌 알 수 없는 값. 적용 시 진단만 남기고 건너뜀
    Unknown(String),
}

impl Action {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "set" => Action::Set,
            "unset" => Action::Unset,
            "edit" => Action::Edit,
            "append" => Action::Append,
            _ => Action::Unknown(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
enum ReplacePattern {
    Static(Regex),
    /// 날짜 매크로를 포함한 패턴은 적용 시점에 확장 후 컴파일
    Dated(String),
}

/// 하나의 헤더에 대한 선언적 변경 지시
#[derive(Debug, Clone)]
pub struct HeaderChange {
    header: HeaderName,
    side: Side,
    action: Action,
    value: String,
    replace: Option<ReplacePattern>,
    separator: String,
}

/// [`HeaderChange`] 빌더
#[derive(Debug, Clone)]
pub struct HeaderChangeBuilder {
    header: String,
    side: Side,
    action: Action,
    value: String,
    replace: Option<String>,
    separator: String,
}

impl HeaderChangeBuilder {
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn replace(mut self, pattern: impl Into<String>) -> Self {
        self.replace = Some(pattern.into());
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// 헤더 이름과 replace 패턴을 검증하고 컴파일합니다.
    pub fn build(self) -> Result<HeaderChange, RewriteError> {
        let header = HeaderName::from_bytes(self.header.trim().as_bytes())
            .map_err(|_| RewriteError::InvalidHeaderName { header: self.header.clone() })?;

        let replace = match self.replace.filter(|p| !p.is_empty()) {
            Some(pattern) => Some(compile_replace(&self.header, pattern)?),
            None if self.action == Action::Edit => {
                return Err(RewriteError::MissingReplace { header: self.header });
            }
            None => None,
        };

        Ok(HeaderChange {
            header,
            side: self.side,
            action: self.action,
            value: self.value,
            replace,
            separator: self.separator,
        })
    }
}

fn compile_replace(header: &str, pattern: String) -> Result<ReplacePattern, RewriteError> {
    let invalid = |source: regex_lite::Error| RewriteError::InvalidReplace {
        header: header.to_string(),
        pattern: pattern.clone(),
        source,
    };

    if macros::contains_macro(&pattern) {
        // 확장된 형태가 컴파일되는지 미리 확인
        let expanded = macros::expand(&pattern, OffsetDateTime::now_utc(), &NoopDiagnostics);
        Regex::new(&expanded).map_err(invalid)?;
        return Ok(ReplacePattern::Dated(pattern));
    }

    let re = Regex::new(&pattern).map_err(invalid)?;
    Ok(ReplacePattern::Static(re))
}

impl HeaderChange {
    pub fn builder(header: impl Into<String>, side: Side, action: Action) -> HeaderChangeBuilder {
        HeaderChangeBuilder {
            header: header.into(),
            side,
            action,
            value: String::new(),
            replace: None,
            separator: String::new(),
        }
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    /// 헤더 컬렉션에 변경을 적용합니다.
    ///
    /// 헤더 이름 비교는 대소문자를 구분하지 않습니다. 실패는 이 변경에만 국한되며
    /// 진단 이벤트로 보고됩니다.
    pub fn apply(&self, headers: &mut HeaderMap, now: OffsetDateTime, diagnostics: &dyn Diagnostics) {
        match &self.action {
            Action::Unset => {
                headers.remove(&self.header);
            }
            Action::Set => {
                let value = macros::expand(&self.value, now, diagnostics);
                self.set(headers, &value, diagnostics);
            }
            Action::Edit => self.edit(headers, now, diagnostics),
            Action::Append => self.append(headers, now, diagnostics),
            Action::Unknown(action) => diagnostics.emit(DiagnosticEvent::UnknownAction {
                header: self.header.as_str(),
                action,
            }),
        }
    }

    fn set(&self, headers: &mut HeaderMap, value: &str, diagnostics: &dyn Diagnostics) {
        if let Some(value) = self.header_value(value, diagnostics) {
            headers.insert(self.header.clone(), value);
        }
    }

    fn edit(&self, headers: &mut HeaderMap, now: OffsetDateTime, diagnostics: &dyn Diagnostics) {
        let value = macros::expand(&self.value, now, diagnostics);
        let current = match current_value(headers, &self.header) {
            Some(current) if !current.is_empty() => current,
            _ => return self.set(headers, &value, diagnostics),
        };

        let Some(re) = self.replace_regex(now, diagnostics) else {
            return;
        };

        let mut edited = re.replace_all(&current, value.as_str()).into_owned();
        // 치환 결과에 값이 없으면 패턴이 매칭되지 않은 것으로 보고 뒤에 덧붙임
        if !edited.contains(value.as_str()) {
            edited.push_str(&self.separator);
            edited.push_str(&value);
        }

        self.set(headers, &edited, diagnostics);
    }

    fn append(&self, headers: &mut HeaderMap, now: OffsetDateTime, diagnostics: &dyn Diagnostics) {
        let value = macros::expand(&self.value, now, diagnostics);

        if self.separator.is_empty() {
            if let Some(value) = self.header_value(&value, diagnostics) {
                headers.append(self.header.clone(), value);
            }
            return;
        }

        match current_value(headers, &self.header) {
            Some(current) if !current.is_empty() => {
                let joined = format!("{}{}{}", current, self.separator, value);
                self.set(headers, &joined, diagnostics);
            }
            _ => self.set(headers, &value, diagnostics),
        }
    }

    fn replace_regex(&self, now: OffsetDateTime, diagnostics: &dyn Diagnostics) -> Option<Cow<'_, Regex>> {
        match self.replace.as_ref()? {
            ReplacePattern::Static(re) => Some(Cow::Borrowed(re)),
            ReplacePattern::Dated(pattern) => {
                let expanded = macros::expand(pattern, now, diagnostics);
                match Regex::new(&expanded) {
                    Ok(re) => Some(Cow::Owned(re)),
                    Err(e) => {
                        diagnostics.emit(DiagnosticEvent::InvalidReplace {
                            header: self.header.as_str(),
                            pattern,
                            reason: e.to_string(),
                        });
                        None
                    }
                }
            }
        }
    }

    fn header_value(&self, value: &str, diagnostics: &dyn Diagnostics) -> Option<HeaderValue> {
        match HeaderValue::from_str(value) {
            Ok(value) => Some(value),
            Err(_) => {
                diagnostics.emit(DiagnosticEvent::InvalidHeaderValue {
                    header: self.header.as_str(),
                    value,
                });
                None
            }
        }
    }
}

/// 같은 이름의 모든 값을 `, `로 이어 하나의 문자열로 반환합니다.
fn current_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let values: Vec<Cow<'_, str>> = headers
        .get_all(name)
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}
