use serde::{Deserialize, Serialize};
use crate::rewrite::{Action, HeaderChange, RewriteError, Rule, RuleSet, Side};

/// 헤더 변경 설정
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeaderChangeConfig {
    /// 대상 헤더 이름 (대소문자 무시)
    pub header: String,

    /// true면 요청, false면 응답 헤더에 적용
    #[serde(default)]
    pub req: bool,

    /// 값. `@DT_ADD#<초>@` 매크로를 포함할 수 있음
    #[serde(default)]
    pub value: String,

    /// edit 동작의 치환 정규식
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace: Option<String>,

    /// edit/append 동작의 구분자
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sep: Option<String>,

    /// set | unset | edit | append
    pub action: String,
}

/// 경로 정규식 규칙 설정
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    #[serde(default)]
    pub name: String,

    /// 정규식 또는 `NO_MATCH`
    pub regexp: String,

    #[serde(default)]
    pub header_changes: Vec<HeaderChangeConfig>,
}

/// 헤더 미들웨어 설정
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeadersConfig {
    /// 선언 순서대로 평가되는 규칙
    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    /// 어떤 규칙도 매칭되지 않았을 때 적용할 변경
    #[serde(default)]
    pub default_headers: Vec<HeaderChangeConfig>,
}

impl HeaderChangeConfig {
    pub fn side(&self) -> Side {
        if self.req {
            Side::Request
        } else {
            Side::Response
        }
    }

    pub fn compile(&self) -> Result<HeaderChange, RewriteError> {
        let mut builder = HeaderChange::builder(&self.header, self.side(), Action::parse(&self.action))
            .value(&self.value);
        if let Some(replace) = &self.replace {
            builder = builder.replace(replace);
        }
        if let Some(sep) = &self.sep {
            builder = builder.separator(sep);
        }
        builder.build()
    }
}

impl RuleConfig {
    pub fn compile(&self) -> Result<Rule, RewriteError> {
        let changes = self.header_changes
            .iter()
            .map(HeaderChangeConfig::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Rule::new(&self.name, &self.regexp)?.with_changes(changes))
    }
}

impl HeadersConfig {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// 모든 정규식을 한 번 컴파일해 규칙 집합을 만듭니다.
    pub fn compile(&self) -> Result<RuleSet, RewriteError> {
        let rules = self.rules
            .iter()
            .map(RuleConfig::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let defaults = self.default_headers
            .iter()
            .map(HeaderChangeConfig::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RuleSet::new(rules, defaults))
    }
}
