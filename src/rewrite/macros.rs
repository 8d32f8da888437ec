//! `@DT_ADD#<초>@` 날짜 매크로 확장
//!
//! 매크로는 "확장 시점 + N초"를 HTTP-date(IMF-fixdate) 문자열로 바꿉니다.
//! 예: `@DT_ADD#86400@` → `Mon, 07 Nov 1994 08:49:37 GMT`

use std::sync::OnceLock;
use regex_lite::{Captures, Regex};
use time::{format_description::BorrowedFormatItem, macros::format_description, Duration, OffsetDateTime, UtcOffset};
use super::diagnostics::{DiagnosticEvent, Diagnostics};

const IMF_FIXDATE: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

fn date_add_regex() -> &'static Regex {
    static DATE_ADD: OnceLock<Regex> = OnceLock::new();
    DATE_ADD.get_or_init(|| Regex::new(r"@DT_ADD#(\d+)@").expect("날짜 매크로 패턴은 항상 유효함"))
}

/// 문자열에 날짜 매크로가 있는지 확인합니다.
pub fn contains_macro(input: &str) -> bool {
    date_add_regex().is_match(input)
}

/// 주어진 시점을 HTTP-date 형식으로 변환합니다.
pub fn http_date(at: OffsetDateTime) -> Result<String, time::error::Format> {
    at.to_offset(UtcOffset::UTC).format(IMF_FIXDATE)
}

/// 모든 날짜 매크로를 `now` 기준으로 확장하고 앞뒤 공백을 제거합니다.
///
/// 초 값을 해석할 수 없거나 결과 날짜가 표현 범위를 벗어나면 0초로 처리하고
/// 진단 이벤트를 남깁니다.
pub fn expand(input: &str, now: OffsetDateTime, diagnostics: &dyn Diagnostics) -> String {
    let re = date_add_regex();
    if !re.is_match(input) {
        return input.trim().to_string();
    }

    let expanded = re.replace_all(input, |caps: &Captures<'_>| {
        let raw = &caps[1];
        let at = raw
            .parse::<i64>()
            .ok()
            .and_then(|secs| now.checked_add(Duration::seconds(secs)))
            .unwrap_or_else(|| {
                diagnostics.emit(DiagnosticEvent::MalformedMacroOffset { raw });
                now
            });

        http_date(at).unwrap_or_else(|_| caps[0].to_string())
    });

    expanded.trim().to_string()
}
