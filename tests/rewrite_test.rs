use std::sync::Mutex;
use hyper::header::HeaderValue;
use hyper::HeaderMap;
use rproxy_headers::rewrite::{
    macros, Action, DiagnosticEvent, Diagnostics, HeaderChange, NoopDiagnostics, Rule, RuleSet,
    RewriteError, Side, NO_MATCH,
};
use time::macros::datetime;
use time::OffsetDateTime;

const T: OffsetDateTime = datetime!(1994-11-06 08:49:37 UTC);

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Diagnostics for Recorder {
    fn emit(&self, event: DiagnosticEvent<'_>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

fn change(header: &str, side: Side, action: Action, value: &str) -> HeaderChange {
    HeaderChange::builder(header, side, action)
        .value(value)
        .build()
        .unwrap()
}

fn values(headers: &HeaderMap, name: &str) -> Vec<String> {
    headers
        .get_all(name)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

fn apply(change: &HeaderChange, headers: &mut HeaderMap) {
    change.apply(headers, T, &NoopDiagnostics);
}

#[test]
fn test_actions_ignore_header_case() {
    let mut headers = HeaderMap::new();
    headers.insert("x-trace", HeaderValue::from_static("old"));

    apply(&change("X-TRACE", Side::Response, Action::Set, "new"), &mut headers);
    assert_eq!(values(&headers, "X-Trace"), vec!["new"]);

    apply(
        &HeaderChange::builder("x-Trace", Side::Response, Action::Append)
            .value("more")
            .separator("; ")
            .build()
            .unwrap(),
        &mut headers,
    );
    assert_eq!(values(&headers, "x-trace"), vec!["new; more"]);

    apply(&change("X-tRaCe", Side::Response, Action::Unset, ""), &mut headers);
    assert!(headers.get("x-trace").is_none());
}

#[test]
fn test_set_replaces_all_occurrences_and_is_idempotent() {
    let mut headers = HeaderMap::new();
    headers.append("vary", HeaderValue::from_static("accept"));
    headers.append("vary", HeaderValue::from_static("origin"));

    let set = change("Vary", Side::Response, Action::Set, "*");
    apply(&set, &mut headers);
    let once = headers.clone();
    apply(&set, &mut headers);

    assert_eq!(values(&headers, "vary"), vec!["*"]);
    assert_eq!(headers, once);
}

#[test]
fn test_unset_absent_header_is_noop() {
    let mut headers = HeaderMap::new();
    headers.insert("server", HeaderValue::from_static("upstream"));

    apply(&change("X-Powered-By", Side::Response, Action::Unset, "ignored"), &mut headers);

    assert_eq!(headers.len(), 1);
    assert_eq!(headers["server"], "upstream");
}

#[test]
fn test_edit_absent_header_behaves_like_set() {
    let edit = HeaderChange::builder("X", Side::Request, Action::Edit)
        .value("V")
        .replace("anything")
        .build()
        .unwrap();

    let mut headers = HeaderMap::new();
    apply(&edit, &mut headers);
    assert_eq!(values(&headers, "x"), vec!["V"]);

    let mut empty = HeaderMap::new();
    empty.insert("x", HeaderValue::from_static(""));
    apply(&edit, &mut empty);
    assert_eq!(values(&empty, "x"), vec!["V"]);
}

#[test]
fn test_edit_replaces_every_match() {
    let mut headers = HeaderMap::new();
    headers.insert("cache-control", HeaderValue::from_static("no-store, max-age=0, no-cache"));

    apply(
        &HeaderChange::builder("Cache-Control", Side::Response, Action::Edit)
            .value("max-age=1000")
            .replace("max-age=[0-9]+")
            .build()
            .unwrap(),
        &mut headers,
    );

    assert_eq!(values(&headers, "cache-control"), vec!["no-store, max-age=1000, no-cache"]);
}

#[test]
fn test_edit_without_match_appends_with_separator() {
    let mut headers = HeaderMap::new();
    headers.insert("cookie", HeaderValue::from_static("foo=123"));

    apply(
        &HeaderChange::builder("Cookie", Side::Request, Action::Edit)
            .value("bar=456")
            .replace("foo=[a-z]+")
            .separator(", ")
            .build()
            .unwrap(),
        &mut headers,
    );

    assert_eq!(values(&headers, "cookie"), vec!["foo=123, bar=456"]);
}

#[test]
fn test_edit_without_match_and_separator_concatenates() {
    let mut headers = HeaderMap::new();
    headers.insert("x-tags", HeaderValue::from_static("a"));

    apply(
        &HeaderChange::builder("X-Tags", Side::Request, Action::Edit)
            .value("b")
            .replace("z+")
            .build()
            .unwrap(),
        &mut headers,
    );

    assert_eq!(values(&headers, "x-tags"), vec!["ab"]);
}

// 매칭 여부를 "치환 결과에 값이 들어 있는지"로 판단하므로, 원래 값에 이미 같은
// 문자열이 있으면 패턴이 매칭되지 않아도 덧붙이지 않음
#[test]
fn test_edit_containment_check_skips_append_when_value_already_present() {
    let mut headers = HeaderMap::new();
    headers.insert("cache-control", HeaderValue::from_static("public, max-age=60"));

    apply(
        &HeaderChange::builder("Cache-Control", Side::Response, Action::Edit)
            .value("public")
            .replace("private")
            .separator(", ")
            .build()
            .unwrap(),
        &mut headers,
    );

    assert_eq!(values(&headers, "cache-control"), vec!["public, max-age=60"]);
}

// 반대 방향: 패턴은 매칭됐지만 치환 결과에 값 문자열이 그대로 남지 않으면
// ($9 같은 그룹 참조가 빈 문자열로 확장됨) 매칭 실패로 보고 값을 다시 덧붙임
#[test]
fn test_edit_containment_check_appends_when_substituted_value_differs() {
    let mut headers = HeaderMap::new();
    headers.insert("cache-control", HeaderValue::from_static("max-age=0"));

    apply(
        &HeaderChange::builder("Cache-Control", Side::Response, Action::Edit)
            .value("max-age=$9")
            .replace("max-age=([0-9]+)")
            .build()
            .unwrap(),
        &mut headers,
    );

    assert_eq!(values(&headers, "cache-control"), vec!["max-age=max-age=$9"]);
}

#[test]
fn test_edit_joins_multiple_occurrences_before_substitution() {
    let mut headers = HeaderMap::new();
    headers.append("cache-control", HeaderValue::from_static("no-store"));
    headers.append("cache-control", HeaderValue::from_static("max-age=0"));

    apply(
        &HeaderChange::builder("Cache-Control", Side::Response, Action::Edit)
            .value("max-age=30")
            .replace("max-age=[0-9]+")
            .build()
            .unwrap(),
        &mut headers,
    );

    assert_eq!(values(&headers, "cache-control"), vec!["no-store, max-age=30"]);
}

#[test]
fn test_edit_requires_replace_pattern() {
    let result = HeaderChange::builder("X", Side::Request, Action::Edit)
        .value("V")
        .build();

    assert!(matches!(result, Err(RewriteError::MissingReplace { .. })));
}

#[test]
fn test_invalid_replace_pattern_is_construction_error() {
    let result = HeaderChange::builder("X", Side::Request, Action::Edit)
        .value("V")
        .replace("(unclosed")
        .build();

    assert!(matches!(result, Err(RewriteError::InvalidReplace { .. })));
}

#[test]
fn test_append_with_separator() {
    let append = HeaderChange::builder("Vary", Side::Response, Action::Append)
        .value("Accept-Encoding")
        .separator(", ")
        .build()
        .unwrap();

    let mut headers = HeaderMap::new();
    apply(&append, &mut headers);
    assert_eq!(values(&headers, "vary"), vec!["Accept-Encoding"]);

    let mut existing = HeaderMap::new();
    existing.insert("vary", HeaderValue::from_static("Origin"));
    apply(&append, &mut existing);
    assert_eq!(values(&existing, "vary"), vec!["Origin, Accept-Encoding"]);
}

#[test]
fn test_append_without_separator_adds_occurrence() {
    let mut headers = HeaderMap::new();
    headers.insert("x", HeaderValue::from_static("foo"));

    apply(&change("X", Side::Response, Action::Append, "bar"), &mut headers);

    assert_eq!(values(&headers, "x"), vec!["foo", "bar"]);
}

#[test]
fn test_unknown_action_emits_diagnostic_and_changes_nothing() {
    let recorder = Recorder::default();
    let mut headers = HeaderMap::new();
    headers.insert("x", HeaderValue::from_static("keep"));

    let merge = change("X", Side::Response, Action::parse("merge"), "other");
    let set = change("Y", Side::Response, Action::Set, "after");
    merge.apply(&mut headers, T, &recorder);
    set.apply(&mut headers, T, &recorder);

    assert_eq!(values(&headers, "x"), vec!["keep"]);
    assert_eq!(values(&headers, "y"), vec!["after"]);
    let events = recorder.events();
    assert_eq!(events.len(), 1);
    assert!(events[0].contains("UnknownAction"));
    assert!(events[0].contains("merge"));
}

#[test]
fn test_action_parse_is_case_insensitive() {
    assert_eq!(Action::parse("SET"), Action::Set);
    assert_eq!(Action::parse("Unset"), Action::Unset);
    assert_eq!(Action::parse("edit"), Action::Edit);
    assert_eq!(Action::parse(" append "), Action::Append);
    assert_eq!(Action::parse("merge"), Action::Unknown("merge".to_string()));
}

#[test]
fn test_macro_expands_relative_to_now() {
    assert_eq!(
        macros::expand("@DT_ADD#86400@", T, &NoopDiagnostics),
        "Mon, 07 Nov 1994 08:49:37 GMT"
    );

    let later = datetime!(2024-02-28 23:00:00 UTC);
    assert_eq!(
        macros::expand("@DT_ADD#86400@", later, &NoopDiagnostics),
        "Thu, 29 Feb 2024 23:00:00 GMT"
    );
}

#[test]
fn test_macro_expands_every_occurrence_and_trims() {
    let expanded = macros::expand("  @DT_ADD#0@ / @DT_ADD#60@  ", T, &NoopDiagnostics);
    assert_eq!(expanded, "Sun, 06 Nov 1994 08:49:37 GMT / Sun, 06 Nov 1994 08:50:37 GMT");

    assert_eq!(macros::expand("  no-cache ", T, &NoopDiagnostics), "no-cache");
}

#[test]
fn test_macro_with_unparsable_offset_falls_back_to_now() {
    let recorder = Recorder::default();
    let expanded = macros::expand("@DT_ADD#99999999999999999999@", T, &recorder);

    assert_eq!(expanded, "Sun, 06 Nov 1994 08:49:37 GMT");
    assert!(recorder.events()[0].contains("MalformedMacroOffset"));
}

#[test]
fn test_macro_uses_utc_for_offset_instants() {
    let seoul = datetime!(1994-11-06 17:49:37 +9);
    assert_eq!(macros::http_date(seoul).unwrap(), "Sun, 06 Nov 1994 08:49:37 GMT");
}

#[test]
fn test_set_with_macro_value() {
    let mut headers = HeaderMap::new();
    apply(&change("Expires", Side::Response, Action::Set, "@DT_ADD#3600@"), &mut headers);

    assert_eq!(values(&headers, "expires"), vec!["Sun, 06 Nov 1994 09:49:37 GMT"]);
}

#[test]
fn test_sentinel_gating_only_first_sentinel_fires() {
    let rules = RuleSet::new(
        vec![
            Rule::new("a", "^/never$").unwrap()
                .with_change(change("X-A", Side::Response, Action::Set, "a")),
            Rule::new("b", NO_MATCH).unwrap()
                .with_change(change("X-B", Side::Response, Action::Set, "b")),
            Rule::new("c", NO_MATCH).unwrap()
                .with_change(change("X-C", Side::Response, Action::Set, "c")),
        ],
        vec![change("X-Default", Side::Response, Action::Set, "d")],
    );

    let mut headers = HeaderMap::new();
    let report = rules.apply(Side::Response, "/index.html", &mut headers, T, &NoopDiagnostics);

    assert_eq!(report.fired, vec!["b"]);
    assert!(!report.defaults_applied);
    assert!(headers.get("x-a").is_none());
    assert_eq!(headers["x-b"], "b");
    assert!(headers.get("x-c").is_none());
    assert!(headers.get("x-default").is_none());
}

#[test]
fn test_sentinel_after_match_does_not_fire() {
    let rules = RuleSet::new(
        vec![
            Rule::new("images", r"\.png$").unwrap(),
            Rule::new("fallback", NO_MATCH).unwrap(),
        ],
        vec![],
    );

    let selection = rules.select("/logo.png");
    let names: Vec<&str> = selection.fired.iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["images"]);
    assert!(!selection.use_defaults);
}

#[test]
fn test_all_matching_rules_fire_and_later_set_wins() {
    let rules = RuleSet::new(
        vec![
            Rule::new("assets", "^/assets/").unwrap()
                .with_change(change("Cache-Control", Side::Response, Action::Set, "max-age=60")),
            Rule::new("scripts", r"\.js$").unwrap()
                .with_change(change("Cache-Control", Side::Response, Action::Set, "max-age=3600")),
        ],
        vec![],
    );

    let mut headers = HeaderMap::new();
    let report = rules.apply(Side::Response, "/assets/app.js", &mut headers, T, &NoopDiagnostics);

    assert_eq!(report.fired, vec!["assets", "scripts"]);
    assert_eq!(values(&headers, "cache-control"), vec!["max-age=3600"]);
}

#[test]
fn test_path_pattern_is_unanchored() {
    let rules = RuleSet::new(vec![Rule::new("api", "api").unwrap()], vec![]);

    assert_eq!(rules.select("/v1/api/users").fired.len(), 1);
    assert!(rules.select("/v1/users").use_defaults);
}

#[test]
fn test_invalid_path_pattern_is_construction_error() {
    let result = Rule::new("broken", "[a-");
    assert!(matches!(result, Err(RewriteError::InvalidPattern { .. })));
}

#[test]
fn test_sides_are_evaluated_independently() {
    let rules = RuleSet::new(
        vec![Rule::new("api", "^/api/").unwrap().with_changes(vec![
            change("X-Forwarded-Proto", Side::Request, Action::Set, "https"),
            change("X-Api", Side::Response, Action::Set, "1"),
        ])],
        vec![],
    );

    let mut request = HeaderMap::new();
    let mut response = HeaderMap::new();
    rules.apply(Side::Request, "/api/users", &mut request, T, &NoopDiagnostics);
    rules.apply(Side::Response, "/api/users", &mut response, T, &NoopDiagnostics);

    assert_eq!(request["x-forwarded-proto"], "https");
    assert!(request.get("x-api").is_none());
    assert_eq!(response["x-api"], "1");
    assert!(response.get("x-forwarded-proto").is_none());
}

#[test]
fn test_end_to_end_static_assets_and_defaults() {
    let rules = RuleSet::new(
        vec![Rule::new("static", "(png|js)$").unwrap()
            .with_change(change("Expires", Side::Response, Action::Set, "@DT_ADD#86400@"))],
        vec![change("Cache-Control", Side::Response, Action::Set, "no-cache")],
    );

    let mut png = HeaderMap::new();
    rules.apply(Side::Response, "/a.png", &mut png, T, &NoopDiagnostics);
    assert_eq!(png["expires"], "Mon, 07 Nov 1994 08:49:37 GMT");
    assert!(png.get("cache-control").is_none());

    let mut html = HeaderMap::new();
    let report = rules.apply(Side::Response, "/a.html", &mut html, T, &NoopDiagnostics);
    assert!(report.defaults_applied);
    assert_eq!(html["cache-control"], "no-cache");
    assert!(html.get("expires").is_none());
}

#[test]
fn test_rule_and_default_events_are_reported() {
    let recorder = Recorder::default();
    let rules = RuleSet::new(
        vec![Rule::new("static", "(png|js)$").unwrap()],
        vec![change("Cache-Control", Side::Response, Action::Set, "no-cache")],
    );

    rules.apply(Side::Response, "/a.png", &mut HeaderMap::new(), T, &recorder);
    rules.apply(Side::Response, "/a.html", &mut HeaderMap::new(), T, &recorder);

    let events = recorder.events();
    assert_eq!(events.len(), 2);
    assert!(events[0].contains("RuleFired"));
    assert!(events[1].contains("DefaultsFired"));
}
