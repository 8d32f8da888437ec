use hyper::Request;
use crate::rewrite::{Clock, Diagnostics, PassReport, RuleSet, Side};

/// 요청 쪽 규칙을 평가해 요청 헤더를 재작성합니다.
pub struct RequestProcessor<'a> {
    rules: &'a RuleSet,
    clock: &'a dyn Clock,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> RequestProcessor<'a> {
    pub fn new(rules: &'a RuleSet, clock: &'a dyn Clock, diagnostics: &'a dyn Diagnostics) -> Self {
        Self { rules, clock, diagnostics }
    }

    pub fn process<B>(&self, req: &mut Request<B>) -> PassReport {
        let path = req.uri().path().to_owned();
        self.rules.apply(
            Side::Request,
            &path,
            req.headers_mut(),
            self.clock.now(),
            self.diagnostics,
        )
    }
}
