//! 헤더 재작성 엔진
//!
//! 요청 경로와 순서가 있는 규칙 목록으로 어떤 규칙이 발동할지 정하고, 요청/응답 헤더에
//! 변경을 적용합니다.
//!
//! ```
//! use rproxy_headers::rewrite::{Action, HeaderChange, NoopDiagnostics, Rule, RuleSet, Side};
//! use hyper::HeaderMap;
//! use time::OffsetDateTime;
//!
//! let expires = HeaderChange::builder("Expires", Side::Response, Action::Set)
//!     .value("@DT_ADD#86400@")
//!     .build()
//!     .unwrap();
//! let no_cache = HeaderChange::builder("Cache-Control", Side::Response, Action::Set)
//!     .value("no-cache")
//!     .build()
//!     .unwrap();
//!
//! let rules = RuleSet::new(
//!     vec![Rule::new("static", "(png|js)$").unwrap().with_change(expires)],
//!     vec![no_cache],
//! );
//!
//! let mut headers = HeaderMap::new();
//! rules.apply(Side::Response, "/a.html", &mut headers, OffsetDateTime::now_utc(), &NoopDiagnostics);
//! assert_eq!(headers["cache-control"], "no-cache");
//! ```

mod change;
mod clock;
mod diagnostics;
mod error;
pub mod macros;
mod rules;
mod store;

pub use change::{Action, HeaderChange, HeaderChangeBuilder, Side};
pub use clock::{Clock, FixedClock, SystemClock};
pub use diagnostics::{DiagnosticEvent, Diagnostics, NoopDiagnostics};
pub use error::RewriteError;
pub use rules::{PassReport, PathPattern, Rule, RuleSet, Selection, NO_MATCH};
pub use store::RuleStore;
