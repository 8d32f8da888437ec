//! rproxy_headers는 경로 정규식 규칙에 따라 요청/응답 헤더를 재작성하는 리버스 프록시입니다.
//! 
//! # 주요 기능
//! 
//! - 경로 정규식 기반 규칙 선택과 기본 헤더 폴백
//! - set / unset / edit / append 헤더 변경
//! - `@DT_ADD#<초>@` 날짜 매크로 (IMF-fixdate)
//! - 응답 헤더 확정 시점에 규칙을 적용하는 응답 인터셉터
//! - 설정 파일 변경 시 규칙 무중단 교체
//! 
//! # 예제
//! 
//! ```
//! use rproxy_headers::middleware::HeadersConfig;
//! 
//! let config = HeadersConfig::from_toml(r#"
//!     [[rules]]
//!     name = "static"
//!     regexp = "(png|js)$"
//!     headerChanges = [
//!         { header = "Cache-Control", req = false, value = "max-age=86400", action = "set" },
//!     ]
//! "#).unwrap();
//! 
//! let rules = config.compile().unwrap();
//! assert_eq!(rules.rules().len(), 1);
//! ```

pub mod logging;
pub mod middleware;
pub mod proxy;
pub mod rewrite;
pub mod server;
pub mod settings;
