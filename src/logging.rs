use std::path::Path;
use tracing::{debug, error, info, span, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};
use crate::rewrite::{DiagnosticEvent, Diagnostics};
use crate::settings::{LogFormat, LogOutput, LogSettings};

/// 로그 구독자를 설치합니다.
///
/// 논블로킹 writer의 guard를 반환합니다. guard가 drop되면 남은 로그를 비우고 writer가
/// 멈추므로 호출자는 프로세스가 끝날 때까지 이를 보관해야 합니다.
pub fn init_logging(settings: &LogSettings) -> WorkerGuard {
    let filter = EnvFilter::builder()
        .with_default_directive(settings.level.into())
        .from_env_lossy();

    let (writer, guard) = match &settings.output {
        LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogOutput::File(path) => {
            let path = Path::new(path);
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "rproxy_headers.log".into());
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
        }
    };

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let installed = match settings.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    if let Err(e) = installed {
        eprintln!("로그 구독자 설치 실패: {}", e);
    }

    guard
}

/// 엔진 진단 이벤트를 tracing 이벤트로 내보냅니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn emit(&self, event: DiagnosticEvent<'_>) {
        match event {
            DiagnosticEvent::RuleFired { rule, side } => {
                debug!(rule = %rule, side = ?side, "헤더 규칙 발동");
            }
            DiagnosticEvent::DefaultsFired { side } => {
                debug!(side = ?side, "매칭된 규칙 없음, 기본 헤더 적용");
            }
            DiagnosticEvent::UnknownAction { header, action } => {
                warn!(header = %header, action = %action, "알 수 없는 action 값. 유효한 값은 set|unset|edit|append");
            }
            DiagnosticEvent::MalformedMacroOffset { raw } => {
                warn!(raw = %raw, "날짜 매크로 초 값 해석 실패, 0초로 처리");
            }
            DiagnosticEvent::InvalidHeaderValue { header, value } => {
                warn!(header = %header, value = ?value, "헤더 값으로 사용할 수 없는 문자열");
            }
            DiagnosticEvent::InvalidReplace { header, pattern, reason } => {
                warn!(header = %header, pattern = %pattern, reason = %reason, "replace 패턴 컴파일 실패");
            }
        }
    }
}

#[derive(Debug)]
pub struct RequestLog {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub host: String,
    pub status_code: u16,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl RequestLog {
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            method: String::new(),
            path: String::new(),
            host: String::new(),
            status_code: 0,
            duration_ms: 0,
            error: None,
        }
    }

    pub fn with_request<B>(&mut self, req: &hyper::Request<B>) {
        self.method = req.method().to_string();
        self.path = req.uri().path().to_string();
        if let Some(host) = req.headers().get(hyper::header::HOST) {
            self.host = host.to_str().unwrap_or_default().to_string();
        }

        debug!(
            request_id = %self.request_id,
            method = %self.method,
            path = %self.path,
            host = %self.host,
            "Received request"
        );
    }

    pub fn with_response(&mut self, status: hyper::StatusCode) {
        self.status_code = status.as_u16();
    }

    pub fn with_error(&mut self, error: impl std::fmt::Display) {
        self.error = Some(error.to_string());
    }

    fn level(&self) -> Level {
        if self.error.is_some() {
            Level::ERROR
        } else if self.status_code >= 400 {
            Level::WARN
        } else {
            Level::INFO
        }
    }
}

pub fn log_request(log: &RequestLog) {
    let level = log.level();
    let span = span!(
        Level::INFO,
        "request",
        request_id = %log.request_id,
        method = %log.method,
        path = %log.path,
        host = %log.host,
        status = %log.status_code,
        duration_ms = %log.duration_ms
    );
    let _enter = span.enter();

    match level {
        Level::ERROR => error!(error = ?log.error, "Request failed"),
        Level::WARN => warn!("Request completed with warning"),
        _ => info!("Request completed successfully"),
    }
}
