use std::env;
use std::sync::Arc;
use rproxy_headers::{
    logging::{init_logging, TracingDiagnostics},
    middleware::HeadersMiddleware,
    proxy::ProxyHandler,
    rewrite::RuleStore,
    server::{RequestHandler, ServerListener},
    settings::{self, ConfigEvent, ConfigWatcher, Settings, CONFIG_FILE_ENV},
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (settings, rules) = match Settings::load() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("설정 로드 실패: {}", e);
            std::process::exit(1);
        }
    };

    let _guard = init_logging(&settings.logging);
    info!("설정 로드 완료");

    info!(rules = rules.rules().len(), "헤더 규칙 컴파일 완료");
    let store = RuleStore::new(rules);

    if let Ok(config_path) = env::var(CONFIG_FILE_ENV) {
        let mut watcher = ConfigWatcher::new(config_path);
        match watcher.start() {
            Ok(()) => {
                let store = store.clone();
                tokio::spawn(async move {
                    while let Some(event) = watcher.next_event().await {
                        match event {
                            ConfigEvent::Changed(path) => {
                                let config_path = watcher.path().to_path_buf();
                                let store = store.clone();
                                let reloaded = tokio::task::spawn_blocking(move || {
                                    settings::reload_rules(config_path, &store)
                                }).await;

                                match reloaded {
                                    Ok(Ok(_)) => {}
                                    Ok(Err(e)) => {
                                        error!(error = %e, path = %path.display(), "헤더 규칙 재적재 실패, 기존 규칙 유지");
                                    }
                                    Err(e) => error!(error = %e, "헤더 규칙 재적재 태스크 실패"),
                                }
                            }
                            ConfigEvent::Removed(path) => {
                                warn!(path = %path.display(), "설정 파일 삭제됨, 기존 규칙 유지");
                            }
                        }
                    }
                });
            }
            Err(e) => warn!(error = %e, "설정 파일 감시 시작 실패, 규칙 재적재 비활성화"),
        }
    }

    let middleware = HeadersMiddleware::new(store, Arc::new(TracingDiagnostics));
    let proxy = ProxyHandler::new(settings.server.upstream);
    let handler = Arc::new(RequestHandler::new(middleware, proxy));

    let listener = ServerListener::new(&settings.server).await?;
    listener.run(handler).await?;

    Ok(())
}
