use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Result as NotifyResult, Watcher};
use crate::settings::{Result, SettingsError};
use tracing::{debug, error};

/// 설정 파일 변경 이벤트
#[derive(Debug, PartialEq, Clone)]
pub enum ConfigEvent {
    /// 파일이 생성되거나 수정됨
    Changed(PathBuf),
    /// 파일이 삭제됨
    Removed(PathBuf),
}

/// 설정 파일 하나를 감시합니다.
///
/// 편집기가 임시 파일을 rename하는 방식으로 저장해도 놓치지 않도록 상위 디렉토리를
/// 감시하고 대상 파일 이벤트만 걸러냅니다.
pub struct ConfigWatcher {
    path: PathBuf,
    event_tx: mpsc::Sender<ConfigEvent>,
    event_rx: mpsc::Receiver<ConfigEvent>,
    watcher: Option<RecommendedWatcher>,
}

impl ConfigWatcher {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let (event_tx, event_rx) = mpsc::channel(32);
        Self {
            path: path.into(),
            event_tx,
            event_rx,
            watcher: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 테스트용 이벤트 송신자 반환
    #[cfg(test)]
    pub fn sender(&self) -> mpsc::Sender<ConfigEvent> {
        self.event_tx.clone()
    }

    pub fn start(&mut self) -> Result<()> {
        let event_tx = self.event_tx.clone();
        let target = self.path.clone();

        let mut watcher = notify::recommended_watcher(move |res: NotifyResult<Event>| {
            match res {
                Ok(event) => {
                    for path in event.paths.iter().filter(|p| same_file(p, &target)) {
                        let config_event = match event.kind {
                            EventKind::Create(_) | EventKind::Modify(_) => ConfigEvent::Changed(path.clone()),
                            EventKind::Remove(_) => ConfigEvent::Removed(path.clone()),
                            _ => continue,
                        };
                        debug!(event = ?config_event, "설정 파일 이벤트");
                        if event_tx.blocking_send(config_event).is_err() {
                            debug!("설정 이벤트 수신자가 종료됨");
                        }
                    }
                }
                Err(e) => error!("감시 오류: {}", e),
            }
        }).map_err(|e| SettingsError::WatchError(e.to_string()))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        debug!("디렉토리 감시 시작: {}", dir.display());
        watcher.watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| SettingsError::WatchError(e.to_string()))?;

        self.watcher = Some(watcher);
        Ok(())
    }

    /// 다음 이벤트를 기다립니다.
    pub async fn next_event(&mut self) -> Option<ConfigEvent> {
        self.event_rx.recv().await
    }
}

fn same_file(candidate: &Path, target: &Path) -> bool {
    candidate == target || (candidate.file_name().is_some() && candidate.file_name() == target.file_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_config_watcher_delivers_events() {
        let path = PathBuf::from("/etc/rproxy/headers.toml");
        let mut watcher = ConfigWatcher::new(&path);
        let tx = watcher.sender();

        let events = vec![
            ConfigEvent::Changed(path.clone()),
            ConfigEvent::Removed(path.clone()),
        ];
        for event in events.clone() {
            tx.send(event).await.unwrap();
        }

        for expected in events {
            match watcher.next_event().await {
                Some(event) => assert_eq!(event, expected),
                None => panic!("이벤트를 받지 못했습니다"),
            }
        }
    }

    #[test]
    fn test_same_file() {
        let target = Path::new("/etc/rproxy/headers.toml");
        assert!(same_file(Path::new("/etc/rproxy/headers.toml"), target));
        assert!(same_file(Path::new("/private/etc/rproxy/headers.toml"), target));
        assert!(!same_file(Path::new("/etc/rproxy/other.toml"), target));
    }
}
