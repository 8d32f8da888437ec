use std::sync::Arc;
use arc_swap::ArcSwap;
use super::rules::RuleSet;

/// 현재 규칙 집합을 보관하는 저장소
///
/// 교체는 항상 통째로 원자적으로 이루어지고, 진행 중인 요청은 시작할 때 얻은
/// 스냅샷으로 끝까지 평가합니다.
#[derive(Debug, Clone)]
pub struct RuleStore {
    current: Arc<ArcSwap<RuleSet>>,
}

impl RuleStore {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(rules)),
        }
    }

    /// 현재 규칙 집합의 스냅샷
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.current.load_full()
    }

    pub fn replace(&self, rules: RuleSet) {
        self.current.store(Arc::new(rules));
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new(RuleSet::default())
    }
}
