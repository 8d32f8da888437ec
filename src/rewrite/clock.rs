use time::OffsetDateTime;

/// 날짜 매크로 확장 시점을 제공하는 시계
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// 실제 벽시계 시간(UTC)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// 항상 같은 시점을 돌려주는 시계
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}
