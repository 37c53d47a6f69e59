use crate::domain::ports::{Clock, IdGenerator};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

/// Millisecond timestamps, bumped forward when two ids are requested within
/// the same millisecond (or the clock steps back), so ids are strictly
/// increasing for the lifetime of the generator.
pub struct TimestampIds {
    clock: Arc<dyn Clock>,
    last: AtomicI64,
}

impl TimestampIds {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            last: AtomicI64::new(i64::MIN),
        }
    }
}

impl IdGenerator for TimestampIds {
    fn next_id(&self) -> String {
        let now = self.clock.now_millis();
        let mut issued = now;
        // fetch_update only fails when the closure returns None.
        let _ = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                issued = now.max(last.saturating_add(1));
                Some(issued)
            });
        issued.to_string()
    }
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    #[test]
    fn test_same_millisecond_does_not_collide() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let clock = FixedClock::new(date, 1_717_200_000_000);
        let ids = TimestampIds::new(Arc::new(clock));

        let first = ids.next_id();
        let second = ids.next_id();
        assert_eq!(first, "1717200000000");
        assert_eq!(second, "1717200000001");
    }

    #[test]
    fn test_uuid_ids_are_distinct() {
        let ids = UuidIds;
        let issued: HashSet<_> = (0..100).map(|_| ids.next_id()).collect();
        assert_eq!(issued.len(), 100);
    }
}
