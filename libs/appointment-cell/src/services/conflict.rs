use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use shared_models::clinic::SlotKey;

/// Per-slot async locks serializing the check-then-insert of a booking.
///
/// Entries are dropped once no booking holds or waits on them.
#[derive(Default)]
pub struct SlotLocks {
    locks: Mutex<HashMap<SlotKey, Arc<AsyncMutex<()>>>>,
}

pub struct SlotGuard<'a> {
    owner: &'a SlotLocks,
    slot: SlotKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SlotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, slot: &SlotKey) -> SlotGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            locks
                .entry(slot.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        debug!("Waiting for slot lock {}", slot);
        let guard = lock.lock_owned().await;

        SlotGuard {
            owner: self,
            slot: slot.clone(),
            guard: Some(guard),
        }
    }

    pub fn tracked_slots(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();

        let mut locks = self
            .owner
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Only the map holds a reference: nobody is waiting on this slot.
        if let Some(lock) = locks.get(&self.slot) {
            if Arc::strong_count(lock) == 1 {
                locks.remove(&self.slot);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use std::time::Duration;

    fn slot(hour: u32) -> SlotKey {
        SlotKey {
            provider_name: "Dr. X".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_same_slot_is_exclusive() {
        let locks = Arc::new(SlotLocks::new());
        let first = locks.acquire(&slot(10)).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&slot(10)).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(first);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_slots_do_not_block() {
        let locks = SlotLocks::new();
        let _ten = locks.acquire(&slot(10)).await;
        let _eleven = locks.acquire(&slot(11)).await;
        assert_eq!(locks.tracked_slots(), 2);
    }

    #[tokio::test]
    async fn test_released_slots_are_forgotten() {
        let locks = SlotLocks::new();
        {
            let _guard = locks.acquire(&slot(9)).await;
        }
        assert_eq!(locks.tracked_slots(), 0);
    }
}
