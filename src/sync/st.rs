//! Single-thread discipline.

use super::{Behavior, HeadTail, HeadTailSync, Reservation, Sealed, SyncKind};
use crate::shim::atomic::Ordering;

/// Single-producer or single-consumer side
///
/// 单生产者或单消费者侧
///
/// Exactly one thread moves this side's head, so reservation and publication
/// are plain stores. Handles for an `St` side cannot be cloned.
///
/// 只有一个线程推进该侧的 head，因此预留与发布都是普通存储。`St` 侧的句柄不可克隆。
pub struct St;

impl Sealed for St {}

impl HeadTailSync for St {
    type State = HeadTail;

    const KIND: SyncKind = SyncKind::St;

    fn new_state(_size: u32, _htd_max: u32) -> HeadTail {
        HeadTail::new()
    }

    #[inline]
    fn tail(state: &HeadTail) -> u32 {
        state.tail_acquire()
    }

    #[inline]
    fn head(state: &HeadTail) -> u32 {
        state.head_relaxed()
    }

    #[inline]
    fn move_head<F>(
        state: &HeadTail,
        opposite_tail: F,
        capacity: u32,
        n: u32,
        behavior: Behavior,
    ) -> Reservation
    where
        F: Fn() -> u32,
    {
        let old_head = state.head.load(Ordering::Relaxed);
        let entries = capacity
            .wrapping_add(opposite_tail())
            .wrapping_sub(old_head);

        let n = behavior.clamp(n, entries);
        if n == 0 {
            return Reservation::empty(old_head, entries);
        }

        let new_head = old_head.wrapping_add(n);
        state.head.store(new_head, Ordering::Relaxed);
        Reservation {
            n,
            old_head,
            new_head,
            entries,
        }
    }

    #[inline]
    fn update_tail(state: &HeadTail, reservation: &Reservation) {
        state.tail.store(reservation.new_head, Ordering::Release);
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;

    #[test]
    fn test_producer_side_free_space() {
        let state = St::new_state(16, 0);
        // Opposite tail at 0, usable capacity 7
        let r = St::move_head(&state, || 0, 7, 4, Behavior::Variable);
        assert_eq!((r.n, r.old_head, r.new_head, r.entries), (4, 0, 4, 7));
        St::update_tail(&state, &r);

        let r = St::move_head(&state, || 0, 7, 4, Behavior::Variable);
        assert_eq!(r.n, 3);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_consumer_side_readable_count() {
        let state = St::new_state(16, 0);
        // Consumer side passes capacity 0; producer tail at 5
        let r = St::move_head(&state, || 5, 0, 8, Behavior::Fixed);
        assert_eq!(r.n, 0);
        assert_eq!(r.entries, 5);

        let r = St::move_head(&state, || 5, 0, 8, Behavior::Variable);
        assert_eq!(r.n, 5);
        St::update_tail(&state, &r);
        assert_eq!(St::tail(&state), 5);
    }

    #[test]
    fn test_positions_wrap_at_u32_max() {
        let state = St::new_state(16, 0);
        state.head.store(u32::MAX - 1, Ordering::Relaxed);
        state.tail.store(u32::MAX - 1, Ordering::Relaxed);

        // Producer tail has wrapped past zero
        let r = St::move_head(&state, || 2, 0, 4, Behavior::Fixed);
        assert_eq!(r.n, 4);
        assert_eq!(r.new_head, 2);
    }
}
