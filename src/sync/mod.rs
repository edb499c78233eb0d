//! Head/tail synchronization disciplines
//!
//! head/tail 同步方式
//!
//! Every ring side (producer or consumer) runs the same three-phase protocol:
//!
//! 1. **move head** - reserve a contiguous range of positions
//! 2. copy elements in or out of the reserved range (see [`RingCore`](crate::core::RingCore))
//! 3. **update tail** - publish the range to the opposite side
//!
//! The discipline decides how phases 1 and 3 are made safe:
//!
//! | Marker  | Writers  | Reserve                       | Publish                                   |
//! |---------|----------|-------------------------------|-------------------------------------------|
//! | [`St`]  | one      | plain store                   | plain store                               |
//! | [`Mt`]  | many     | CAS on head                   | wait for predecessors, then store          |
//! | [`Rts`] | many     | CAS on head, bounded distance | mark done; tail holder advances over finished ranges |
//! | [`Hts`] | many     | CAS on combined head/tail word | add to tail half, no waiting             |
//!
//! The discipline is chosen through the type parameters of
//! [`Ring`](crate::Ring) and is fixed for the life of the ring.
//!
//! 每一侧（生产者或消费者）都执行相同的三阶段协议：预留、拷贝、发布。同步方式决定
//! 预留与发布如何保证安全。同步方式通过 [`Ring`](crate::Ring) 的类型参数选择，
//! 在环的生命周期内不可更改。

mod hts;
mod mt;
mod rts;
mod st;

pub use hts::{Hts, HtsHeadTail};
pub use mt::Mt;
pub use rts::{Rts, RtsHeadTail};
pub use st::St;

use crate::shim::atomic::{AtomicU32, Ordering};
use serde::Serialize;

mod sealed {
    pub trait Sealed {}
}

pub(crate) use sealed::Sealed;

/// Reservation behavior when fewer than `n` entries are available
///
/// 可用条目少于 `n` 时的预留行为
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// All or nothing
    ///
    /// 全部或不做
    Fixed,
    /// As many as possible
    ///
    /// 尽可能多
    Variable,
}

impl Behavior {
    /// Number of elements to reserve given `n` requested and `entries` available
    #[inline]
    pub fn clamp(self, n: u32, entries: u32) -> u32 {
        if n <= entries {
            n
        } else {
            match self {
                Behavior::Fixed => 0,
                Behavior::Variable => entries,
            }
        }
    }
}

/// Synchronization type of one ring side
///
/// 环某一侧的同步类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    /// Single thread
    St,
    /// Multi-thread, CAS head and ordered tail
    Mt,
    /// Multi-thread, relaxed tail sync
    MtRts,
    /// Multi-thread, head/tail sync
    MtHts,
}

impl SyncKind {
    /// Whether more than one thread may use this side
    #[inline]
    pub fn is_multi_threaded(self) -> bool {
        !matches!(self, SyncKind::St)
    }
}

/// A claimed position range `[old_head, new_head)`
///
/// 已占用的位置区间 `[old_head, new_head)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    /// Number of positions claimed (0 when nothing was reserved)
    pub n: u32,
    /// First claimed position
    pub old_head: u32,
    /// One past the last claimed position
    pub new_head: u32,
    /// Entries that were available when the reservation was made
    ///
    /// 预留时可用的条目数
    pub entries: u32,
}

impl Reservation {
    #[inline]
    pub(crate) fn empty(old_head: u32, entries: u32) -> Self {
        Self {
            n: 0,
            old_head,
            new_head: old_head,
            entries,
        }
    }

    /// Entries left once this reservation is accounted for
    #[inline]
    pub fn remaining(&self) -> u32 {
        self.entries - self.n
    }
}

/// A head/tail synchronization discipline
///
/// head/tail 同步方式
///
/// Implemented only by the marker types [`St`], [`Mt`], [`Rts`] and [`Hts`].
///
/// `capacity` passed to [`move_head`](Self::move_head) is the ring's usable
/// capacity on the producer side and `0` on the consumer side, so that
/// `capacity + opposite_tail - old_head` is the free space for producers and
/// the readable count for consumers.
///
/// 生产者侧传入的 `capacity` 为环的可用容量，消费者侧为 `0`，因此
/// `capacity + opposite_tail - old_head` 对生产者表示空闲空间，对消费者表示可读数量。
pub trait HeadTailSync: Sealed + Send + Sync + 'static {
    /// Per-side state
    type State: Send + Sync;

    /// Runtime tag for introspection
    const KIND: SyncKind;

    /// Fresh state with all positions at zero
    ///
    /// `size` is the backing slot count and `htd_max` the head/tail distance
    /// limit; only [`Rts`] uses them.
    ///
    /// `size` 为槽位表大小，`htd_max` 为 head/tail 距离上限，仅 [`Rts`] 使用。
    fn new_state(size: u32, htd_max: u32) -> Self::State;

    /// Published tail position, as seen by the opposite side (acquire)
    ///
    /// 对侧看到的已发布 tail 位置（acquire）
    fn tail(state: &Self::State) -> u32;

    /// Current head position (advisory)
    fn head(state: &Self::State) -> u32;

    /// Reserve up to `n` positions
    ///
    /// 预留最多 `n` 个位置
    fn move_head<F>(
        state: &Self::State,
        opposite_tail: F,
        capacity: u32,
        n: u32,
        behavior: Behavior,
    ) -> Reservation
    where
        F: Fn() -> u32;

    /// Publish a reservation made by [`move_head`](Self::move_head)
    ///
    /// 发布由 [`move_head`](Self::move_head) 得到的预留
    fn update_tail(state: &Self::State, reservation: &Reservation);
}

/// Disciplines that allow several threads on the same side
///
/// 允许同一侧多个线程并发使用的同步方式
pub trait MultiThreaded: HeadTailSync {}

impl MultiThreaded for Mt {}
impl MultiThreaded for Rts {}
impl MultiThreaded for Hts {}

/// Classic head/tail pair used by [`St`] and [`Mt`]
///
/// [`St`] 与 [`Mt`] 使用的经典 head/tail 对
pub struct HeadTail {
    pub(crate) head: AtomicU32,
    pub(crate) tail: AtomicU32,
}

impl HeadTail {
    pub(crate) fn new() -> Self {
        Self {
            head: AtomicU32::new(0),
            tail: AtomicU32::new(0),
        }
    }

    #[inline]
    pub(crate) fn tail_acquire(&self) -> u32 {
        self.tail.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn head_relaxed(&self) -> u32 {
        self.head.load(Ordering::Relaxed)
    }
}
