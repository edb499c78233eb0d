//! Ring, producer and consumer handles
//!
//! 环形队列与生产者/消费者句柄
//!
//! A [`Ring`] is shared through an `Arc` by any number of [`Producer`] and
//! [`Consumer`] handles. The producer discipline `P` and consumer discipline
//! `C` are type parameters: a side using [`St`](crate::St) hands out exactly
//! one non-cloneable handle, while a multi-threaded side ([`Mt`],
//! [`Rts`](crate::Rts), [`Hts`](crate::Hts)) hands out cloneable handles that
//! may be moved to as many threads as needed.
//!
//! [`Ring`] 通过 `Arc` 在任意数量的 [`Producer`] 与 [`Consumer`] 句柄之间共享。
//! 生产者同步方式 `P` 与消费者同步方式 `C` 是类型参数：使用 [`St`](crate::St) 的一侧
//! 只提供一个不可克隆的句柄，多线程侧则提供可克隆的句柄。

use crate::config::RingConfig;
use crate::core::RingCore;
use crate::error::{ConfigError, PopError, PushError};
use crate::shim::sync::Arc;
use crate::sync::{Behavior, HeadTailSync, Mt, MultiThreaded, Reservation, SyncKind};
use crossbeam_utils::CachePadded;
use serde::Serialize;
use std::mem::MaybeUninit;
use std::slice;
use tracing::debug;

/// Result of a bulk or burst transfer
///
/// 批量（bulk）或突发（burst）传输的结果
///
/// Transferring zero elements is a normal outcome of a full or empty ring.
///
/// 传输零个元素是队列满或空时的正常结果，而非错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transfer {
    /// Elements actually moved
    ///
    /// 实际移动的元素数量
    pub transferred: usize,

    /// Free space left after an enqueue, or entries left after a dequeue
    ///
    /// 入队后剩余的空闲空间，或出队后剩余的条目数
    pub remaining: usize,
}

/// Point-in-time description of a ring
///
/// 环形队列的时间点快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RingInfo {
    /// Ring name
    pub name: String,
    /// Whether the producer side is single-threaded
    pub single_producer: bool,
    /// Whether the consumer side is single-threaded
    pub single_consumer: bool,
    /// Producer discipline
    pub producer_sync: SyncKind,
    /// Consumer discipline
    pub consumer_sync: SyncKind,
    /// Backing slot count
    pub size: usize,
    /// Elements currently stored
    pub count: usize,
    /// Usable capacity
    pub capacity: usize,
}

/// Shared ring state
///
/// 共享的环形队列状态
///
/// # Type Parameters
/// - `T`: Element type, copied in and out of slots by value
/// - `P`: Producer synchronization discipline
/// - `C`: Consumer synchronization discipline
///
/// # 类型参数
/// - `T`: 元素类型，按值拷入拷出槽位
/// - `P`: 生产者同步方式
/// - `C`: 消费者同步方式
pub struct Ring<T, P: HeadTailSync = Mt, C: HeadTailSync = Mt> {
    name: String,
    core: RingCore<T>,
    prod: CachePadded<P::State>,
    cons: CachePadded<C::State>,
}

#[inline]
fn request_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl<T: Copy, P: HeadTailSync, C: HeadTailSync> Ring<T, P, C> {
    fn from_core(config: &RingConfig, core: RingCore<T>) -> Self {
        let geometry = core.geometry();
        let (prod_htd_max, cons_htd_max) = config.resolved_htd_max(&geometry);

        debug!(
            ring = %config.name,
            size = geometry.size(),
            capacity = geometry.capacity(),
            producer = ?P::KIND,
            consumer = ?C::KIND,
            "ring created"
        );

        Self {
            name: config.name.clone(),
            core,
            prod: CachePadded::new(P::new_state(geometry.size(), prod_htd_max)),
            cons: CachePadded::new(C::new_state(geometry.size(), cons_htd_max)),
        }
    }

    /// Outcome of a finished reservation
    ///
    /// `remaining` is computed from positions read at different moments, so a
    /// reservation that lost a race can see more than the ring could ever hold.
    #[inline]
    fn transfer(&self, reservation: &Reservation) -> Transfer {
        Transfer {
            transferred: reservation.n as usize,
            remaining: reservation.remaining().min(self.core.capacity()) as usize,
        }
    }

    /// Reserve, copy in and publish up to `values.len()` elements.
    fn do_enqueue(&self, values: &[T], behavior: Behavior) -> Transfer {
        let reservation = P::move_head(
            &*self.prod,
            || C::tail(&*self.cons),
            self.core.capacity(),
            request_len(values.len()),
            behavior,
        );

        if reservation.n > 0 {
            // SAFETY: move_head gave this thread exclusive use of
            // [old_head, new_head), and n <= values.len().
            unsafe {
                self.core
                    .copy_in(reservation.old_head, &values[..reservation.n as usize]);
            }
            P::update_tail(&*self.prod, &reservation);
        }

        self.transfer(&reservation)
    }

    /// Reserve, copy out and release up to `len` elements into `dest`.
    ///
    /// # Safety
    /// `dest` must be valid for `len` writes of `T`.
    unsafe fn do_dequeue(&self, dest: *mut T, len: usize, behavior: Behavior) -> Transfer {
        let reservation = C::move_head(
            &*self.cons,
            || P::tail(&*self.prod),
            0,
            request_len(len),
            behavior,
        );

        if reservation.n > 0 {
            // SAFETY: the range was published by producers and is now reserved
            // by this thread; n <= len.
            unsafe {
                self.core
                    .copy_out(reservation.old_head, dest, reservation.n as usize);
            }
            C::update_tail(&*self.cons, &reservation);
        }

        self.transfer(&reservation)
    }
}

impl<T, P: HeadTailSync, C: HeadTailSync> Ring<T, P, C> {
    /// Ring name
    ///
    /// 环的名称
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of slots in the backing table (a power of two)
    ///
    /// 槽位表的槽位数量（2 的幂次）
    ///
    /// This is not the number of elements the ring can hold; see
    /// [`usable_capacity`](Self::usable_capacity).
    ///
    /// 这不是环可容纳的元素数量，参见 [`usable_capacity`](Self::usable_capacity)。
    #[inline]
    pub fn capacity(&self) -> usize {
        self.core.size() as usize
    }

    /// Number of elements the ring can hold
    ///
    /// 环可容纳的元素数量
    #[inline]
    pub fn usable_capacity(&self) -> usize {
        self.core.capacity() as usize
    }

    /// Number of elements currently published and not yet consumed
    ///
    /// 当前已发布且尚未消费的元素数量
    ///
    /// Advisory under concurrent use: the value may be stale on return.
    ///
    /// 并发使用时仅供参考：返回时该值可能已过时。
    #[inline]
    pub fn count(&self) -> usize {
        // Consumer tail first so the difference cannot go negative
        let cons_tail = C::tail(&*self.cons);
        let prod_tail = P::tail(&*self.prod);
        let count = prod_tail.wrapping_sub(cons_tail);
        count.min(self.core.capacity()) as usize
    }

    /// Number of free entries
    ///
    /// 空闲条目数量
    #[inline]
    pub fn free_count(&self) -> usize {
        self.usable_capacity() - self.count()
    }

    /// Check if the ring holds `usable_capacity` elements
    ///
    /// 检查环是否已存满 `usable_capacity` 个元素
    #[inline]
    pub fn is_full(&self) -> bool {
        self.free_count() == 0
    }

    /// Check if the ring holds no published elements
    ///
    /// 检查环中是否没有已发布的元素
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Size in bytes of one slot
    ///
    /// 单个槽位的字节大小
    #[inline]
    pub fn element_size(&self) -> usize {
        std::mem::size_of::<T>()
    }

    /// Producer discipline
    ///
    /// 生产者同步方式
    #[inline]
    pub fn producer_sync(&self) -> SyncKind {
        P::KIND
    }

    /// Consumer discipline
    ///
    /// 消费者同步方式
    #[inline]
    pub fn consumer_sync(&self) -> SyncKind {
        C::KIND
    }

    /// Whether the producer side is [`St`](crate::St)
    ///
    /// 生产者侧是否为单线程方式
    #[inline]
    pub fn is_single_producer(&self) -> bool {
        !P::KIND.is_multi_threaded()
    }

    /// Whether the consumer side is [`St`](crate::St)
    ///
    /// 消费者侧是否为单线程方式
    #[inline]
    pub fn is_single_consumer(&self) -> bool {
        !C::KIND.is_multi_threaded()
    }

    /// Snapshot of the ring's configuration and occupancy
    ///
    /// 环的配置与占用情况快照
    pub fn info(&self) -> RingInfo {
        RingInfo {
            name: self.name.clone(),
            single_producer: self.is_single_producer(),
            single_consumer: self.is_single_consumer(),
            producer_sync: P::KIND,
            consumer_sync: C::KIND,
            size: self.capacity(),
            count: self.count(),
            capacity: self.usable_capacity(),
        }
    }

    /// Producer and consumer `(head, tail)` positions, for diagnostics
    ///
    /// 生产者与消费者的 `(head, tail)` 位置，用于诊断
    ///
    /// Positions are free-running `u32` counters; only their differences mean
    /// anything.
    pub fn positions(&self) -> ((u32, u32), (u32, u32)) {
        (
            (P::head(&*self.prod), P::tail(&*self.prod)),
            (C::head(&*self.cons), C::tail(&*self.cons)),
        )
    }
}

impl<T, P: MultiThreaded, C: HeadTailSync> Ring<T, P, C> {
    /// Create another producer handle for a multi-threaded producer side
    ///
    /// 为多线程生产者侧创建新的生产者句柄
    pub fn producer(ring: &Arc<Self>) -> Producer<T, P, C> {
        Producer { ring: ring.clone() }
    }
}

impl<T, P: HeadTailSync, C: MultiThreaded> Ring<T, P, C> {
    /// Create another consumer handle for a multi-threaded consumer side
    ///
    /// 为多线程消费者侧创建新的消费者句柄
    pub fn consumer(ring: &Arc<Self>) -> Consumer<T, P, C> {
        Consumer { ring: ring.clone() }
    }
}

/// Create a new ring and return its first producer and consumer handles
///
/// 创建新的环形队列并返回其第一个生产者与消费者句柄
///
/// # Type Parameters
/// - `T`: Element type
/// - `P`: Producer discipline ([`St`](crate::St), [`Mt`], [`Rts`](crate::Rts), [`Hts`](crate::Hts))
/// - `C`: Consumer discipline
///
/// # Errors
/// [`ConfigError`] when the requested count is zero or too large.
///
/// # 错误
/// 请求数量为零或过大时返回 [`ConfigError`]。
///
/// # Examples
///
/// ```
/// use syncring::{new, Mt, RingConfig, St};
///
/// let (mut producer, mut consumer) = new::<u64, Mt, St>(RingConfig::new("events", 8)).unwrap();
///
/// let sent = producer.enqueue_bulk(&[1, 2, 3]);
/// assert_eq!(sent.transferred, 3);
/// assert_eq!(sent.remaining, 4);
///
/// let mut out = [0u64; 8];
/// let got = consumer.dequeue_burst(&mut out);
/// assert_eq!(&out[..got.transferred], &[1, 2, 3]);
/// ```
pub fn new<T: Copy, P: HeadTailSync, C: HeadTailSync>(
    config: RingConfig,
) -> Result<(Producer<T, P, C>, Consumer<T, P, C>), ConfigError> {
    let geometry = config.geometry()?;
    let ring = Ring::from_core(&config, RingCore::new(geometry));
    Ok(split(ring))
}

/// Create a new ring over caller-allocated slot storage
///
/// 基于调用者分配的槽位存储创建新的环形队列
///
/// `storage.len()` must equal the backing size of the configured geometry
/// (`config.geometry()?.size()`); [`RingConfig::mem_size`] gives the byte size.
///
/// `storage.len()` 必须等于配置几何参数的槽位表大小。
pub fn with_storage<T: Copy, P: HeadTailSync, C: HeadTailSync>(
    config: RingConfig,
    storage: Box<[MaybeUninit<T>]>,
) -> Result<(Producer<T, P, C>, Consumer<T, P, C>), ConfigError> {
    let geometry = config.geometry()?;
    let core = RingCore::with_storage(geometry, storage)?;
    let ring = Ring::from_core(&config, core);
    Ok(split(ring))
}

fn split<T, P: HeadTailSync, C: HeadTailSync>(
    ring: Ring<T, P, C>,
) -> (Producer<T, P, C>, Consumer<T, P, C>) {
    let ring = Arc::new(ring);
    let producer = Producer { ring: ring.clone() };
    let consumer = Consumer { ring };
    (producer, consumer)
}

/// Producer handle
///
/// 生产者句柄
///
/// Cloneable when `P` is multi-threaded. Every operation is non-blocking.
///
/// 当 `P` 为多线程方式时可克隆。所有操作均不阻塞。
pub struct Producer<T, P: HeadTailSync = Mt, C: HeadTailSync = Mt> {
    ring: Arc<Ring<T, P, C>>,
}

/// Consumer handle
///
/// 消费者句柄
///
/// Cloneable when `C` is multi-threaded. Every operation is non-blocking.
///
/// 当 `C` 为多线程方式时可克隆。所有操作均不阻塞。
pub struct Consumer<T, P: HeadTailSync = Mt, C: HeadTailSync = Mt> {
    ring: Arc<Ring<T, P, C>>,
}

impl<T, P: MultiThreaded, C: HeadTailSync> Clone for Producer<T, P, C> {
    fn clone(&self) -> Self {
        Self {
            ring: self.ring.clone(),
        }
    }
}

impl<T, P: HeadTailSync, C: MultiThreaded> Clone for Consumer<T, P, C> {
    fn clone(&self) -> Self {
        Self {
            ring: self.ring.clone(),
        }
    }
}

impl<T: Copy, P: HeadTailSync, C: HeadTailSync> Producer<T, P, C> {
    /// Enqueue one element
    ///
    /// 入队一个元素
    ///
    /// # Errors
    /// Returns `PushError::Full` with the value if the ring is full
    ///
    /// # 错误
    /// 如果队列已满则返回携带该值的 `PushError::Full`
    #[inline]
    pub fn enqueue(&mut self, value: T) -> Result<(), PushError<T>> {
        let transfer = self
            .ring
            .do_enqueue(slice::from_ref(&value), Behavior::Fixed);
        if transfer.transferred == 1 {
            Ok(())
        } else {
            Err(PushError::Full(value))
        }
    }

    /// Enqueue all of `values` or nothing
    ///
    /// 全部入队 `values` 或一个也不入队
    ///
    /// `transferred` is either 0 or `values.len()`.
    ///
    /// `transferred` 为 0 或 `values.len()`。
    #[inline]
    pub fn enqueue_bulk(&mut self, values: &[T]) -> Transfer {
        self.ring.do_enqueue(values, Behavior::Fixed)
    }

    /// Enqueue as many of `values` as fit
    ///
    /// 尽可能多地入队 `values`
    #[inline]
    pub fn enqueue_burst(&mut self, values: &[T]) -> Transfer {
        self.ring.do_enqueue(values, Behavior::Variable)
    }
}

impl<T, P: HeadTailSync, C: HeadTailSync> Producer<T, P, C> {
    /// Shared ring behind this handle
    #[inline]
    pub fn ring(&self) -> &Arc<Ring<T, P, C>> {
        &self.ring
    }

    /// Number of elements the ring can hold
    ///
    /// 环可容纳的元素数量
    #[inline]
    pub fn usable_capacity(&self) -> usize {
        self.ring.usable_capacity()
    }

    /// Number of free entries
    ///
    /// 空闲条目数量
    #[inline]
    pub fn free_count(&self) -> usize {
        self.ring.free_count()
    }

    /// Check if the ring is full
    ///
    /// 检查环是否已满
    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }
}

impl<T: Copy, P: HeadTailSync, C: HeadTailSync> Consumer<T, P, C> {
    /// Dequeue one element
    ///
    /// 出队一个元素
    ///
    /// # Errors
    /// Returns `PopError::Empty` if the ring is empty
    ///
    /// # 错误
    /// 如果队列为空则返回 `PopError::Empty`
    #[inline]
    pub fn dequeue(&mut self) -> Result<T, PopError> {
        let mut slot = MaybeUninit::<T>::uninit();
        // SAFETY: `slot` is valid for one write.
        let transfer = unsafe { self.ring.do_dequeue(slot.as_mut_ptr(), 1, Behavior::Fixed) };
        if transfer.transferred == 1 {
            // SAFETY: one element was copied into `slot`.
            Ok(unsafe { slot.assume_init() })
        } else {
            Err(PopError::Empty)
        }
    }

    /// Fill all of `dest` or take nothing
    ///
    /// 填满整个 `dest` 或一个也不取
    ///
    /// `transferred` is either 0 or `dest.len()`.
    #[inline]
    pub fn dequeue_bulk(&mut self, dest: &mut [T]) -> Transfer {
        // SAFETY: `dest` is valid for `dest.len()` writes.
        unsafe {
            self.ring
                .do_dequeue(dest.as_mut_ptr(), dest.len(), Behavior::Fixed)
        }
    }

    /// Take as many elements as are available, up to `dest.len()`
    ///
    /// 取出尽可能多的元素，最多 `dest.len()` 个
    ///
    /// Elements land at the front of `dest`; the rest of `dest` is untouched.
    ///
    /// 元素写入 `dest` 的前部，其余部分保持不变。
    #[inline]
    pub fn dequeue_burst(&mut self, dest: &mut [T]) -> Transfer {
        // SAFETY: `dest` is valid for `dest.len()` writes.
        unsafe {
            self.ring
                .do_dequeue(dest.as_mut_ptr(), dest.len(), Behavior::Variable)
        }
    }

    /// Create a draining iterator
    ///
    /// 创建一个消费迭代器
    ///
    /// The iterator dequeues one element at a time until the ring reports empty.
    ///
    /// 迭代器逐个出队，直到队列为空。
    ///
    /// # Examples
    ///
    /// ```
    /// use syncring::{new, RingConfig, St};
    ///
    /// let (mut producer, mut consumer) = new::<i32, St, St>(RingConfig::new("d", 8)).unwrap();
    /// producer.enqueue_bulk(&[1, 2, 3]);
    ///
    /// let items: Vec<i32> = consumer.drain().collect();
    /// assert_eq!(items, vec![1, 2, 3]);
    /// assert!(consumer.is_empty());
    /// ```
    #[inline]
    pub fn drain(&mut self) -> Drain<'_, T, P, C> {
        Drain { consumer: self }
    }
}

impl<T, P: HeadTailSync, C: HeadTailSync> Consumer<T, P, C> {
    /// Shared ring behind this handle
    #[inline]
    pub fn ring(&self) -> &Arc<Ring<T, P, C>> {
        &self.ring
    }

    /// Number of readable elements
    ///
    /// 可读取的元素数量
    #[inline]
    pub fn count(&self) -> usize {
        self.ring.count()
    }

    /// Check if the ring is empty
    ///
    /// 检查环是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

/// Draining iterator over a consumer
///
/// 消费者上的消费迭代器
pub struct Drain<'a, T, P: HeadTailSync, C: HeadTailSync> {
    consumer: &'a mut Consumer<T, P, C>,
}

impl<T: Copy, P: HeadTailSync, C: HeadTailSync> Iterator for Drain<'_, T, P, C> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.consumer.dequeue().ok()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        // Producers may keep adding while we drain
        (0, None)
    }
}
