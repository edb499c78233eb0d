//! # Lock-Free Bounded Ring
//!
//! 无锁有界环形队列
//!
//! `syncring` is a fixed-capacity, lock-free FIFO ring for `Copy` elements.
//! Producers and consumers each pick a synchronization discipline:
//!
//! `syncring` 是面向 `Copy` 元素的固定容量无锁 FIFO 环形队列。
//! 生产者与消费者各自选择一种同步方式：
//!
//! - [`St`] - single thread, the cheapest path
//! - [`Mt`] - many threads, CAS on head and publication in reservation order
//! - [`Rts`] - many threads, the tail only advances when the last in-flight
//!   reservation completes (relaxed tail sync)
//! - [`Hts`] - many threads, one reservation in flight at a time (head/tail sync)
//!
//! - [`St`] - 单线程，开销最小
//! - [`Mt`] - 多线程，CAS 预留，按预留顺序发布
//! - [`Rts`] - 多线程，最后一个进行中的预留完成时才推进 tail
//! - [`Hts`] - 多线程，同一时刻只允许一个预留
//!
//! ## Quick Start
//!
//! 快速开始
//!
//! ```rust
//! use syncring::{new, Mt, RingConfig};
//!
//! // 8 requested slots round up to a backing size of 8 with 7 usable
//! // 请求 8 个槽位，向上取整为 8，可用 7 个
//! let (mut producer, mut consumer) = new::<u32, Mt, Mt>(RingConfig::new("jobs", 8)).unwrap();
//! assert_eq!(producer.usable_capacity(), 7);
//!
//! // Bulk: all or nothing
//! // 批量：全部或不做
//! assert_eq!(producer.enqueue_bulk(&[1, 2, 3, 4, 5]).transferred, 5);
//! assert_eq!(producer.enqueue_bulk(&[6, 7, 8]).transferred, 0);
//!
//! // Burst: as many as possible
//! // 突发：尽可能多
//! let sent = producer.enqueue_burst(&[6, 7, 8]);
//! assert_eq!((sent.transferred, sent.remaining), (2, 0));
//!
//! let mut out = [0u32; 4];
//! assert_eq!(consumer.dequeue_bulk(&mut out).transferred, 4);
//! assert_eq!(out, [1, 2, 3, 4]);
//! ```
//!
//! ## Multi-threaded Usage
//!
//! 多线程使用
//!
//! Handles of a multi-threaded side are `Clone`; each clone may move to its own thread.
//!
//! 多线程侧的句柄实现了 `Clone`，每个克隆都可以移动到独立线程。
//!
//! ```rust
//! use syncring::{new, Hts, RingConfig, St};
//! use std::thread;
//!
//! let (producer, mut consumer) = new::<u64, Hts, St>(RingConfig::new("mp", 64)).unwrap();
//!
//! let workers: Vec<_> = (0..4u64)
//!     .map(|id| {
//!         let mut producer = producer.clone();
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 while producer.enqueue(id * 1000 + i).is_err() {
//!                     thread::yield_now();
//!                 }
//!             }
//!         })
//!     })
//!     .collect();
//! drop(producer);
//!
//! let mut received = 0;
//! while received < 400 {
//!     match consumer.dequeue() {
//!         Ok(_) => received += 1,
//!         Err(_) => thread::yield_now(),
//!     }
//! }
//! for worker in workers {
//!     worker.join().unwrap();
//! }
//! ```
//!
//! ## Sizing
//!
//! 容量
//!
//! By default the backing size is the next power of two of the requested count
//! and one slot stays free, so `count = 1000` gives 1023 usable slots. With
//! [`RingConfig::exact_size`] the ring holds exactly `count` elements over a
//! backing size of `next_power_of_two(count + 1)`.
//!
//! 默认情况下槽位表大小为请求数量向上取整到 2 的幂次，并保留一个空槽，因此
//! `count = 1000` 可用 1023 个。启用 [`RingConfig::exact_size`] 后环恰好容纳
//! `count` 个元素。
//!
//! ## Notes
//!
//! 注意事项
//!
//! - Every operation is non-blocking at the API level; a full or empty ring yields zero transferred
//! - Elements are copied by value, so `T: Copy`
//! - Multi-threaded sides may spin briefly while waiting for an earlier reservation to publish
//!
//! - 所有操作在 API 层面均不阻塞，队列满或空时传输数量为零
//! - 元素按值拷贝，因此要求 `T: Copy`
//! - 多线程侧在等待更早的预留发布时可能短暂自旋

pub mod config;
pub mod core;
pub mod error;
pub mod registry;
mod ring;
mod shim;
mod slots;
pub mod sync;

pub use config::RingConfig;
pub use error::{ConfigError, PopError, PushError, RegistryError};
pub use registry::RingRegistry;
pub use ring::{Consumer, Drain, Producer, Ring, RingInfo, Transfer, new, with_storage};
pub use sync::{Behavior, HeadTailSync, Hts, Mt, MultiThreaded, Rts, St, SyncKind};
