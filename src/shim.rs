//! Primitives the ring synchronizes on
//!
//! 环形队列所依赖的同步原语
//!
//! Head/tail words, the shared `Arc` and the busy-wait hint come from here so
//! that building with the `loom` feature swaps every one of them for its model
//! checked counterpart at once.
//!
//! 启用 `loom` 特性时，这里的原子类型、`Arc` 与忙等待提示会整体替换为 loom 版本。

#[cfg(not(feature = "loom"))]
pub mod atomic {
    pub use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
}

#[cfg(feature = "loom")]
pub mod atomic {
    pub use loom::sync::atomic::{AtomicU32, AtomicU64, Ordering};
}

#[cfg(not(feature = "loom"))]
pub mod sync {
    pub use std::sync::Arc;
}

#[cfg(feature = "loom")]
pub mod sync {
    pub use loom::sync::Arc;
}

/// Busy-wait hint used while waiting on another thread's publication.
///
/// Under loom this yields so the model checker can schedule the thread we wait on.
#[cfg(not(feature = "loom"))]
#[inline]
pub fn spin_loop() {
    std::hint::spin_loop();
}

#[cfg(feature = "loom")]
#[inline]
pub fn spin_loop() {
    loom::thread::yield_now();
}
