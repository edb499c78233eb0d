//! Name registry for rings
//!
//! 环形队列的名称注册表
//!
//! Rings hold no global state. Code that needs to find a ring by name creates a
//! [`RingRegistry`] and passes it to whoever registers or looks rings up.
//! Lookups are typed: a ring is only returned to a caller asking for the same
//! element type and disciplines it was created with.
//!
//! 环本身不持有任何全局状态。需要按名称查找环的代码自行创建 [`RingRegistry`]，
//! 并将其传递给注册或查找环的各方。查找是带类型的：只有请求的元素类型与同步方式
//! 与创建时一致才会返回该环。

use crate::error::RegistryError;
use crate::ring::{Ring, RingInfo};
use crate::shim::sync::Arc;
use crate::sync::HeadTailSync;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, warn};

trait RegisteredRing: Send + Sync {
    fn info(&self) -> RingInfo;
    fn as_any(&self) -> &dyn Any;
}

impl<T, P, C> RegisteredRing for Arc<Ring<T, P, C>>
where
    T: Send + 'static,
    P: HeadTailSync,
    C: HeadTailSync,
{
    fn info(&self) -> RingInfo {
        (**self).info()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Registry mapping names to rings
///
/// 名称到环的映射注册表
///
/// # Examples
///
/// ```
/// use syncring::{new, Mt, RingConfig, RingRegistry};
///
/// let registry = RingRegistry::new();
/// let (producer, _consumer) = new::<u32, Mt, Mt>(RingConfig::new("rx", 64)).unwrap();
/// registry.register(producer.ring()).unwrap();
///
/// let ring = registry.lookup::<u32, Mt, Mt>("rx").unwrap();
/// assert_eq!(ring.usable_capacity(), 63);
/// assert_eq!(registry.list(), vec!["rx".to_string()]);
/// ```
#[derive(Default)]
pub struct RingRegistry {
    rings: RwLock<HashMap<String, Box<dyn RegisteredRing>>>,
}

impl RingRegistry {
    /// Create an empty registry
    ///
    /// 创建空的注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ring` under its own name
    ///
    /// 以环自身的名称注册 `ring`
    ///
    /// # Errors
    /// `InvalidName` for an empty name, `Duplicate` if the name is taken.
    pub fn register<T, P, C>(&self, ring: &Arc<Ring<T, P, C>>) -> Result<(), RegistryError>
    where
        T: Send + 'static,
        P: HeadTailSync,
        C: HeadTailSync,
    {
        let name = ring.name();
        if name.is_empty() {
            return Err(RegistryError::InvalidName);
        }

        let mut rings = self.rings.write();
        match rings.entry(name.to_string()) {
            Entry::Occupied(_) => {
                warn!(ring = name, "ring name already registered");
                Err(RegistryError::Duplicate(name.to_string()))
            }
            Entry::Vacant(slot) => {
                slot.insert(Box::new(ring.clone()));
                debug!(ring = name, "ring registered");
                Ok(())
            }
        }
    }

    /// Find a ring by name and type
    ///
    /// 按名称与类型查找环
    ///
    /// Returns `None` if no ring has that name or it was created with a
    /// different element type or discipline.
    ///
    /// 名称不存在，或该环的元素类型、同步方式不同，均返回 `None`。
    pub fn lookup<T, P, C>(&self, name: &str) -> Option<Arc<Ring<T, P, C>>>
    where
        T: Send + 'static,
        P: HeadTailSync,
        C: HeadTailSync,
    {
        let rings = self.rings.read();
        rings
            .get(name)?
            .as_any()
            .downcast_ref::<Arc<Ring<T, P, C>>>()
            .cloned()
    }

    /// Remove a ring; returns whether it was registered
    ///
    /// 移除一个环，返回其是否曾被注册
    ///
    /// Handles already holding the ring keep working.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.rings.write().remove(name).is_some();
        if removed {
            debug!(ring = name, "ring unregistered");
        }
        removed
    }

    /// Names of all registered rings, sorted
    ///
    /// 所有已注册环的名称（已排序）
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rings.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Snapshot of a registered ring
    ///
    /// 已注册环的快照
    ///
    /// # Errors
    /// `InvalidName` for an empty name, `NotFound` for an unknown one.
    pub fn info(&self, name: &str) -> Result<RingInfo, RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::InvalidName);
        }
        self.rings
            .read()
            .get(name)
            .map(|ring| ring.info())
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Number of registered rings
    ///
    /// 已注册环的数量
    pub fn len(&self) -> usize {
        self.rings.read().len()
    }

    /// Check if no ring is registered
    ///
    /// 检查是否没有已注册的环
    pub fn is_empty(&self) -> bool {
        self.rings.read().is_empty()
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use crate::{Hts, Mt, RingConfig, St, SyncKind, new};

    #[test]
    fn test_register_and_lookup() {
        let registry = RingRegistry::new();
        let (mut producer, _consumer) = new::<u64, Mt, St>(RingConfig::new("rx", 16)).unwrap();
        registry.register(producer.ring()).unwrap();

        producer.enqueue(5).unwrap();
        let ring = registry.lookup::<u64, Mt, St>("rx").unwrap();
        assert_eq!(ring.count(), 1);

        // Extra producer handles come from the looked-up ring
        let mut other = Ring::producer(&ring);
        other.enqueue(6).unwrap();
        assert_eq!(producer.ring().count(), 2);
    }

    #[test]
    fn test_lookup_wrong_type_or_name() {
        let registry = RingRegistry::new();
        let (producer, _consumer) = new::<u64, Mt, Mt>(RingConfig::new("rx", 16)).unwrap();
        registry.register(producer.ring()).unwrap();

        assert!(registry.lookup::<u32, Mt, Mt>("rx").is_none());
        assert!(registry.lookup::<u64, Hts, Mt>("rx").is_none());
        assert!(registry.lookup::<u64, Mt, Mt>("tx").is_none());
    }

    #[test]
    fn test_duplicate_and_empty_names() {
        let registry = RingRegistry::new();
        let (first, _c1) = new::<u8, St, St>(RingConfig::new("dup", 4)).unwrap();
        let (second, _c2) = new::<u8, St, St>(RingConfig::new("dup", 4)).unwrap();
        let (unnamed, _c3) = new::<u8, St, St>(RingConfig::new("", 4)).unwrap();

        registry.register(first.ring()).unwrap();
        assert_eq!(
            registry.register(second.ring()),
            Err(RegistryError::Duplicate("dup".into()))
        );
        assert_eq!(
            registry.register(unnamed.ring()),
            Err(RegistryError::InvalidName)
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_list_info_unregister() {
        let registry = RingRegistry::new();
        let (mut b, _cb) = new::<u32, St, Mt>(RingConfig::new("b", 8)).unwrap();
        let (a, _ca) = new::<u32, Hts, Hts>(RingConfig::new("a", 100).exact_size(true)).unwrap();
        registry.register(b.ring()).unwrap();
        registry.register(a.ring()).unwrap();

        assert_eq!(registry.list(), vec!["a".to_string(), "b".to_string()]);

        b.enqueue_bulk(&[1, 2, 3]);
        let info = registry.info("b").unwrap();
        assert_eq!(info.name, "b");
        assert!(info.single_producer);
        assert!(!info.single_consumer);
        assert_eq!(info.producer_sync, SyncKind::St);
        assert_eq!(info.consumer_sync, SyncKind::Mt);
        assert_eq!(info.size, 8);
        assert_eq!(info.capacity, 7);
        assert_eq!(info.count, 3);

        let info = registry.info("a").unwrap();
        assert_eq!(info.size, 128);
        assert_eq!(info.capacity, 100);

        assert_eq!(registry.info(""), Err(RegistryError::InvalidName));
        assert_eq!(
            registry.info("zz"),
            Err(RegistryError::NotFound("zz".into()))
        );

        assert!(registry.unregister("a"));
        assert!(!registry.unregister("a"));
        assert_eq!(registry.list(), vec!["b".to_string()]);
    }

    #[test]
    fn test_info_serializes() {
        let (producer, _consumer) = new::<u16, Mt, Hts>(RingConfig::new("tel", 4)).unwrap();
        let json = serde_json::to_value(producer.ring().info()).unwrap();
        assert_eq!(json["name"], "tel");
        assert_eq!(json["producer_sync"], "mt");
        assert_eq!(json["consumer_sync"], "mt_hts");
        assert_eq!(json["capacity"], 3);
    }
}
