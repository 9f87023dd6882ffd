//! Typed resource handles and the index allocator behind them.

/// Maximum live resources of one kind.
pub const MAX_HANDLES: u16 = 4096;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        pub struct $name(u16);

        impl $name {
            /// Sentinel returned when creation fails.
            pub const INVALID: Self = Self(u16::MAX);

            pub const fn from_raw(idx: u16) -> Self {
                Self(idx)
            }

            pub const fn raw(self) -> u16 {
                self.0
            }

            pub const fn is_valid(self) -> bool {
                self.0 != u16::MAX
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }
    };
}

define_handle!(
    /// Static vertex buffer.
    VertexBufferHandle
);
define_handle!(
    /// Static 16-bit index buffer.
    IndexBufferHandle
);
define_handle!(
    /// Compiled shader module.
    ShaderHandle
);
define_handle!(
    /// Linked vertex + fragment shader pair.
    ProgramHandle
);

/// Free-list index allocator.
///
/// Freed indices are reused most-recently-freed first.
#[derive(Debug, Clone)]
pub struct HandleAlloc {
    capacity: u16,
    next: u16,
    free: Vec<u16>,
    live: Vec<bool>,
}

impl HandleAlloc {
    pub fn new(capacity: u16) -> Self {
        // u16::MAX is the invalid sentinel and is never handed out.
        let capacity = capacity.min(u16::MAX - 1);
        Self {
            capacity,
            next: 0,
            free: Vec::new(),
            live: Vec::new(),
        }
    }

    /// Returns a fresh index, or `None` when all `capacity` indices are live.
    pub fn alloc(&mut self) -> Option<u16> {
        let idx = match self.free.pop() {
            Some(idx) => idx,
            None if self.next < self.capacity => {
                let idx = self.next;
                self.next += 1;
                self.live.push(false);
                idx
            }
            None => return None,
        };

        self.live[idx as usize] = true;
        Some(idx)
    }

    /// Releases `idx`. Returns `false` if it was not live.
    pub fn free(&mut self, idx: u16) -> bool {
        match self.live.get_mut(idx as usize) {
            Some(live) if *live => {
                *live = false;
                self.free.push(idx);
                true
            }
            _ => false,
        }
    }

    pub fn is_live(&self, idx: u16) -> bool {
        self.live.get(idx as usize).copied().unwrap_or(false)
    }

    pub fn live_count(&self) -> usize {
        self.next as usize - self.free.len()
    }
}

/// Slot storage addressed by [`HandleAlloc`] indices.
#[derive(Debug)]
pub(crate) struct ResourceTable<T> {
    alloc: HandleAlloc,
    slots: Vec<Option<T>>,
}

impl<T> ResourceTable<T> {
    pub(crate) fn new() -> Self {
        Self {
            alloc: HandleAlloc::new(MAX_HANDLES),
            slots: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> Option<u16> {
        let idx = self.alloc.alloc()?;
        let slot = idx as usize;
        if slot >= self.slots.len() {
            self.slots.resize_with(slot + 1, || None);
        }
        self.slots[slot] = Some(value);
        Some(idx)
    }

    pub(crate) fn get(&self, idx: u16) -> Option<&T> {
        self.slots.get(idx as usize)?.as_ref()
    }

    pub(crate) fn remove(&mut self, idx: u16) -> Option<T> {
        if !self.alloc.free(idx) {
            return None;
        }
        self.slots.get_mut(idx as usize)?.take()
    }

    pub(crate) fn len(&self) -> usize {
        self.alloc.live_count()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.alloc = HandleAlloc::new(MAX_HANDLES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── handles ───────────────────────────────────────────────────────────

    #[test]
    fn default_handle_is_invalid() {
        assert!(!VertexBufferHandle::default().is_valid());
        assert_eq!(ProgramHandle::default(), ProgramHandle::INVALID);
    }

    #[test]
    fn raw_round_trips() {
        let h = IndexBufferHandle::from_raw(7);
        assert!(h.is_valid());
        assert_eq!(h.raw(), 7);
    }

    // ── HandleAlloc ───────────────────────────────────────────────────────

    #[test]
    fn alloc_hands_out_sequential_indices() {
        let mut a = HandleAlloc::new(8);
        assert_eq!(a.alloc(), Some(0));
        assert_eq!(a.alloc(), Some(1));
        assert_eq!(a.alloc(), Some(2));
        assert_eq!(a.live_count(), 3);
    }

    #[test]
    fn freed_index_is_reused() {
        let mut a = HandleAlloc::new(8);
        let first = a.alloc().unwrap();
        a.alloc().unwrap();
        assert!(a.free(first));
        assert_eq!(a.alloc(), Some(first));
    }

    #[test]
    fn double_free_is_rejected() {
        let mut a = HandleAlloc::new(4);
        let idx = a.alloc().unwrap();
        assert!(a.free(idx));
        assert!(!a.free(idx));
        assert!(!a.free(3));
    }

    #[test]
    fn exhaustion_returns_none() {
        let mut a = HandleAlloc::new(2);
        assert!(a.alloc().is_some());
        assert!(a.alloc().is_some());
        assert_eq!(a.alloc(), None);
    }

    #[test]
    fn sentinel_is_never_allocated() {
        let a = HandleAlloc::new(u16::MAX);
        assert_eq!(a.capacity, u16::MAX - 1);
    }

    // ── ResourceTable ─────────────────────────────────────────────────────

    #[test]
    fn table_insert_get_remove() {
        let mut t = ResourceTable::new();
        let a = t.insert("a").unwrap();
        let b = t.insert("b").unwrap();

        assert_eq!(t.get(a), Some(&"a"));
        assert_eq!(t.get(b), Some(&"b"));
        assert_eq!(t.len(), 2);

        assert_eq!(t.remove(a), Some("a"));
        assert_eq!(t.get(a), None);
        assert_eq!(t.remove(a), None);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn table_clear_drops_everything() {
        let mut t = ResourceTable::new();
        t.insert(1).unwrap();
        t.insert(2).unwrap();
        t.clear();
        assert_eq!(t.len(), 0);
        assert_eq!(t.get(0), None);
    }
}
