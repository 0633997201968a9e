use std::fmt;
use tracing::debug;

/// A handle to a value living in a [`Heap`]. Handles are plain indices; they
/// stay valid for as long as the value they point at is reachable from a
/// collection root.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct HeapRef(u32);

impl HeapRef {
    fn new(idx: usize) -> Self {
        Self(idx as u32)
    }

    fn idx(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for HeapRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub trait HeapValue {
    type ChildIter: Iterator<Item=HeapRef>;

    fn children(&self) -> Self::ChildIter;
}

struct Slot<T> {
    stamp: u64,
    pinned: bool,
    item: Option<T>,
}

/// Every value the interpreter allocates is registered here. Nothing is freed
/// until [`Heap::collect`] finds it unreachable.
pub struct Heap<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    generation: u64,
}

impl<T: HeapValue> Default for Heap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: HeapValue> Heap<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(256),
            free: Vec::new(),
            generation: 0,
        }
    }

    pub fn insert(&mut self, item: T) -> HeapRef {
        let slot = Slot {
            stamp: 0,
            pinned: false,
            item: Some(item),
        };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                HeapRef::new(idx)
            },
            None => {
                self.slots.push(slot);
                HeapRef::new(self.slots.len() - 1)
            },
        }
    }

    /// Exempt a value from collection for the lifetime of the heap.
    pub fn pin(&mut self, r: HeapRef) {
        self.slots[r.idx()].pinned = true;
    }

    pub fn contains(&self, r: HeapRef) -> bool {
        self.slots
            .get(r.idx())
            .map_or(false, |slot| slot.item.is_some())
    }

    pub fn get(&self, r: HeapRef) -> &T {
        self.slots[r.idx()].item
            .as_ref()
            .expect("Dangling heap reference")
    }

    pub fn get_mut(&mut self, r: HeapRef) -> &mut T {
        self.slots[r.idx()].item
            .as_mut()
            .expect("Dangling heap reference")
    }

    /// Mark every value reachable from `roots` with a fresh generation, then
    /// free everything that was not marked.
    pub fn collect(&mut self, roots: impl IntoIterator<Item=HeapRef>) -> usize {
        self.generation += 1;
        let generation = self.generation;

        // Mark
        let mut pending = roots.into_iter().collect::<Vec<_>>();
        while let Some(r) = pending.pop() {
            let slot = &mut self.slots[r.idx()];
            if slot.stamp == generation {
                continue;
            }
            slot.stamp = generation;
            if let Some(item) = &slot.item {
                pending.extend(item.children());
            }
        }

        // Sweep
        let mut freed = 0;
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.item.is_some() && !slot.pinned && slot.stamp < generation {
                slot.item = None;
                self.free.push(idx);
                freed += 1;
            }
        }

        debug!(generation, freed, live = self.len(), "collected heap");
        freed
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn survived(&self, slot: &Slot<T>) -> bool {
        self.generation > 0 && slot.stamp == self.generation
    }

    pub fn stats(&self) -> Stats {
        let live = || self.slots.iter().filter(|slot| slot.item.is_some());
        Stats {
            total: self.len(),
            marked: live()
                .filter(|slot| slot.pinned || self.survived(slot))
                .count(),
            stale: live()
                .filter(|slot| !slot.pinned && !self.survived(slot))
                .count(),
            free_slots: self.free.len(),
            generation: self.generation,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub marked: usize,
    pub stale: usize,
    pub free_slots: usize,
    pub generation: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "heap: {} total, {} marked, {} stale, {} free slots (generation {})",
            self.total, self.marked, self.stale, self.free_slots, self.generation,
        )
    }
}
