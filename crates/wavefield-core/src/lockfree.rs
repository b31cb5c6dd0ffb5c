//! Lock-free primitives shared between the control and audio threads.

use std::sync::atomic::{AtomicBool, Ordering};

/// Cache-line aligned atomic bool.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Release);
    }

    /// Read and clear in one step.
    #[inline]
    pub fn take(&self) -> bool {
        self.value.swap(false, Ordering::AcqRel)
    }
}

impl Clone for AtomicFlag {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

impl Default for AtomicFlag {
    fn default() -> Self {
        Self::new(false)
    }
}

/// One dirty flag per channel.
///
/// Out-of-range indices are ignored by `mark` and read as clean.
#[derive(Debug, Default)]
pub struct ChannelFlags {
    flags: Box<[AtomicBool]>,
}

impl ChannelFlags {
    pub fn new(count: usize, initial: bool) -> Self {
        Self {
            flags: (0..count).map(|_| AtomicBool::new(initial)).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    #[inline]
    pub fn mark(&self, index: usize) {
        if let Some(flag) = self.flags.get(index) {
            flag.store(true, Ordering::Release);
        }
    }

    pub fn mark_all(&self) {
        for flag in self.flags.iter() {
            flag.store(true, Ordering::Release);
        }
    }

    #[inline]
    pub fn is_set(&self, index: usize) -> bool {
        self.flags
            .get(index)
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    pub fn any(&self) -> bool {
        self.flags.iter().any(|flag| flag.load(Ordering::Acquire))
    }

    pub fn clear_all(&self) {
        for flag in self.flags.iter() {
            flag.store(false, Ordering::Release);
        }
    }

    /// Resize, marking every channel dirty.
    pub fn resize(&mut self, count: usize) {
        *self = Self::new(count, true);
    }
}
