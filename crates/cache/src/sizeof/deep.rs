//! Recursive size inspection for values held by a store

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

/// Reports how many bytes a value occupies, including what it owns on the heap.
///
/// Implementations return `None` from [`heap_size_of`](Self::heap_size_of)
/// when the value cannot be measured, for example an opaque handle whose
/// backing allocation is not visible. The pool never treats that as zero.
pub trait DeepSizeOf {
    /// Bytes owned on the heap, excluding the inline size of `self`.
    fn heap_size_of(&self) -> Option<u64>;

    /// Inline size plus owned heap bytes.
    fn deep_size_of(&self) -> Option<u64> {
        let inline = mem::size_of_val(self) as u64;
        self.heap_size_of().map(|heap| inline + heap)
    }
}

macro_rules! inline_only {
    ($($ty:ty),* $(,)?) => {
        $(
            impl DeepSizeOf for $ty {
                #[inline]
                fn heap_size_of(&self) -> Option<u64> {
                    Some(0)
                }
            }
        )*
    };
}

inline_only!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64
);

impl DeepSizeOf for str {
    fn heap_size_of(&self) -> Option<u64> {
        Some(0)
    }
}

impl DeepSizeOf for String {
    fn heap_size_of(&self) -> Option<u64> {
        Some(self.capacity() as u64)
    }
}

impl<T: DeepSizeOf> DeepSizeOf for Vec<T> {
    fn heap_size_of(&self) -> Option<u64> {
        let slots = (self.capacity() * mem::size_of::<T>()) as u64;
        self.iter()
            .try_fold(slots, |acc, item| Some(acc + item.heap_size_of()?))
    }
}

impl<T: DeepSizeOf> DeepSizeOf for Option<T> {
    fn heap_size_of(&self) -> Option<u64> {
        match self {
            Some(inner) => inner.heap_size_of(),
            None => Some(0),
        }
    }
}

impl<T: DeepSizeOf + ?Sized> DeepSizeOf for Box<T> {
    fn heap_size_of(&self) -> Option<u64> {
        (**self).deep_size_of()
    }
}

/// Shared values are charged in full to every holder that is measured.
impl<T: DeepSizeOf + ?Sized> DeepSizeOf for Arc<T> {
    fn heap_size_of(&self) -> Option<u64> {
        // strong + weak counters precede the payload
        let counters = (2 * mem::size_of::<usize>()) as u64;
        (**self).deep_size_of().map(|payload| payload + counters)
    }
}

impl<A: DeepSizeOf, B: DeepSizeOf> DeepSizeOf for (A, B) {
    fn heap_size_of(&self) -> Option<u64> {
        Some(self.0.heap_size_of()? + self.1.heap_size_of()?)
    }
}

impl<K: DeepSizeOf, V: DeepSizeOf, S> DeepSizeOf for HashMap<K, V, S> {
    fn heap_size_of(&self) -> Option<u64> {
        // one control byte per bucket on top of the (K, V) slot
        let slot = (mem::size_of::<(K, V)>() + 1) as u64;
        let buckets = self.capacity() as u64 * slot;
        self.iter().try_fold(buckets, |acc, (k, v)| {
            Some(acc + k.heap_size_of()? + v.heap_size_of()?)
        })
    }
}
