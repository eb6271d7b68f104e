//! Interned string handles.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// A handle into the engine's [`StringInterner`]. Cheap to copy and compare.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(u32);

impl Name {
    pub const EMPTY: Name = Name(0);

    #[must_use]
    pub fn from_raw(raw: u32) -> Self {
        Name(raw)
    }

    #[must_use]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl Default for Name {
    fn default() -> Self {
        Name::EMPTY
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

/// Intern table for identifiers, string-literal contents, tag names and meta
/// keys. Single-shard by design: this engine parses one file per
/// `StringInterner` instance, so the teacher's sharded interner (built for a
/// much higher-concurrency incremental-compilation workload) is unnecessary
/// machinery here.
pub struct StringInterner {
    inner: RwLock<InternTable>,
    total_count: AtomicUsize,
}

struct InternTable {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

impl StringInterner {
    #[must_use]
    pub fn new() -> Self {
        StringInterner {
            inner: RwLock::new(InternTable { map: FxHashMap::default(), strings: Vec::new() }),
            total_count: AtomicUsize::new(0),
        }
    }

    /// Interns `s`, copying it onto the heap and leaking it for the lifetime
    /// of the interner. Subsequent interns of an equal string are O(1) and
    /// allocation-free.
    pub fn intern(&self, s: &str) -> Name {
        if let Some(&id) = self.inner.read().map.get(s) {
            return Name(id);
        }
        let mut table = self.inner.write();
        if let Some(&id) = table.map.get(s) {
            return Name(id);
        }
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let id = u32::try_from(table.strings.len()).expect("interner overflowed u32 ids");
        table.strings.push(leaked);
        table.map.insert(leaked, id);
        self.total_count.fetch_add(1, Ordering::Relaxed);
        Name(id)
    }

    #[must_use]
    pub fn lookup(&self, name: Name) -> &'static str {
        self.inner.read().strings[name.0 as usize]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.total_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe shared handle to a [`StringInterner`], used where a module
/// pool or builder outlives a single parse.
#[derive(Clone)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    #[must_use]
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }
}

impl Default for SharedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &StringInterner {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_string_returns_same_name() {
        let interner = StringInterner::new();
        let a = interner.intern("rule");
        let b = interner.intern("rule");
        assert_eq!(a, b);
        assert_eq!(interner.lookup(a), "rule");
    }

    #[test]
    fn distinct_strings_get_distinct_names() {
        let interner = StringInterner::new();
        let a = interner.intern("foo");
        let b = interner.intern("bar");
        assert_ne!(a, b);
    }
}
