//! ## Interned Value Store
//! A reference counted [interning](https://en.wikipedia.org/wiki/Hash_consing) mechanism for
//! immutable values. The two key data structures are:
//! - [InternTable], which owns the canonical allocations and produces shared pointers to them
//!   through [InternTable::intern].
//! - [Interned], the shared smart pointer handed out by a table.
//!
//! The guarantees provided are:
//! 1. All [Interned] managed by the same [InternTable] are perfectly shared: structurally equal
//!    values sit behind the same allocation.
//! 2. Because of 1, comparing two [Interned] from the same table is a pointer comparison and
//!    thus constant time.
//! 3. Assuming constant time hashing and comparison of `T`, interning a `T` is constant time,
//!    as is hashing the resulting [Interned].
//! 4. Once every [Interned] for a value is dropped the backing allocation becomes collectable
//!    by [InternTable::gc].

use std::{
    cell::RefCell,
    cmp::Ordering,
    collections::hash_map::Entry,
    fmt::{Debug, Display},
    hash::{Hash, Hasher},
    ops::Deref,
    rc::{Rc, Weak},
};

use log::warn;
use rustc_hash::FxHashMap;

#[derive(Debug)]
struct TableCore<T>
where
    T: Eq + Hash,
{
    /// The canonical allocation map. Values map to weak [InternedCore] references so that a
    /// value whose outside reference count dropped to zero can be detected (its weak pointer no
    /// longer upgrades) and evicted by [TableCore::gc].
    entries: RefCell<FxHashMap<Rc<T>, Weak<InternedCore<T>>>>,
}

/// An interning table producing [Interned] smart pointers.
#[derive(Debug)]
pub struct InternTable<T>
where
    T: Eq + Hash,
{
    /// Reference counted so every [Interned] can name the table it came from and fast path its
    /// equality check.
    core: Rc<TableCore<T>>,
}

struct InternedCore<T>
where
    T: Eq + Hash,
{
    /// The canonical allocation. It is only freed once the entry is evicted from the table.
    value: Rc<T>,
    /// The table that owns `value`.
    table: Rc<TableCore<T>>,
}

/// An interned smart pointer, bound to the [InternTable] that produced it.
pub struct Interned<T>
where
    T: Eq + Hash,
{
    core: Rc<InternedCore<T>>,
}

impl<T: Eq + Hash> TableCore<T> {
    fn new() -> Self {
        Self {
            entries: RefCell::new(FxHashMap::default()),
        }
    }

    fn gc(&self) {
        // Evicting a value may drop the last [Interned] of values it recursively contains, so
        // the sweep has to run until a fixpoint is reached.
        loop {
            let mut entries = self.entries.borrow_mut();
            let prev_len = entries.len();
            entries.retain(|_, core| core.strong_count() > 0);

            if entries.len() == prev_len {
                break;
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

impl<T: Eq + Hash> InternTable<T> {
    pub fn new() -> Self {
        Self {
            core: Rc::new(TableCore::new()),
        }
    }

    /// Look up `value` in the table. If a canonical allocation already exists return a new
    /// [Interned] for it, otherwise insert `value` as the canonical allocation. The allocation
    /// stays alive until all [Interned] pointing at it are dropped and [InternTable::gc] runs.
    pub fn intern(&self, value: T) -> Interned<T> {
        let core = self.core.clone();
        let mut entries = core.entries.borrow_mut();

        let value_key = Rc::new(value);
        let value_rc = Rc::clone(&value_key);

        match entries.entry(value_key) {
            Entry::Occupied(mut e) => match e.get().upgrade() {
                Some(existing) => Interned { core: existing },
                None => {
                    // The weak pointer died but gc has not evicted the entry yet, revive it.
                    let revived = Rc::new(InternedCore {
                        value: value_rc,
                        table: self.core.clone(),
                    });
                    e.insert(Rc::downgrade(&revived));
                    Interned { core: revived }
                }
            },
            Entry::Vacant(e) => {
                let fresh = Rc::new(InternedCore {
                    value: value_rc,
                    table: self.core.clone(),
                });
                e.insert(Rc::downgrade(&fresh));
                Interned { core: fresh }
            }
        }
    }

    /// Evict all values that are no longer referenced outside this table.
    pub fn gc(&self) {
        self.core.gc();
    }

    /// The number of allocations currently kept, including ones that a [InternTable::gc] run
    /// would evict.
    pub fn len(&self) -> usize {
        self.core.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Eq + Hash> Clone for InternTable<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: Eq + Hash> Default for InternTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash> Interned<T> {
    pub fn as_ptr(&self) -> *const T {
        Rc::as_ptr(&self.core.value)
    }
}

impl<T: Eq + Hash> Hash for Interned<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.core.value.hash(state);
    }
}

impl<T: Eq + Hash> PartialEq for Interned<T> {
    fn eq(&self, other: &Self) -> bool {
        // Values from the same table are perfectly shared, so comparing the allocations
        // suffices. Cross table comparison has to fall back to structural equality.
        if Rc::ptr_eq(&self.core.table, &other.core.table) {
            Rc::ptr_eq(&self.core.value, &other.core.value)
        } else {
            warn!("comparing Interned values from different tables");
            self.core.value == other.core.value
        }
    }
}

impl<T: Eq + Hash> Eq for Interned<T> {}

impl<T: Eq + Hash> Clone for Interned<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: Eq + Hash + Debug> Debug for Interned<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.core.value, f)
    }
}

impl<T: Eq + Hash + Display> Display for Interned<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.core.value, f)
    }
}

impl<T: Eq + Hash> Deref for Interned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.core.value
    }
}

impl<T: Eq + Hash> AsRef<T> for Interned<T> {
    fn as_ref(&self) -> &T {
        self.core.value.as_ref()
    }
}

impl<T: Eq + Hash + PartialOrd> PartialOrd for Interned<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.core.value.partial_cmp(&other.core.value)
    }
}

impl<T: Eq + Hash + Ord> Ord for Interned<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.core.value.cmp(&other.core.value)
    }
}
