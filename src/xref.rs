use std::collections::BTreeMap;

use crate::object::ObjectId;

/// A single cross-reference directory entry (§3 data model, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    /// Free-list slot; `next_free` is the object number of the next free
    /// slot per the classical free-list chain (type 0 rows).
    Free { next_free: u32 },
    /// Object `number` lives at absolute byte `offset` in the source with
    /// the stated `generation` (type 1 rows, or a classical `n` line).
    Normal { offset: u32, generation: u16 },
    /// Object lives inside the object stream `container` at `index`
    /// (type 2 rows; generation is always 0 for these).
    Compressed { container: u32, index: u16 },
    /// A free entry whose generation makes it permanently unusable
    /// (observed in some malformed incremental updates); kept distinct
    /// from `Free` so merges don't resurrect it.
    UnusableFree,
}

/// The object directory built by the xref resolver: a mapping from object
/// number to its most authoritative `XrefEntry`, plus the declared
/// `/Size`.
#[derive(Debug, Clone, Default)]
pub struct Xref {
    pub entries: BTreeMap<u32, XrefEntry>,
    pub size: u32,
}

impl Xref {
    pub fn new(size: u32) -> Self {
        Xref { entries: BTreeMap::new(), size }
    }

    pub fn get(&self, object_number: u32) -> Option<&XrefEntry> {
        self.entries.get(&object_number)
    }

    pub fn insert(&mut self, object_number: u32, entry: XrefEntry) {
        self.entries.insert(object_number, entry);
    }

    pub fn max_id(&self) -> u32 {
        self.entries.keys().next_back().copied().unwrap_or(0)
    }

    /// Merges an older xref section (`other`, from a `/Prev` chain link or
    /// an `/XRefStm` hybrid companion) into `self`. `self` is always the
    /// newer section: per spec.md §3 invariant 1 and §4.3 step 4,
    /// entries already present in `self` win and `other`'s entries are
    /// only used to fill gaps. This realizes the "newest section wins"
    /// precedence from the Open Question in spec.md §9 explicitly,
    /// including when the same object number appears once in a classical
    /// xref row and once as a compressed entry from an earlier section.
    pub fn merge(&mut self, other: Xref) {
        for (number, entry) in other.entries {
            self.entries.entry(number).or_insert(entry);
        }
        if other.size > self.size {
            self.size = other.size;
        }
    }

    /// Rebuilds a minimal directory from `N G obj` headers found by
    /// scanning the whole input (§4.3 step 5, "tail salvage"). Headers
    /// found later in the file win, matching the spec's "later xref
    /// sections override earlier ones" invariant applied to an
    /// append-only incrementally-updated file.
    pub fn from_salvaged_headers(headers: impl IntoIterator<Item = (ObjectId, u32)>) -> Self {
        let mut xref = Xref::default();
        for ((number, generation), offset) in headers {
            xref.insert(number, XrefEntry::Normal { offset, generation });
            if number + 1 > xref.size {
                xref.size = number + 1;
            }
        }
        xref
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_entries_win_on_merge() {
        let mut newer = Xref::new(3);
        newer.insert(1, XrefEntry::Normal { offset: 100, generation: 0 });

        let mut older = Xref::new(3);
        older.insert(1, XrefEntry::Normal { offset: 9, generation: 0 });
        older.insert(2, XrefEntry::Normal { offset: 50, generation: 0 });

        newer.merge(older);

        assert_eq!(newer.get(1), Some(&XrefEntry::Normal { offset: 100, generation: 0 }));
        assert_eq!(newer.get(2), Some(&XrefEntry::Normal { offset: 50, generation: 0 }));
    }

    #[test]
    fn salvage_orders_by_object_number() {
        let xref = Xref::from_salvaged_headers([((2, 0), 200), ((1, 0), 100)]);
        assert_eq!(xref.get(1), Some(&XrefEntry::Normal { offset: 100, generation: 0 }));
        assert_eq!(xref.get(2), Some(&XrefEntry::Normal { offset: 200, generation: 0 }));
        assert_eq!(xref.size, 3);
    }
}
