//! Sorted, duplicate-free document-id sequences and the merge algorithms over them.
//!
//! Every index in this crate stores its document sets as a [`PostingList`].
//! The invariant (strictly increasing ids) is upheld by every constructor and
//! operation, so the merge routines can rely on it without re-checking.

use crate::DocId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PostingList {
    ids: Vec<DocId>,
}

impl PostingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// The dense range `0..num_docs`, used as the universe for NOT.
    pub fn universe(num_docs: u32) -> Self {
        Self { ids: (0..num_docs).collect() }
    }

    /// Accepts ids that are already strictly increasing, returning them back otherwise.
    pub fn from_sorted(ids: Vec<DocId>) -> std::result::Result<Self, Vec<DocId>> {
        if ids.windows(2).all(|w| w[0] < w[1]) {
            Ok(Self { ids })
        } else {
            Err(ids)
        }
    }

    /// Inserts an id, keeping the list sorted. Returns false if it was already present.
    pub fn insert(&mut self, doc_id: DocId) -> bool {
        // builders feed ids in increasing order, so the append path is the common one
        match self.ids.last() {
            None => {
                self.ids.push(doc_id);
                true
            }
            Some(&last) if last < doc_id => {
                self.ids.push(doc_id);
                true
            }
            Some(&last) if last == doc_id => false,
            Some(_) => match self.ids.binary_search(&doc_id) {
                Ok(_) => false,
                Err(pos) => {
                    self.ids.insert(pos, doc_id);
                    true
                }
            },
        }
    }

    pub fn contains(&self, doc_id: DocId) -> bool {
        self.ids.binary_search(&doc_id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = DocId> + '_ {
        self.ids.iter().copied()
    }

    pub fn as_slice(&self) -> &[DocId] {
        &self.ids
    }

    pub fn into_vec(self) -> Vec<DocId> {
        self.ids
    }

    /// Two-cursor merge intersection, O(|a| + |b|).
    pub fn intersect(&self, other: &PostingList) -> PostingList {
        let (a, b) = (&self.ids, &other.ids);
        let mut out = Vec::with_capacity(a.len().min(b.len()));
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
            }
        }
        PostingList { ids: out }
    }

    /// Intersection by exponential search of the longer list for each id of the shorter one.
    ///
    /// Produces the same result as [`PostingList::intersect`]; it wins when one
    /// list is much shorter than the other.
    pub fn intersect_galloping(&self, other: &PostingList) -> PostingList {
        let (short, long) = if self.len() <= other.len() {
            (&self.ids, &other.ids)
        } else {
            (&other.ids, &self.ids)
        };
        let mut out = Vec::with_capacity(short.len());
        let mut base = 0;
        for &id in short {
            if base >= long.len() {
                break;
            }
            let mut step = 1;
            let mut hi = base;
            while hi < long.len() && long[hi] < id {
                base = hi;
                hi = base + step;
                step *= 2;
            }
            let hi = hi.min(long.len() - 1);
            match long[base..=hi].binary_search(&id) {
                Ok(pos) => {
                    out.push(id);
                    base += pos + 1;
                }
                Err(pos) => base += pos,
            }
        }
        PostingList { ids: out }
    }

    /// Two-cursor merge union; every id is emitted once.
    pub fn union(&self, other: &PostingList) -> PostingList {
        let (a, b) = (&self.ids, &other.ids);
        let mut out = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    out.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    out.push(b[j]);
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&a[i..]);
        out.extend_from_slice(&b[j..]);
        PostingList { ids: out }
    }

    /// Ids of `self` that are not in `other`.
    pub fn difference(&self, other: &PostingList) -> PostingList {
        let (a, b) = (&self.ids, &other.ids);
        let mut out = Vec::with_capacity(a.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() {
            if j >= b.len() {
                out.extend_from_slice(&a[i..]);
                break;
            }
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    out.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => j += 1,
            }
        }
        PostingList { ids: out }
    }
}

impl<'de> Deserialize<'de> for PostingList {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let ids = Vec::<DocId>::deserialize(deserializer)?;
        PostingList::from_sorted(ids)
            .map_err(|_| serde::de::Error::custom("posting list is not strictly increasing"))
    }
}

impl FromIterator<DocId> for PostingList {
    fn from_iter<I: IntoIterator<Item = DocId>>(iter: I) -> Self {
        let mut ids: Vec<DocId> = iter.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        PostingList { ids }
    }
}

impl<'a> IntoIterator for &'a PostingList {
    type Item = &'a DocId;
    type IntoIter = std::slice::Iter<'a, DocId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}
