//! Ordered sets of small non-negative indices over packed bit-words.
//!
//! Role sets, key-switching digits and table entries all index into the
//! prime chain through this type. Cardinalities stay small (tens of
//! indices), so a flat word vector beats any tree structure and makes
//! the set-difference cardinality used on the query hot path a handful
//! of popcounts.

use std::cmp::Ordering;
use std::fmt;
use std::io::{Read, Write};
use std::ops::{BitAnd, BitOr, Sub};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use itertools::Itertools;

use crate::error::{Error, Result};
use crate::serialization::{AsciiReader, ReaderFrom, WriterTo};

const WORD_BITS: usize = u64::BITS as usize;

/// An ordered set of small non-negative integer indices.
///
/// Invariant: the trailing word, if any, is non-zero, so equal sets have
/// equal word vectors.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct IndexSet {
    words: Vec<u64>,
}

impl IndexSet {
    /// The empty set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of elements.
    pub fn card(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn contains(&self, i: usize) -> bool {
        let (w, b) = (i / WORD_BITS, i % WORD_BITS);
        w < self.words.len() && self.words[w] & (1 << b) != 0
    }

    /// Inserts `i`; returns whether it was newly added.
    pub fn insert(&mut self, i: usize) -> bool {
        let (w, b) = (i / WORD_BITS, i % WORD_BITS);
        if w >= self.words.len() {
            self.words.resize(w + 1, 0);
        }
        let newly = self.words[w] & (1 << b) == 0;
        self.words[w] |= 1 << b;
        newly
    }

    /// Removes `i`; returns whether it was present.
    pub fn remove(&mut self, i: usize) -> bool {
        let (w, b) = (i / WORD_BITS, i % WORD_BITS);
        if w >= self.words.len() || self.words[w] & (1 << b) == 0 {
            return false;
        }
        self.words[w] &= !(1 << b);
        self.trim();
        true
    }

    /// Smallest element, if any.
    pub fn first(&self) -> Option<usize> {
        self.words
            .iter()
            .position(|&w| w != 0)
            .map(|i| i * WORD_BITS + self.words[i].trailing_zeros() as usize)
    }

    /// Largest element, if any.
    pub fn last(&self) -> Option<usize> {
        self.words
            .last()
            .map(|w| (self.words.len() - 1) * WORD_BITS + (WORD_BITS - 1 - w.leading_zeros() as usize))
    }

    /// Smallest element strictly greater than `i`, if any.
    pub fn next(&self, i: usize) -> Option<usize> {
        let start = i + 1;
        let (mut w, b) = (start / WORD_BITS, start % WORD_BITS);
        if w >= self.words.len() {
            return None;
        }
        let masked = self.words[w] & (!0u64 << b);
        if masked != 0 {
            return Some(w * WORD_BITS + masked.trailing_zeros() as usize);
        }
        w += 1;
        while w < self.words.len() {
            if self.words[w] != 0 {
                return Some(w * WORD_BITS + self.words[w].trailing_zeros() as usize);
            }
            w += 1;
        }
        None
    }

    /// Ascending iterator over the elements.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            words: &self.words,
            word_idx: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }

    /// In-place union; inserts every element of `other`.
    pub fn union_with(&mut self, other: &IndexSet) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (w, o) in self.words.iter_mut().zip(&other.words) {
            *w |= o;
        }
    }

    pub fn union(&self, other: &IndexSet) -> IndexSet {
        let mut out = self.clone();
        out.union_with(other);
        out
    }

    pub fn intersection(&self, other: &IndexSet) -> IndexSet {
        let words = self
            .words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| a & b)
            .collect();
        let mut out = IndexSet { words };
        out.trim();
        out
    }

    /// Elements of `self` not in `other`.
    pub fn difference(&self, other: &IndexSet) -> IndexSet {
        let words = self
            .words
            .iter()
            .enumerate()
            .map(|(i, a)| a & !other.words.get(i).copied().unwrap_or(0))
            .collect();
        let mut out = IndexSet { words };
        out.trim();
        out
    }

    /// `|self \ other|` without allocating.
    #[inline]
    pub fn diff_card(&self, other: &IndexSet) -> usize {
        self.words
            .iter()
            .enumerate()
            .map(|(i, a)| (a & !other.words.get(i).copied().unwrap_or(0)).count_ones() as usize)
            .sum()
    }

    pub fn is_disjoint(&self, other: &IndexSet) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .all(|(a, b)| a & b == 0)
    }

    /// Whether every element of `other` is in `self`.
    pub fn contains_set(&self, other: &IndexSet) -> bool {
        other.diff_card(self) == 0
    }

    fn trim(&mut self) {
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }

    pub(crate) fn read_ascii_from<R: Read>(r: &mut AsciiReader<'_, R>) -> Result<Self> {
        r.seek_past_char(b'[')?;
        let mut set = IndexSet::new();
        while !r.peek_is(b']')? {
            let i: usize = r.parse()?;
            if !set.insert(i) {
                return Err(Error::MalformedStream(format!(
                    "duplicate index {i} in set"
                )));
            }
        }
        r.seek_past_char(b']')?;
        Ok(set)
    }

    /// Parses the bracketed ASCII form written by `Display`.
    pub fn read_ascii<R: Read>(reader: &mut R) -> Result<Self> {
        Self::read_ascii_from(&mut AsciiReader::new(reader))
    }
}

pub struct Iter<'a> {
    words: &'a [u64],
    word_idx: usize,
    current: u64,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.current == 0 {
            self.word_idx += 1;
            if self.word_idx >= self.words.len() {
                return None;
            }
            self.current = self.words[self.word_idx];
        }
        let bit = self.current.trailing_zeros() as usize;
        self.current &= self.current - 1;
        Some(self.word_idx * WORD_BITS + bit)
    }
}

impl<'a> IntoIterator for &'a IndexSet {
    type Item = usize;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl FromIterator<usize> for IndexSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = IndexSet::new();
        for i in iter {
            set.insert(i);
        }
        set
    }
}

impl Extend<usize> for IndexSet {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for i in iter {
            self.insert(i);
        }
    }
}

impl BitOr for &IndexSet {
    type Output = IndexSet;

    fn bitor(self, rhs: &IndexSet) -> IndexSet {
        self.union(rhs)
    }
}

impl BitAnd for &IndexSet {
    type Output = IndexSet;

    fn bitand(self, rhs: &IndexSet) -> IndexSet {
        self.intersection(rhs)
    }
}

impl Sub for &IndexSet {
    type Output = IndexSet;

    fn sub(self, rhs: &IndexSet) -> IndexSet {
        self.difference(rhs)
    }
}

/// Lexicographic order on the ascending element sequence, so
/// `{} < {0} < {0,1} < {1}`. Used as the tie-break when sorting table
/// entries of equal size.
impl Ord for IndexSet {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl PartialOrd for IndexSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for IndexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.iter().format(" "))
    }
}

impl fmt::Debug for IndexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Binary form: u64 cardinality, then the elements as u64 values in
/// ascending order, all little-endian.
impl WriterTo for IndexSet {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u64::<LittleEndian>(self.card() as u64)?;
        for i in self.iter() {
            writer.write_u64::<LittleEndian>(i as u64)?;
        }
        Ok(())
    }
}

impl ReaderFrom for IndexSet {
    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let n = reader.read_u64::<LittleEndian>()?;
        let mut set = IndexSet::new();
        let mut prev: Option<u64> = None;
        for _ in 0..n {
            let i = reader.read_u64::<LittleEndian>()?;
            if prev.is_some_and(|p| p >= i) {
                return Err(Error::MalformedStream(format!(
                    "set elements not strictly ascending at {i}"
                )));
            }
            prev = Some(i);
            set.insert(i as usize);
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_iterate_remove() {
        let mut s = IndexSet::new();
        assert!(s.is_empty());
        assert!(s.insert(5));
        assert!(s.insert(0));
        assert!(s.insert(130));
        assert!(!s.insert(5));
        assert_eq!(s.card(), 3);
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![0, 5, 130]);
        assert_eq!(s.first(), Some(0));
        assert_eq!(s.last(), Some(130));
        assert_eq!(s.next(0), Some(5));
        assert_eq!(s.next(5), Some(130));
        assert_eq!(s.next(130), None);
        assert!(s.remove(130));
        assert!(!s.remove(130));
        assert_eq!(s.last(), Some(5));
    }

    #[test]
    fn algebra() {
        let a: IndexSet = [0, 1, 2, 5].into_iter().collect();
        let b: IndexSet = [2, 5, 9].into_iter().collect();
        assert_eq!(a.union(&b), IndexSet::from_iter([0, 1, 2, 5, 9]));
        assert_eq!(a.intersection(&b), IndexSet::from_iter([2, 5]));
        assert_eq!(a.difference(&b), IndexSet::from_iter([0, 1]));
        // operator forms agree with the named methods
        assert_eq!(&a | &b, a.union(&b));
        assert_eq!(&a & &b, a.intersection(&b));
        assert_eq!(&a - &b, a.difference(&b));
        assert_eq!(a.diff_card(&b), 2);
        assert_eq!(b.diff_card(&a), 1);
        assert!(!a.is_disjoint(&b));
        assert!(a.is_disjoint(&IndexSet::from_iter([3, 4])));
        assert!(a.contains_set(&IndexSet::from_iter([1, 5])));
        assert!(!a.contains_set(&b));
    }

    #[test]
    fn difference_trims_trailing_words() {
        let a: IndexSet = [1, 200].into_iter().collect();
        let b: IndexSet = [200].into_iter().collect();
        let d = a.difference(&b);
        assert_eq!(d, IndexSet::from_iter([1]));
        // canonical representation: equal sets hash and compare equal
        assert_eq!(d.last(), Some(1));
    }

    #[test]
    fn lexicographic_order() {
        let empty = IndexSet::new();
        let s0: IndexSet = [0].into_iter().collect();
        let s01: IndexSet = [0, 1].into_iter().collect();
        let s1: IndexSet = [1].into_iter().collect();
        assert!(empty < s0);
        assert!(s0 < s01);
        assert!(s01 < s1);
    }

    #[test]
    fn display_and_ascii_round_trip() {
        let s: IndexSet = [0, 3, 7].into_iter().collect();
        let text = s.to_string();
        assert_eq!(text, "[0 3 7]");
        let parsed = IndexSet::read_ascii(&mut text.as_bytes()).unwrap();
        assert_eq!(parsed, s);
        let empty = IndexSet::read_ascii(&mut "[]".as_bytes()).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn binary_round_trip() {
        let s: IndexSet = [2, 64, 65, 1000].into_iter().collect();
        let mut buf = Vec::new();
        s.write_to(&mut buf).unwrap();
        let back = IndexSet::read_from(&mut buf.as_slice()).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn binary_rejects_unsorted_payload() {
        let mut buf = Vec::new();
        IndexSet::from_iter([1, 2]).write_to(&mut buf).unwrap();
        // swap the two element records
        let tail = buf.split_off(8);
        let (a, b) = tail.split_at(8);
        let mut swapped = buf;
        swapped.extend_from_slice(b);
        swapped.extend_from_slice(a);
        assert!(matches!(
            IndexSet::read_from(&mut swapped.as_slice()),
            Err(Error::MalformedStream(_))
        ));
    }
}
