//! Pre-computed table of prime-subset log-sizes and the size-window
//! selection queries over it.
//!
//! The table enumerates every combination of a small-prime subset with a
//! prefix interval of the ctxt primes (in registration order), one entry
//! per combination, sorted by log-size. Queries walk the sorted sequence
//! to find an in-window subset dropping the fewest primes from one or
//! two reference sets.

use std::f64::consts::LN_2;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use itertools::Itertools;

use crate::error::{Error, Result};
use crate::index_set::IndexSet;
use crate::modulus::Cmodulus;
use crate::serialization::{AsciiReader, ReaderFrom, WriterTo};

/// One table row: the natural log of the subset product, and the subset.
#[derive(Clone, Debug, PartialEq)]
pub struct SizeEntry {
    pub size: f64,
    pub set: IndexSet,
}

/// The sorted enumeration of
/// `P(small_primes) x {prefix intervals of ctxt_primes}`.
///
/// Immutable once built; fully regenerable from the chain and the two
/// role sets, so serialization is a convenience, not a requirement.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModuliSizes {
    sizes: Vec<SizeEntry>,
}

impl ModuliSizes {
    /// Builds the table from the finished chain. Cardinality is
    /// `2^|small_primes| * (|ctxt_primes| + 1)`, which stays in the low
    /// thousands for resolution-bounded small-prime families.
    pub fn new(chain: &[Cmodulus], ctxt_primes: &IndexSet, small_primes: &IndexSet) -> Self {
        let n = (1usize << small_primes.card()) * (ctxt_primes.card() + 1);
        let mut sizes: Vec<SizeEntry> = Vec::with_capacity(n);
        sizes.push(SizeEntry {
            size: 0.0,
            set: IndexSet::new(),
        });

        // all subsets of the small primes, by doubling
        for i in small_primes.iter() {
            let log_qi = chain[i].log_q();
            let idx = sizes.len();
            for j in 0..idx {
                let mut entry = sizes[j].clone();
                entry.size += log_qi;
                entry.set.insert(i);
                sizes.push(entry);
            }
        }

        // one copy of the block above per prefix interval of the ctxt
        // primes
        let block = sizes.len();
        let mut interval = IndexSet::new();
        let mut interval_size: f64 = 0.0;
        for i in ctxt_primes.iter() {
            interval.insert(i);
            interval_size += chain[i].log_q();
            for j in 0..block {
                let mut entry = sizes[j].clone();
                entry.size += interval_size;
                entry.set.union_with(&interval);
                sizes.push(entry);
            }
        }

        sizes.sort_by(|a, b| a.size.total_cmp(&b.size).then_with(|| a.set.cmp(&b.set)));
        debug_assert!(sizes.iter().tuple_windows().all(|(a, b)| a.size <= b.size));
        Self { sizes }
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn entries(&self) -> &[SizeEntry] {
        &self.sizes
    }

    /// Returns a prime subset whose log-size lies in `[low, high]`,
    /// dropping as few primes of `from` as possible.
    ///
    /// If no entry falls in the window, the fallback examines the entries
    /// within one bit (`ln 2`) of the nearest feasible size: below `low`
    /// when `reverse` is false, above `high` when it is true.
    pub fn set_for_size(
        &self,
        low: f64,
        high: f64,
        from: &IndexSet,
        reverse: bool,
    ) -> Result<IndexSet> {
        self.select(low, high, reverse, |set| from.diff_card(set))
    }

    /// Two-source variant: the cost of an entry is the total number of
    /// primes dropped from `from1` and `from2`.
    pub fn set_for_size2(
        &self,
        low: f64,
        high: f64,
        from1: &IndexSet,
        from2: &IndexSet,
        reverse: bool,
    ) -> Result<IndexSet> {
        self.select(low, high, reverse, |set| {
            from1.diff_card(set) + from2.diff_card(set)
        })
    }

    fn select(
        &self,
        low: f64,
        high: f64,
        reverse: bool,
        cost: impl Fn(&IndexSet) -> usize,
    ) -> Result<IndexSet> {
        let n = self.sizes.len();

        // first entry with size >= low
        let idx = self.sizes.partition_point(|e| e.size < low);

        let mut best: Option<usize> = None;
        let mut best_cost = usize::MAX;

        // in-window scan; the `<=` keeps the later (larger) entry among
        // equal costs
        let mut ii = idx;
        while ii < n && self.sizes[ii].size <= high {
            let c = cost(&self.sizes[ii].set);
            if c <= best_cost {
                best = Some(ii);
                best_cost = c;
            }
            ii += 1;
        }

        // nothing in the window: fall back to the entries within one bit
        // of the nearest size outside it; the `<` keeps the first
        // (closest) entry among equal costs
        if best.is_none() {
            if reverse {
                if ii < n {
                    let upper_bound = self.sizes[ii].size + LN_2;
                    let mut i = ii;
                    while i < n && self.sizes[i].size <= upper_bound {
                        let c = cost(&self.sizes[i].set);
                        if c < best_cost {
                            best = Some(i);
                            best_cost = c;
                        }
                        i += 1;
                    }
                }
            } else if idx > 0 {
                let lower_bound = self.sizes[idx - 1].size - LN_2;
                let mut i = idx;
                while i > 0 && self.sizes[i - 1].size >= lower_bound {
                    let c = cost(&self.sizes[i - 1].set);
                    if c < best_cost {
                        best = Some(i - 1);
                        best_cost = c;
                    }
                    i -= 1;
                }
            }
        }

        match best {
            Some(i) => Ok(self.sizes[i].set.clone()),
            None => Err(Error::NoFeasibleSet { low, high }),
        }
    }

    /// Writes the bracketed ASCII form:
    /// `[ n [size set] [size set] ... ]`.
    pub fn write_ascii<W: Write>(&self, writer: &mut W) -> Result<()> {
        write!(writer, "[{}", self.sizes.len())?;
        for entry in &self.sizes {
            write!(writer, " [{} {}]", entry.size, entry.set)?;
        }
        write!(writer, "]")?;
        Ok(())
    }

    /// Parses the form written by [`write_ascii`](Self::write_ascii),
    /// consuming exactly one framed table from the stream.
    pub fn read_ascii<R: Read>(reader: &mut R) -> Result<Self> {
        let mut r = AsciiReader::new(reader);
        r.seek_past_char(b'[')?;
        let n: usize = r.parse()?;
        let mut sizes = Vec::new();
        for _ in 0..n {
            r.seek_past_char(b'[')?;
            let size: f64 = r.parse()?;
            let set = IndexSet::read_ascii_from(&mut r)?;
            r.seek_past_char(b']')?;
            sizes.push(SizeEntry { size, set });
        }
        r.seek_past_char(b']')?;
        Ok(Self { sizes })
    }
}

/// Binary form: LE u64 entry count, then per entry a raw LE f64 size
/// followed by the set's binary form.
impl WriterTo for ModuliSizes {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u64::<LittleEndian>(self.sizes.len() as u64)?;
        for entry in &self.sizes {
            writer.write_f64::<LittleEndian>(entry.size)?;
            entry.set.write_to(writer)?;
        }
        Ok(())
    }
}

impl ReaderFrom for ModuliSizes {
    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let n = reader.read_u64::<LittleEndian>()?;
        let mut sizes = Vec::new();
        for _ in 0..n {
            let size = reader.read_f64::<LittleEndian>()?;
            let set = IndexSet::read_from(reader)?;
            sizes.push(SizeEntry { size, set });
        }
        if sizes
            .iter()
            .tuple_windows()
            .any(|(a, b)| a.size > b.size)
        {
            return Err(Error::MalformedStream(
                "table entries not sorted by size".into(),
            ));
        }
        Ok(Self { sizes })
    }
}
