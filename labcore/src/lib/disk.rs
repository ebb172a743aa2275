use std::ops::Range;

use crate::utils::*;

/// A run of consecutive disk blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extent {
    pub start:  usize,
    pub length: usize,
}

impl Extent {
    /// One past the last block. Only meaningful for extents that fit
    /// on a disk, which is all a [`Disk`] ever hands out.
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    #[inline]
    pub fn blocks(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// An indexed file: one block holds pointers to all the others.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedFile {
    pub index_block:    usize,
    pub data_blocks:    Vec<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexedOutcome {
    Allocated(IndexedFile),
    /// Fewer free blocks than `needed` (data plus one index block).
    Unallocated { free: usize, needed: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContiguousOutcome {
    Allocated(Extent),
    /// The requested range runs past the last block.
    OutOfBounds,
    /// Some block in the range is taken; this is the first one.
    Occupied { block: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileEntry {
    Contiguous(Extent),
    Indexed(IndexedFile),
}

/// A fixed-size disk: which blocks are taken, and which files
/// took them, in order of creation.
#[derive(Clone, Debug, Default)]
pub struct Disk {
    used:   Vec<bool>,
    files:  FastMap<String, FileEntry>,
}

impl Disk {
    /// An empty disk of `blocks` blocks.
    pub fn new(blocks: usize) -> Self {
        Self {
            used:   vec![false; blocks],
            files:  FastMap::default(),
        }
    }

    /// 0 is a free block, anything else is taken.
    pub fn from_occupancy(bits: &[u8]) -> Self {
        Self {
            used:   bits.iter().map(|b| *b != 0).collect(),
            files:  FastMap::default(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.used.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    #[inline]
    pub fn is_used(&self, block: usize) -> bool {
        self.used.get(block).copied().unwrap_or(false)
    }

    pub fn occupancy(&self) -> Vec<u8> {
        self.used.iter().map(|u| *u as u8).collect()
    }

    pub fn free_blocks(&self) -> impl Iterator<Item = usize> + '_ {
        self.used.iter()
            .positions(|u| !*u)
    }

    pub fn free_count(&self) -> usize {
        self.used.iter().filter(|u| !**u).count()
    }

    pub fn files(&self) -> &FastMap<String, FileEntry> {
        &self.files
    }

    /// Marks a block as taken without any file owning it. Returns
    /// `false` if the block was already taken or doesn't exist.
    pub fn occupy(&mut self, block: usize) -> bool {
        match self.used.get_mut(block) {
            Some(u) if !*u  => {
                *u = true;
                true
            },
            _               => false,
        }
    }

    /// Runs [`allocate_indexed`] and, on success, takes the blocks and
    /// books the file under `name`.
    pub fn create_indexed(&mut self, name: &str, size: Units) -> Result<IndexedOutcome> {
        let res = allocate_indexed(self, size)?;
        if let IndexedOutcome::Allocated(ref f) = res {
            self.used[f.index_block] = true;
            for b in &f.data_blocks {
                self.used[*b] = true;
            }
            debug!("Indexed file {name:?}: index {} data {:?}", f.index_block, f.data_blocks);
            self.files.insert(name.to_string(), FileEntry::Indexed(f.clone()));
        }

        Ok(res)
    }

    /// Sequential allocation: `length` blocks starting exactly at `start`.
    ///
    /// Reusing a name replaces the file table entry; the blocks of the
    /// older file stay taken.
    pub fn allocate_contiguous(
        &mut self,
        name:   &str,
        start:  usize,
        length: usize,
    ) -> Result<ContiguousOutcome> {
        if length == 0 {
            return Err(SimError::ZeroLength);
        }
        match start.checked_add(length) {
            Some(end) if end <= self.len()  => {},
            _                               => return Ok(ContiguousOutcome::OutOfBounds),
        }
        let ext = Extent { start, length };
        if let Some(block) = ext.blocks().find(|b| self.used[*b]) {
            return Ok(ContiguousOutcome::Occupied { block });
        }
        for b in ext.blocks() {
            self.used[b] = true;
        }
        debug!("Sequential file {name:?}: blocks {}..{}", ext.start, ext.end());
        self.files.insert(name.to_string(), FileEntry::Contiguous(ext));

        Ok(ContiguousOutcome::Allocated(ext))
    }
}

/// Indexed allocation of a `size`-block file. Needs `size + 1` free
/// blocks: the lowest free one becomes the index block, the next
/// `size` free ones (ascending) become data blocks.
///
/// Nothing is marked; see [`Disk::create_indexed`] for that.
pub fn allocate_indexed(disk: &Disk, size: Units) -> Result<IndexedOutcome> {
    if size == 0 {
        return Err(SimError::ZeroLength);
    }
    // Saturating is enough: no disk has `usize::MAX` free blocks.
    let needed = size.saturating_add(1);
    let picked: Vec<usize> = disk.free_blocks()
        .take(needed)
        .collect();
    if picked.len() < needed {
        return Ok(IndexedOutcome::Unallocated {
            free: disk.free_count(),
            needed,
        });
    }

    Ok(IndexedOutcome::Allocated(IndexedFile {
        index_block: picked[0],
        data_blocks: picked[1..].to_vec(),
    }))
}
