// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! GPS time segments, and code to split them into analysis chunks.
//!
//! A long stretch of data is analysed by many jobs, each of which gets a
//! chunk of the stretch. `gstlal_excesspower` throws away the start of each
//! chunk because of the whitening filter's transient, so chunks are
//! overlapped to recover that data.


use std::{
    fmt::Display,
    ops::Deref,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A half-open interval of GPS time `[start, end)` [seconds].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    start: f64,
    end: f64,
}

impl Segment {
    /// Create a new segment. The start must not be after the end.
    pub fn new(start: f64, end: f64) -> Result<Segment, SegmentError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(SegmentError::NotFinite { start, end });
        }
        if start > end {
            return Err(SegmentError::StartAfterEnd { start, end });
        }
        Ok(Segment { start, end })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// The length of the segment [seconds].
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Do the two segments share any time? Segments that only touch at a
    /// boundary don't intersect.
    pub fn intersects(&self, other: &Segment) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// An ordered sequence of [`Segment`]s. Order is meaningful (chronological),
/// but segments are allowed to overlap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentList(Vec<Segment>);

impl SegmentList {
    pub fn new() -> SegmentList {
        SegmentList(vec![])
    }

    pub fn push(&mut self, seg: Segment) {
        self.0.push(seg);
    }

    /// The smallest segment covering every segment in the list, or `None` if
    /// the list is empty.
    pub fn extent(&self) -> Option<Segment> {
        let start = self.0.iter().map(|s| s.start).reduce(f64::min)?;
        let end = self.0.iter().map(|s| s.end).reduce(f64::max)?;
        Some(Segment { start, end })
    }

    /// Move the start of every segment (except the first, if `skip_first` is
    /// true) earlier by `shift` seconds. Ends are untouched, so adjacent
    /// segments then overlap by `shift`.
    ///
    /// Shifting a segment by more than the duration of its predecessor is not
    /// checked.
    pub fn shift_to_overlap(&mut self, shift: f64, skip_first: bool) -> &mut Self {
        for (i, seg) in self.0.iter_mut().enumerate() {
            if i == 0 && skip_first {
                continue;
            }
            seg.start -= shift;
        }
        self
    }

    pub fn into_vec(self) -> Vec<Segment> {
        self.0
    }
}

impl Deref for SegmentList {
    type Target = [Segment];

    fn deref(&self) -> &[Segment] {
        &self.0
    }
}

impl From<Vec<Segment>> for SegmentList {
    fn from(v: Vec<Segment>) -> Self {
        SegmentList(v)
    }
}

impl IntoIterator for SegmentList {
    type Item = Segment;
    type IntoIter = std::vec::IntoIter<Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a SegmentList {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Subdivide a segment into chunks of `length` seconds. If what's left over at
/// the end is no longer than `min_len`, it is merged with the last full chunk
/// and that span is split evenly into two chunks instead.
///
/// e.g. `[0, 10)` with length 3 and minimum length 2 gives `[0, 3)`, `[3, 6)`,
/// `[6, 8)`, `[8, 10)`.
///
/// A segment shorter than `min_len` can't be analysed at all and gives an
/// empty list. If `length` evenly divides the segment, no merging happens.
pub fn subdivide(seg: Segment, length: f64, min_len: f64) -> Result<SegmentList, SegmentError> {
    if !(length > 0.0) || !(min_len >= 0.0) || length < min_len {
        return Err(SegmentError::InvalidChunkLength { length, min_len });
    }

    let duration = seg.duration();
    if duration < min_len {
        return Ok(SegmentList::new());
    }
    if duration <= length {
        return Ok(SegmentList(vec![seg]));
    }

    let num_chunks = (duration / length).floor() as usize;
    let mut chunks: Vec<Segment> = (0..num_chunks)
        .map(|i| Segment {
            start: seg.start + length * i as f64,
            end: seg.start + length * (i + 1) as f64,
        })
        .collect();

    // Measure what's left from the chunks themselves; `duration % length`
    // can disagree with the floored division above.
    let last_end = seg.start + length * num_chunks as f64;
    let remainder = seg.end - last_end;
    if remainder <= 0.0 {
        // Nothing to merge. Pin the last boundary against float error.
        if let Some(last) = chunks.last_mut() {
            last.end = seg.end;
        }
    } else if remainder <= min_len {
        // There's at least one chunk, because duration > length.
        if let Some(last) = chunks.pop() {
            let split = seg.end - (seg.end - last.start) / 2.0;
            chunks.push(Segment {
                start: last.start,
                end: split,
            });
            chunks.push(Segment {
                start: split,
                end: seg.end,
            });
        }
    } else {
        chunks.push(Segment {
            start: last_end,
            end: seg.end,
        });
    }

    Ok(SegmentList(chunks))
}

/// Consume a list of chunks and overlap them; see
/// [`SegmentList::shift_to_overlap`].
pub fn shift_to_overlap(mut segl: SegmentList, shift: f64, skip_first: bool) -> SegmentList {
    segl.shift_to_overlap(shift, skip_first);
    segl
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentError {
    #[error("Segment start ({start}) is after its end ({end})")]
    StartAfterEnd { start: f64, end: f64 },

    #[error("Segment boundaries must be finite; got [{start}, {end})")]
    NotFinite { start: f64, end: f64 },

    #[error("Cannot subdivide with a chunk length of {length}s and a minimum length of {min_len}s; the chunk length must be positive and no smaller than the minimum length")]
    InvalidChunkLength { length: f64, min_len: f64 },
}
