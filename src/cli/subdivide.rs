// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Print how a segment is split into analysis chunks.

use clap::Parser;
use log::{debug, info};

use crate::{
    constants::{DEFAULT_SUBDIVISION_INTERVAL, WHITEN_TIME},
    segments::{shift_to_overlap, subdivide, Segment, SegmentError, SegmentList},
    EpDagError,
};

lazy_static::lazy_static! {
    static ref INTERVAL_HELP: String =
        format!("The length of each chunk [seconds]. Default: {DEFAULT_SUBDIVISION_INTERVAL}");

    static ref MIN_LENGTH_HELP: String =
        format!("Left-over time no longer than this is merged into the last chunk [seconds]. Default: {WHITEN_TIME}");

    static ref OVERLAP_HELP: String =
        format!("Chunks after the first start this much earlier, so that they overlap [seconds]. Default: {WHITEN_TIME}");
}

#[derive(Parser, Debug, Clone, Default)]
pub(super) struct SubdivideArgs {
    /// The GPS start of the segment [seconds].
    #[clap(name = "GPS_START", allow_hyphen_values = true)]
    gps_start: f64,

    /// The GPS end of the segment [seconds].
    #[clap(name = "GPS_END", allow_hyphen_values = true)]
    gps_end: f64,

    #[clap(short, long, help = INTERVAL_HELP.as_str())]
    interval: Option<f64>,

    #[clap(short, long, help = MIN_LENGTH_HELP.as_str())]
    min_length: Option<f64>,

    #[clap(short, long, help = OVERLAP_HELP.as_str())]
    overlap: Option<f64>,

    /// Print the chunks as JSON rather than one per line.
    #[clap(long)]
    json: bool,
}

impl SubdivideArgs {
    fn parse(&self) -> Result<SegmentList, SubdivideArgsError> {
        let segment = Segment::new(self.gps_start, self.gps_end)?;
        let interval = self.interval.unwrap_or(DEFAULT_SUBDIVISION_INTERVAL);
        let min_length = self.min_length.unwrap_or(WHITEN_TIME);
        let overlap = self.overlap.unwrap_or(WHITEN_TIME);
        debug!("Subdividing {segment} into {interval}s chunks (min. {min_length}s, overlap {overlap}s)");

        let chunks = subdivide(segment, interval, min_length)?;
        Ok(shift_to_overlap(chunks, overlap, true))
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), EpDagError> {
        let chunks = self.parse()?;
        if dry_run {
            info!("Dry run -- {} chunks", chunks.len());
            return Ok(());
        }

        if self.json {
            let s = serde_json::to_string(&chunks)
                .map_err(|e| EpDagError::Generic(e.to_string()))?;
            println!("{s}");
        } else {
            for chunk in &chunks {
                println!("{} {}", chunk.start(), chunk.end());
            }
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub(super) enum SubdivideArgsError {
    #[error(transparent)]
    Segment(#[from] SegmentError),
}
