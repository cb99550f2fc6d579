// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Build and manage HTCondor DAGs for `gstlal_excesspower` burst searches.

Long GPS segments are subdivided into overlapping analysis chunks, each chunk
becomes a processing job, and the triggers are clustered per GPS directory.
 */

pub mod channel;
mod cli;
pub mod condor;
pub mod config;
pub mod constants;
pub mod dag;
pub mod job;
pub(crate) mod misc;
pub mod offline;
mod params;
pub mod segments;

// Re-exports.
pub use channel::ChannelName;
pub use cli::{EpDag, EpDagError};
pub use dag::{Dag, DagNode};
pub use job::{Job, JobKind, SubmitConfig, SubmitConfigBuilder};
pub use offline::{write_offline_dag, OfflineDagOptions};
pub use segments::{shift_to_overlap, subdivide, Segment, SegmentList};
