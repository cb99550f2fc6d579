// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All times are GPS seconds and *must* be double precision.
 */

/// The amount of data at the start of each analysis chunk that is lost to the
/// whitening filter transient [seconds]. Adjacent chunks are overlapped by
/// this much, and chunks shorter than this are not analysed.
// TODO: This should depend on the channel's sample rate; lower-rate channels
// can lose much more than 120 seconds.
pub const WHITEN_TIME: f64 = 120.0;

/// Segments longer than this are split into multiple processing jobs by
/// default [seconds].
pub const DEFAULT_SUBDIVISION_INTERVAL: f64 = 4.0 * 3600.0;

/// `gstlal_excesspower` writes its triggers into directories named after the
/// first 5 digits of the GPS time, i.e. each directory spans this many
/// seconds.
pub const GPS_GROUP_WIDTH: f64 = 1e5;

/// Channels sampled faster than this get more CPUs and memory [Hz].
pub const HIGH_SAMPLE_RATE_THRESHOLD: u32 = 2048;

/// The memory to request for jobs on low-rate channels [MB].
pub const DEFAULT_MEMORY_MB: u32 = 1024;

/// The memory to request for jobs on high-rate channels, and for clustering
/// jobs [MB].
pub const HIGH_MEMORY_MB: u32 = 2048;

/// The default data-quality state-vector bits that must be on.
pub const DEFAULT_ON_BITS: u32 = 0x1;

/// The default data-quality state-vector bits that must be off.
pub const DEFAULT_OFF_BITS: u32 = 0x0;

/// The processing executable.
pub const EXCESSPOWER_EXE: &str = "gstlal_excesspower";

/// The clustering executable.
pub const BUCLUSTER_EXE: &str = "ligolw_bucluster";

/// The default pre-script which assembles a cache of trigger files for a
/// clustering job.
pub const DEFAULT_PRE_SCRIPT: &str = "find_trig_files.sh";

/// Where the HTCondor command-line tools live by default.
pub const DEFAULT_CONDOR_BIN_DIR: &str = "/usr/bin";

/// The name of the file containing the HTCondor cluster ID of a submitted job.
pub const CONDOR_PID_FILE: &str = "condor.pid";
