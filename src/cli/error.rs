// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all epdag-related errors. This should be the *only* error
//! enum that is publicly visible.

use thiserror::Error;

use super::{
    common::SubmitArgsError, offline_dag::OfflineDagArgsError, online::OnlineArgsError,
    subdivide::SubdivideArgsError,
};
use crate::{
    channel::ChannelNameError,
    condor::CondorError,
    config::ConfigError,
    dag::DagError,
    job::JobError,
    offline::OfflineDagError,
    params::{DagRunError, OnlineError},
    segments::SegmentError,
};

const CHANNEL_CONFIG_HELP: &str = "A channel configuration has one section per channel, e.g.

    [H1:PEM-EY_MAG_EBAY_SEIRACK_X_DQ]
    configuration_file = /path/to/gstlal_excesspower_h1_pem_256.ini
    sample_rate = 256

Optional keys are downsample_rate, dq_channel (or odc_channel), on_bits and off_bits.";

/// The *only* publicly visible error from epdag.
#[derive(Error, Debug)]
pub enum EpDagError {
    /// An error related to channel configurations or program configurations.
    #[error("{0}\n\n{CHANNEL_CONFIG_HELP}")]
    ChannelConfig(String),

    /// An error related to GPS segments.
    #[error("{0}\n\nSegments are given as GPS start and end times in seconds, e.g. --gps-start 1000000000 --gps-end 1000086400")]
    Segment(String),

    /// An error related to HTCondor jobs or DAGs.
    #[error("{0}")]
    Dag(String),

    /// An error from HTCondor or its tools.
    #[error("{0}\n\nIs HTCondor installed? The directory containing its tools can be set with --condor-bin-dir")]
    Condor(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files are TOML or JSON with the same names as the long command-line options, using underscores, e.g. channel_config = \"channels.ini\"")]
    ArgFile(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

// Binary sub-command errors.

impl From<OfflineDagArgsError> for EpDagError {
    fn from(e: OfflineDagArgsError) -> Self {
        let s = e.to_string();
        match e {
            OfflineDagArgsError::NoChannelConfig | OfflineDagArgsError::NoCache => {
                Self::Generic(s)
            }
            OfflineDagArgsError::NoGpsStart
            | OfflineDagArgsError::NoGpsEnd
            | OfflineDagArgsError::BadSubdivisionInterval(_) => Self::Segment(s),
            OfflineDagArgsError::Segment(e) => Self::from(e),
            OfflineDagArgsError::Submit(e) => Self::from(e),
        }
    }
}

impl From<OnlineArgsError> for EpDagError {
    fn from(e: OnlineArgsError) -> Self {
        let s = e.to_string();
        match e {
            OnlineArgsError::NoChannelConfig => Self::Generic(s),
            OnlineArgsError::UnknownChannel(_) => Self::ChannelConfig(s),
            OnlineArgsError::Config(e) => Self::from(e),
            OnlineArgsError::ChannelName(e) => Self::from(e),
            OnlineArgsError::Submit(e) => Self::from(e),
        }
    }
}

impl From<SubdivideArgsError> for EpDagError {
    fn from(e: SubdivideArgsError) -> Self {
        match e {
            SubdivideArgsError::Segment(e) => Self::from(e),
        }
    }
}

impl From<SubmitArgsError> for EpDagError {
    fn from(e: SubmitArgsError) -> Self {
        let s = e.to_string();
        match e {
            SubmitArgsError::BadSubmitCommand(_) => Self::Condor(s),
        }
    }
}

impl From<DagRunError> for EpDagError {
    fn from(e: DagRunError) -> Self {
        match e {
            DagRunError::OfflineDag(e) => Self::from(e),
            DagRunError::Dag(e) => Self::from(e),
            DagRunError::Condor(e) => Self::from(e),
        }
    }
}

impl From<OnlineError> for EpDagError {
    fn from(e: OnlineError) -> Self {
        match e {
            OnlineError::Job(e) => Self::from(e),
            OnlineError::Condor(e) => Self::from(e),
        }
    }
}

// Library code errors.

impl From<OfflineDagError> for EpDagError {
    fn from(e: OfflineDagError) -> Self {
        let s = e.to_string();
        match e {
            OfflineDagError::Config(e) => Self::from(e),
            OfflineDagError::Segment(e) => Self::from(e),
            OfflineDagError::Job(e) => Self::from(e),
            OfflineDagError::Dag(e) => Self::from(e),
            OfflineDagError::CreateDir { .. } | OfflineDagError::IO(_) => Self::Generic(s),
        }
    }
}

impl From<ConfigError> for EpDagError {
    fn from(e: ConfigError) -> Self {
        let s = e.to_string();
        match e {
            ConfigError::Write { .. } | ConfigError::IO(_) => Self::Generic(s),
            ConfigError::Read { .. }
            | ConfigError::Parse { .. }
            | ConfigError::MissingSection(_)
            | ConfigError::MissingKey { .. }
            | ConfigError::BadValue { .. }
            | ConfigError::MissingAttribute { .. }
            | ConfigError::BadChannelListLine { .. }
            | ConfigError::ChannelName(_) => Self::ChannelConfig(s),
        }
    }
}

impl From<ChannelNameError> for EpDagError {
    fn from(e: ChannelNameError) -> Self {
        Self::ChannelConfig(e.to_string())
    }
}

impl From<SegmentError> for EpDagError {
    fn from(e: SegmentError) -> Self {
        Self::Segment(e.to_string())
    }
}

impl From<JobError> for EpDagError {
    fn from(e: JobError) -> Self {
        let s = e.to_string();
        match e {
            JobError::Config(e) => Self::from(e),
            JobError::AlreadyFinalized(_)
            | JobError::NotFinalized(_)
            | JobError::NoProgramConfig(_) => Self::Dag(s),
            JobError::CreateDir { .. } | JobError::Write { .. } | JobError::IO(_) => {
                Self::Generic(s)
            }
        }
    }
}

impl From<DagError> for EpDagError {
    fn from(e: DagError) -> Self {
        let s = e.to_string();
        match e {
            DagError::Job(e) => Self::from(e),
            DagError::UnknownParent { .. } | DagError::DuplicateNode(_) | DagError::NoDagFile => {
                Self::Dag(s)
            }
            DagError::Write { .. } => Self::Generic(s),
        }
    }
}

impl From<CondorError> for EpDagError {
    fn from(e: CondorError) -> Self {
        let s = e.to_string();
        match e {
            CondorError::Job(e) => Self::from(e),
            CondorError::Spawn { .. }
            | CondorError::NoPidFile { .. }
            | CondorError::BadPidFile { .. }
            | CondorError::Json(_) => Self::Condor(s),
            CondorError::IO(_) => Self::Generic(s),
        }
    }
}

impl From<std::io::Error> for EpDagError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<toml::ser::Error> for EpDagError {
    fn from(e: toml::ser::Error) -> Self {
        Self::ArgFile(e.to_string())
    }
}
