// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

use crate::{config::ConfigError, dag::DagError, job::JobError, segments::SegmentError};

#[derive(Error, Debug)]
pub enum OfflineDagError {
    #[error("Couldn't create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Dag(#[from] DagError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
