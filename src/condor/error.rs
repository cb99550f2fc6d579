// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

use crate::job::JobError;

#[derive(Error, Debug)]
pub enum CondorError {
    #[error("Couldn't run {program}: {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("There's no {path}; was the job submitted?")]
    NoPidFile { path: PathBuf },

    #[error("{path} doesn't contain a cluster ID; it contains '{contents}'")]
    BadPidFile { path: PathBuf, contents: String },

    #[error("Couldn't understand the output of condor_q: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
