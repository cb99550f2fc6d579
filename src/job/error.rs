// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Job {0} has already been finalized")]
    AlreadyFinalized(String),

    #[error("Job {0} must be finalized first")]
    NotFinalized(String),

    #[error("Job {0} doesn't have a program configuration")]
    NoProgramConfig(String),

    #[error("Couldn't create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Couldn't write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
