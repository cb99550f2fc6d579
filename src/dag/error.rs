// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

use crate::job::JobError;

#[derive(Error, Debug)]
pub enum DagError {
    #[error("Can't add node '{node}': its parent '{parent}' isn't in the DAG yet")]
    UnknownParent { node: String, parent: String },

    #[error("The DAG already has a node called '{0}'")]
    DuplicateNode(String),

    #[error("The DAG has no file name set")]
    NoDagFile,

    #[error("Couldn't write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Job(#[from] JobError),
}
