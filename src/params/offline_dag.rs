// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use log::info;
use thiserror::Error;

use crate::{
    cli::Warn,
    condor::{Condor, CondorError},
    dag::DagError,
    offline::{write_offline_dag, OfflineDagError, OfflineDagOptions},
    segments::Segment,
};

pub(crate) struct OfflineDagParams {
    pub(crate) segment: Segment,
    pub(crate) options: OfflineDagOptions,

    /// Where to write the top-level DAG. If `None`, it goes in the root
    /// directory.
    pub(crate) dag_file: Option<PathBuf>,

    /// If set, the top-level DAG is submitted with this.
    pub(crate) submit_with: Option<Condor>,
}

impl OfflineDagParams {
    /// Build and write all the DAGs. Returns the path of the top-level DAG.
    pub(crate) fn run(&self) -> Result<PathBuf, DagRunError> {
        let mut dag = write_offline_dag(self.segment, &self.options)?;
        if let Some(dag_file) = &self.dag_file {
            dag.set_dag_file(dag_file);
        }
        let dag_file = dag.write_dag()?;
        info!("Wrote {} ({} nodes)", dag_file.display(), dag.len());

        if let Some(condor) = &self.submit_with {
            let outcome = condor.submit_dag(&dag_file)?;
            if !outcome.success() {
                format!(
                    "{} wasn't submitted; condor_submit_dag exited with code {}",
                    dag_file.display(),
                    outcome.code
                )
                .warn();
            }
        }
        Ok(dag_file)
    }
}

#[derive(Error, Debug)]
pub(crate) enum DagRunError {
    #[error(transparent)]
    OfflineDag(#[from] OfflineDagError),

    #[error(transparent)]
    Dag(#[from] DagError),

    #[error(transparent)]
    Condor(#[from] CondorError),
}
