// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use log::{debug, info};
use thiserror::Error;

use crate::{
    channel::ChannelName,
    cli::Warn,
    condor::{Condor, CondorError},
    config::ChannelSection,
    job::{working_dir, Job, JobError, SubmitConfig},
};

pub(crate) struct OnlineSetupParams {
    pub(crate) sections: Vec<ChannelSection>,
    pub(crate) root_dir: PathBuf,
    pub(crate) shm_partition: Option<String>,
    pub(crate) submit: SubmitConfig,

    /// If set, each job is submitted with this after it's set up.
    pub(crate) submit_with: Option<Condor>,
}

impl OnlineSetupParams {
    /// Set up (and maybe submit) an online job for each channel. The
    /// finalized jobs are returned.
    pub(crate) fn run(&self) -> Result<Vec<Job>, OnlineError> {
        let mut jobs = Vec::with_capacity(self.sections.len());
        for section in &self.sections {
            let mut job = Job::online(
                section,
                self.shm_partition.as_deref(),
                self.submit.clone(),
                &self.root_dir,
            )?;
            job.finalize()?;
            debug!("Set up {} in {}", job.name(), job.wd().display());

            if let Some(condor) = &self.submit_with {
                let outcome = condor.submit(&job)?;
                if !outcome.success() {
                    format!(
                        "{} wasn't submitted; condor_submit exited with code {}",
                        job.name(),
                        outcome.code
                    )
                    .warn();
                }
            }
            jobs.push(job);
        }
        info!("Set up {} online jobs", jobs.len());
        Ok(jobs)
    }
}

pub(crate) struct OnlineKillParams {
    pub(crate) root_dir: PathBuf,
    pub(crate) channels: Vec<ChannelName>,
    pub(crate) condor: Condor,
}

impl OnlineKillParams {
    /// Remove the online job of every channel. Channels without a recorded
    /// cluster are skipped with a warning. Returns how many removals worked.
    pub(crate) fn run(&self) -> Result<usize, OnlineError> {
        let mut num_removed = 0;
        for channel in &self.channels {
            let wd = working_dir(&self.root_dir, channel);
            let outcome = match self.condor.remove(&wd, None) {
                Ok(o) => o,
                Err(CondorError::NoPidFile { path }) => {
                    format!(
                        "The online job for {channel} wasn't removed; there's no {}",
                        path.display()
                    )
                    .warn();
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if outcome.success() {
                num_removed += 1;
            } else {
                format!(
                    "The online job for {channel} wasn't removed; condor_rm exited with code {}",
                    outcome.code
                )
                .warn();
            }
        }
        Ok(num_removed)
    }
}

#[derive(Error, Debug)]
pub(crate) enum OnlineError {
    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Condor(#[from] CondorError),
}
