// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Print the excess-power jobs in the HTCondor queue.

use std::path::{Path, PathBuf};

use clap::Parser;
use itertools::Itertools;
use log::info;

use super::common::InfoPrinter;
use crate::{
    condor::{Condor, JobAd},
    constants::{BUCLUSTER_EXE, EXCESSPOWER_EXE},
    EpDagError,
};

#[derive(Parser, Debug, Clone, Default)]
pub(super) struct StatusArgs {
    /// Only show the jobs of this user.
    #[clap(name = "USER")]
    user: Option<String>,

    /// Show every job in the queue, not just excess-power jobs.
    #[clap(long)]
    all: bool,

    /// The directory containing the HTCondor command-line tools.
    #[clap(long, help_heading = "HTCONDOR")]
    condor_bin_dir: Option<PathBuf>,
}

impl StatusArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), EpDagError> {
        let condor = self.condor_bin_dir.map(Condor::new).unwrap_or_default();
        if dry_run {
            info!(
                "Dry run -- would query {}",
                condor.bin_dir().join("condor_q").display()
            );
            return Ok(());
        }

        let ads = condor.query(self.user.as_deref())?;
        let lines = job_lines(&ads, self.all);
        if lines.is_empty() {
            info!("No jobs in the queue");
            return Ok(());
        }

        let mut printer = InfoPrinter::new(format!("{} jobs", lines.len()).into());
        printer.push_block(lines.into_iter().map(|l| l.into()).collect());
        printer.display();
        Ok(())
    }
}

fn is_excesspower(ad: &JobAd) -> bool {
    Path::new(&ad.cmd)
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n == EXCESSPOWER_EXE || n == BUCLUSTER_EXE)
        .unwrap_or(false)
}

/// One line per job, e.g.
/// `4321.0  Running  gstlal_excesspower  /home/detchar/online/H1/PEM/PEM-EY_MAG`.
fn job_lines(ads: &[JobAd], all: bool) -> Vec<String> {
    ads.iter()
        .filter(|ad| all || is_excesspower(ad))
        .sorted_by_key(|ad| (ad.cluster_id, ad.proc_id))
        .map(|ad| {
            let exe = Path::new(&ad.cmd)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| ad.cmd.clone());
            let iwd = ad
                .iwd
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            format!(
                "{}.{:<3} {:<20} {:<20} {}",
                ad.cluster_id,
                ad.proc_id,
                ad.state().to_string(),
                exe,
                iwd
            )
            .trim_end()
            .to_string()
        })
        .collect()
}
