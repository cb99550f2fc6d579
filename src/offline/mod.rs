// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Offline analysis DAGs.
//!
//! Every channel of a channel configuration gets a sub-DAG: one processing
//! node per analysis chunk of the requested segment, and one clustering node
//! per GPS directory of triggers. All nodes also go into a top-level DAG,
//! which is what is returned.

mod error;
#[cfg(test)]
mod tests;

pub use error::OfflineDagError;

use std::{
    fs,
    ops::Range,
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::{
    cli::{InfoPrinter, Warn},
    config::ChannelConfig,
    constants::*,
    dag::{Dag, DagNode},
    job::{FrameSource, Job, SubmitConfig, GPS_END_MACRO, GPS_START_MACRO, INPUT_CACHE_MACRO},
    misc::{absolute, gps_to_utc_string},
    segments::{shift_to_overlap, subdivide, Segment, SegmentList},
};

/// Everything needed to build an offline DAG, other than the segment to
/// analyse.
#[derive(Debug, Clone)]
pub struct OfflineDagOptions {
    /// The channel configuration file.
    pub channel_config: PathBuf,

    /// A cache file of the frames to analyse.
    pub cache: PathBuf,

    /// Segments longer than this are split into multiple jobs [seconds].
    pub subdivision_interval: f64,

    /// Where jobs, caches and DAG files go.
    pub root_dir: PathBuf,

    pub segments_file: Option<PathBuf>,
    pub segments_name: Option<String>,

    /// The script which finds the trigger files for each clustering node.
    pub pre_script: PathBuf,

    pub submit: SubmitConfig,

    /// Write a DAG file for each channel?
    pub write_subdags: bool,

    /// Write a shell script for each channel?
    pub write_scripts: bool,
}

impl OfflineDagOptions {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(channel_config: P, cache: Q) -> Self {
        OfflineDagOptions {
            channel_config: channel_config.into(),
            cache: cache.into(),
            subdivision_interval: DEFAULT_SUBDIVISION_INTERVAL,
            root_dir: PathBuf::from("."),
            segments_file: None,
            segments_name: None,
            pre_script: PathBuf::from(DEFAULT_PRE_SCRIPT),
            submit: SubmitConfig::builder().getenv(true).build(),
            write_subdags: true,
            write_scripts: false,
        }
    }
}

/// The GPS directory name for a directory index, e.g. 10000 for GPS times in
/// `[1000000000, 1000100000)`.
fn gps_dir_name(index: i64) -> String {
    format!("{index:05}")
}

/// The indices of the GPS directories touched by `seg`.
fn gps_dirs(seg: Segment) -> Range<i64> {
    let first = (seg.start() / GPS_GROUP_WIDTH).floor() as i64;
    let last = (seg.end() / GPS_GROUP_WIDTH).ceil() as i64;
    first..last.max(first + 1)
}

/// Build the DAG analysing `segment` for every channel of the channel
/// configuration. Files for jobs and sub-DAGs are written under the root
/// directory as the DAG is built. The returned DAG has a default file name
/// of `<root>/excesspower_<start>_<end>.dag`, but isn't written.
pub fn write_offline_dag(
    segment: Segment,
    opts: &OfflineDagOptions,
) -> Result<Dag, OfflineDagError> {
    let channel_config = ChannelConfig::read(&opts.channel_config)?;
    let root_dir = absolute(&opts.root_dir)?;
    let pre_script = absolute(&opts.pre_script)?;
    let source = FrameSource {
        cache: absolute(&opts.cache)?,
        segments_file: opts.segments_file.clone(),
        segments_name: opts.segments_name.clone(),
    };

    let chunks = analysis_chunks(segment, opts.subdivision_interval)?;
    debug!("{segment} gives {} analysis chunks", chunks.len());

    let mut uberdag = Dag::new();
    uberdag.set_dag_file(root_dir.join(format!(
        "excesspower_{}_{}.dag",
        segment.start() as i64,
        segment.end() as i64
    )));

    for section in channel_config.channels() {
        let section = section?;
        let channel = &section.name;
        info!("Channel {channel}, full analysis segment {segment}");
        if chunks.is_empty() {
            format!(
                "Segment {segment} is shorter than the whitening time ({WHITEN_TIME}s); not analysing {channel}"
            )
            .warn();
            continue;
        }

        let mut subdag = Dag::new();

        let mut ep_job = Job::processing(&section, &source, opts.submit.clone(), &root_dir)?;
        let input_path = PathBuf::from(ep_job.require_config_attr("output-directory")?)
            .join(&channel.instrument)
            .join(format!("{}_excesspower", channel.channel));
        ep_job.finalize()?;

        let mut processing_nodes = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let mut node = DagNode::new(&ep_job, format!("{}_{i:04}", ep_job.name()))?;
            node.add_macro(GPS_START_MACRO, chunk.start());
            node.add_macro(GPS_END_MACRO, chunk.end());
            subdag.add_node(&node)?;
            uberdag.add_node(&node)?;
            processing_nodes.push((*chunk, node));
        }

        let mut bucl_job = Job::clustering(channel, opts.submit.clone(), &root_dir)?;
        bucl_job.finalize()?;

        let cache_dir = root_dir.join("caches");
        fs::create_dir_all(&cache_dir).map_err(|e| OfflineDagError::CreateDir {
            path: cache_dir.clone(),
            source: e,
        })?;

        let dirs = gps_dirs(segment);
        let num_dirs = dirs.clone().count();
        for index in dirs {
            let dir = gps_dir_name(index);
            let window = Segment::new(
                index as f64 * GPS_GROUP_WIDTH,
                (index + 1) as f64 * GPS_GROUP_WIDTH,
            )?;
            let cache_file = cache_dir.join(format!(
                "excesspower_{}_{dir}.cache",
                channel.sanitized()
            ));
            let cache_str = cache_file.display().to_string();

            let mut node = DagNode::new(&bucl_job, format!("{}_{dir}", bucl_job.name()))?;
            node.set_pre_script(
                pre_script.clone(),
                vec![input_path.join(&dir).display().to_string(), cache_str.clone()],
            );
            node.add_macro(INPUT_CACHE_MACRO, &cache_str);
            add_clustering_parents(&mut node, &processing_nodes, window);
            subdag.add_node(&node)?;
            uberdag.add_node(&node)?;
        }

        subdag.set_dag_file(subdag_path(&root_dir, &channel.sanitized(), segment));
        if opts.write_subdags {
            subdag.write_dag()?;
        }
        if opts.write_scripts {
            subdag.write_script()?;
        }

        let mut printer = InfoPrinter::new(format!("DAG for {channel}").into());
        printer.push_block(vec![
            format!(
                "From {} ({})",
                segment.start(),
                gps_to_utc_string(segment.start())
            )
            .into(),
            format!("  to {} ({})", segment.end(), gps_to_utc_string(segment.end())).into(),
        ]);
        printer.push_line(
            format!(
                "{} processing nodes, {num_dirs} clustering nodes",
                processing_nodes.len()
            )
            .into(),
        );
        if let Some(dag_file) = subdag.dag_file().filter(|_| opts.write_subdags) {
            printer.push_line(format!("Sub-DAG: {}", dag_file.display()).into());
        }
        printer.display();
    }

    Ok(uberdag)
}

/// A clustering node depends on every processing node whose chunk produces
/// triggers inside its GPS directory. If there aren't any, it falls back to
/// the last processing node.
fn add_clustering_parents(
    node: &mut DagNode,
    processing_nodes: &[(Segment, DagNode)],
    window: Segment,
) {
    let mut found = false;
    for (chunk, parent) in processing_nodes {
        if chunk.intersects(&window) {
            node.add_parent(parent);
            found = true;
        }
    }
    if !found {
        if let Some((_, last)) = processing_nodes.last() {
            node.add_parent(last);
        }
    }
}

/// `<root>/excesspower_<channel>_<start>_<end>.dag`, with integer GPS times.
fn subdag_path(root_dir: &Path, sanitized_channel: &str, segment: Segment) -> PathBuf {
    root_dir.join(format!(
        "excesspower_{sanitized_channel}_{}_{}.dag",
        segment.start() as i64,
        segment.end() as i64
    ))
}

/// The chunks of `segment` analysed by individual processing jobs. Adjacent
/// chunks overlap by the whitening time.
pub fn analysis_chunks(
    segment: Segment,
    subdivision_interval: f64,
) -> Result<SegmentList, OfflineDagError> {
    Ok(shift_to_overlap(
        subdivide(segment, subdivision_interval, WHITEN_TIME)?,
        WHITEN_TIME,
        true,
    ))
}
