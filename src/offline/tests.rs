// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fs;

use approx::assert_abs_diff_eq;
use indoc::{formatdoc, indoc};
use tempfile::TempDir;

use super::*;
use crate::{config::ConfigError, job::JobError};

/// Set up a channel configuration with two channels in `dir`, along with
/// their program configurations and a frame cache.
fn setup(dir: &Path) -> OfflineDagOptions {
    let program_config = dir.join("ep.ini");
    fs::write(
        &program_config,
        indoc! {"
            [triggering]
            output-directory = /home/detchar/triggers
        "},
    )
    .unwrap();
    let channel_config = dir.join("channels.ini");
    fs::write(
        &channel_config,
        formatdoc! {"
            [H1:PEM-EY_MAG]
            configuration_file = {0}
            sample_rate = 256

            [L1:LSC-DARM_ERR]
            configuration_file = {0}
            sample_rate = 16384
            downsample_rate = 4096
        ", program_config.display()},
    )
    .unwrap();
    let cache = dir.join("frames.cache");
    fs::write(&cache, "").unwrap();

    let mut opts = OfflineDagOptions::new(channel_config, cache);
    opts.root_dir = dir.join("dag");
    opts.pre_script = PathBuf::from("/usr/bin/find_trig_files.sh");
    opts.submit = SubmitConfig::builder()
        .getenv(true)
        .bin_dir(Some("/opt/bin"))
        .build();
    opts
}

#[test]
fn test_gps_dirs() {
    let seg = Segment::new(1e9, 1e9 + 30000.0).unwrap();
    assert_eq!(gps_dirs(seg), 10000..10001);
    let seg = Segment::new(1000090000.0, 1000110000.0).unwrap();
    assert_eq!(gps_dirs(seg), 10000..10002);
    // Ending exactly on a boundary doesn't touch the next directory.
    let seg = Segment::new(1000090000.0, 1000100000.0).unwrap();
    assert_eq!(gps_dirs(seg), 10000..10001);

    assert_eq!(gps_dir_name(10000), "10000");
    assert_eq!(gps_dir_name(9999), "09999");
}

#[test]
fn test_analysis_chunks() {
    let seg = Segment::new(1e9, 1e9 + 30000.0).unwrap();
    let chunks = analysis_chunks(seg, DEFAULT_SUBDIVISION_INTERVAL).unwrap();
    assert_eq!(chunks.len(), 3);
    assert_abs_diff_eq!(chunks[0].start(), 1e9);
    assert_abs_diff_eq!(chunks[0].end(), 1e9 + 14400.0);
    assert_abs_diff_eq!(chunks[1].start(), 1e9 + 14400.0 - WHITEN_TIME);
    assert_abs_diff_eq!(chunks[2].start(), 1e9 + 28800.0 - WHITEN_TIME);
    assert_abs_diff_eq!(chunks[2].end(), 1e9 + 30000.0);

    let short = Segment::new(1e9, 1e9 + 100.0).unwrap();
    assert!(analysis_chunks(short, DEFAULT_SUBDIVISION_INTERVAL)
        .unwrap()
        .is_empty());
}

#[test]
fn test_offline_dag() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let opts = setup(tmp_dir.path());
    let root = tmp_dir.path().join("dag");
    let seg = Segment::new(1e9, 1e9 + 30000.0).unwrap();
    let dag = write_offline_dag(seg, &opts).unwrap();

    // 3 processing nodes and 1 clustering node per channel.
    assert_eq!(dag.len(), 8);
    assert_eq!(
        dag.dag_file(),
        Some(root.join("excesspower_1000000000_1000030000.dag").as_path())
    );

    let first = dag.node("excesspower_H1_PEM_EY_MAG_0000").unwrap();
    assert_eq!(first.macros()["macrogpsstart"], "1000000000");
    assert_eq!(first.macros()["macrogpsend"], "1000014400");
    assert!(first.parents().is_empty());

    let bucl = dag.node("bucluster_H1_PEM_EY_MAG_10000").unwrap();
    assert_eq!(
        bucl.parents(),
        [
            "excesspower_H1_PEM_EY_MAG_0000",
            "excesspower_H1_PEM_EY_MAG_0001",
            "excesspower_H1_PEM_EY_MAG_0002",
        ]
    );
    let cache = root
        .join("caches")
        .join("excesspower_H1_PEM_EY_MAG_10000.cache");
    assert_eq!(bucl.macros()["macroinpcache"], cache.display().to_string());
    let pre = bucl.pre_script().unwrap();
    assert_eq!(pre.executable, PathBuf::from("/usr/bin/find_trig_files.sh"));
    assert_eq!(
        pre.args,
        vec![
            "/home/detchar/triggers/H1/PEM-EY_MAG_excesspower/10000".to_string(),
            cache.display().to_string(),
        ]
    );
    assert!(root.join("caches").is_dir());

    // Job files and sub-DAGs are on disk.
    let wd = root.join("H1").join("PEM").join("PEM-EY_MAG");
    assert!(wd.join("H1_PEM-EY_MAG_submit.sub").is_file());
    assert!(wd.join("H1_PEM-EY_MAG_bucluster_submit.sub").is_file());
    assert!(wd.join("H1_PEM-EY_MAG_config.ini").is_file());
    let subdag = root.join("excesspower_H1_PEM_EY_MAG_1000000000_1000030000.dag");
    let contents = fs::read_to_string(subdag).unwrap();
    assert!(contents.contains("JOB excesspower_H1_PEM_EY_MAG_0002 "));
    assert!(!contents.contains("L1_LSC"));
    assert!(root
        .join("excesspower_L1_LSC_DARM_ERR_1000000000_1000030000.dag")
        .is_file());
    // No scripts unless asked.
    assert!(!root
        .join("excesspower_H1_PEM_EY_MAG_1000000000_1000030000.sh")
        .exists());

    // The top-level DAG isn't written until asked.
    assert!(!dag.dag_file().unwrap().exists());
    dag.write_dag().unwrap();
    assert!(dag.dag_file().unwrap().is_file());
}

#[test]
fn test_every_clustering_node_has_a_processing_parent() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let mut opts = setup(tmp_dir.path());
    opts.write_subdags = false;
    opts.write_scripts = true;
    let seg = Segment::new(1000090000.0, 1000110000.0).unwrap();
    let dag = write_offline_dag(seg, &opts).unwrap();

    for node in dag.nodes() {
        if node.name().starts_with("bucluster_") {
            assert!(!node.parents().is_empty());
            for parent in node.parents() {
                assert!(parent.starts_with("excesspower_"));
                assert!(dag.node(parent).is_some());
            }
        }
    }

    // Each clustering node only waits for chunks overlapping its directory.
    let early = dag.node("bucluster_L1_LSC_DARM_ERR_10000").unwrap();
    assert_eq!(early.parents(), ["excesspower_L1_LSC_DARM_ERR_0000"]);
    let late = dag.node("bucluster_L1_LSC_DARM_ERR_10001").unwrap();
    assert_eq!(
        late.parents(),
        [
            "excesspower_L1_LSC_DARM_ERR_0000",
            "excesspower_L1_LSC_DARM_ERR_0001"
        ]
    );

    let root = tmp_dir.path().join("dag");
    assert!(!root
        .join("excesspower_L1_LSC_DARM_ERR_1000090000_1000110000.dag")
        .exists());
    let script = root.join("excesspower_L1_LSC_DARM_ERR_1000090000_1000110000.sh");
    let contents = fs::read_to_string(script).unwrap();
    assert!(contents.contains("--gps-start-time 1000090000 --gps-end-time 1000104400"));
}

#[test]
fn test_short_segment_skips_channels() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let opts = setup(tmp_dir.path());
    let seg = Segment::new(1e9, 1e9 + 100.0).unwrap();
    let dag = write_offline_dag(seg, &opts).unwrap();
    assert!(dag.is_empty());
    // Nothing was written for any channel.
    assert!(!tmp_dir.path().join("dag").join("H1").exists());
    assert!(!tmp_dir.path().join("dag").join("caches").exists());
}

#[test]
fn test_missing_channel_config_is_fatal() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let mut opts = setup(tmp_dir.path());
    opts.channel_config = tmp_dir.path().join("doesnt_exist.ini");
    let seg = Segment::new(1e9, 1e9 + 30000.0).unwrap();
    assert!(matches!(
        write_offline_dag(seg, &opts),
        Err(OfflineDagError::Config(ConfigError::Read { .. }))
    ));
}

#[test]
fn test_missing_output_directory_is_fatal() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let opts = setup(tmp_dir.path());
    fs::write(tmp_dir.path().join("ep.ini"), "[triggering]\nsnr-thresh = 5\n").unwrap();
    let seg = Segment::new(1e9, 1e9 + 30000.0).unwrap();
    assert!(matches!(
        write_offline_dag(seg, &opts),
        Err(OfflineDagError::Job(JobError::Config(
            ConfigError::MissingAttribute { .. }
        )))
    ));
}

#[test]
fn test_clustering_parent_fallback() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let channel = crate::ChannelName::new("H1:PEM-EY_MAG").unwrap();
    let submit = SubmitConfig::builder().bin_dir(Some("/opt/bin")).build();
    let mut job = Job::clustering(&channel, submit, tmp_dir.path()).unwrap();
    job.finalize().unwrap();

    let processing = vec![
        (
            Segment::new(0.0, 10.0).unwrap(),
            DagNode::new(&job, "p0").unwrap(),
        ),
        (
            Segment::new(8.0, 20.0).unwrap(),
            DagNode::new(&job, "p1").unwrap(),
        ),
    ];
    let mut node = DagNode::new(&job, "c").unwrap();
    add_clustering_parents(&mut node, &processing, Segment::new(50.0, 60.0).unwrap());
    assert_eq!(node.parents(), ["p1"]);

    let mut node = DagNode::new(&job, "c").unwrap();
    add_clustering_parents(&mut node, &processing, Segment::new(0.0, 9.0).unwrap());
    assert_eq!(node.parents(), ["p0", "p1"]);
}
