// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Generate channel configurations from plain lists of channels and sample
//! rates, like those produced by frame-file inspection tools.

use std::{
    fs,
    path::{Path, PathBuf},
};

use ini::Ini;
use itertools::Itertools;
use log::{debug, info};

use super::{load_ini, ConfigError};
use crate::{
    channel::ChannelName,
    constants::{DEFAULT_OFF_BITS, DEFAULT_ON_BITS},
};

/// Online detector characterisation channels carry this in their name. They
/// are state vectors, and aren't analysed themselves.
const ODC_MARKER: &str = "ODC_CHANNEL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelListEntry {
    pub name: ChannelName,
    pub sample_rate: u32,
}

/// Parse lines of `IFO:SUBSYS-NAME RATE`. Blank lines and lines starting with
/// `#` are ignored.
pub fn parse_channel_list(text: &str) -> Result<Vec<ChannelListEntry>, ConfigError> {
    let mut entries = vec![];
    for (i, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let bad_line = || ConfigError::BadChannelListLine {
            line_num: i + 1,
            line: line.to_string(),
        };
        let (name, rate) = trimmed
            .split_whitespace()
            .collect_tuple()
            .ok_or_else(bad_line)?;
        let sample_rate = rate.parse().map_err(|_| bad_line())?;
        entries.push(ChannelListEntry {
            name: ChannelName::new(name)?,
            sample_rate,
        });
    }

    Ok(entries)
}

/// How many leading `_`-separated words do the two names share? Dashes count
/// as underscores.
fn common_prefix_len(a: &str, b: &str) -> usize {
    let a = a.replace('-', "_");
    let b = b.replace('-', "_");
    a.split('_')
        .zip(b.split('_'))
        .take_while(|(x, y)| x == y)
        .count()
}

/// Pick the best matching data-quality channel for a channel: the one sharing
/// the longest prefix with it. Ties go to the name that sorts last. Returns
/// `None` only if there are no candidates.
pub fn infer_dq_channel<'a>(channel: &str, dq_channels: &'a [String]) -> Option<&'a str> {
    dq_channels
        .iter()
        .map(|dq| (common_prefix_len(channel, dq), dq.replace('-', "_"), dq))
        .max_by(|x, y| (x.0, &x.1).cmp(&(y.0, &y.1)))
        .map(|(_, _, dq)| dq.as_str())
}

/// One section of a generated channel configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSection {
    pub name: ChannelName,
    pub sample_rate: u32,
    pub configuration_file: PathBuf,
    pub dq_channel: Option<String>,
}

/// Turn a channel list into configuration sections. Data-quality channels in
/// the list are not analysed; instead, each analysed channel is paired with
/// the closest data-quality channel of the same instrument.
///
/// The `gstlal_excesspower` configuration for each channel is expected at
/// `<ini_dir>/<IFO>/channel_ini/gstlal_excesspower_<ifo>_<subsys>_<rate>.ini`.
pub fn make_channel_sections(entries: &[ChannelListEntry], ini_dir: &Path) -> Vec<GeneratedSection> {
    let (dq_entries, analysed): (Vec<&ChannelListEntry>, Vec<&ChannelListEntry>) = entries
        .iter()
        .partition(|e| e.name.channel.contains(ODC_MARKER));

    analysed
        .into_iter()
        .map(|entry| {
            let candidates = dq_entries
                .iter()
                .filter(|dq| dq.name.instrument == entry.name.instrument)
                .map(|dq| dq.name.channel.clone())
                .collect::<Vec<_>>();
            let dq_channel = infer_dq_channel(&entry.name.channel, &candidates).map(str::to_string);

            let configuration_file = ini_dir
                .join(&entry.name.instrument)
                .join("channel_ini")
                .join(format!(
                    "gstlal_excesspower_{}_{}_{}.ini",
                    entry.name.instrument.to_lowercase(),
                    entry.name.subsystem.to_lowercase(),
                    entry.sample_rate
                ));

            GeneratedSection {
                name: entry.name.clone(),
                sample_rate: entry.sample_rate,
                configuration_file,
                dq_channel,
            }
        })
        .collect()
}

/// Add the sections to an INI document.
pub(super) fn add_sections<'a, I>(ini: &mut Ini, sections: I)
where
    I: IntoIterator<Item = &'a GeneratedSection>,
{
    for s in sections {
        ini.with_section(Some(s.name.full_name()))
            .set("instrument", s.name.instrument.as_str())
            .set("sample_rate", s.sample_rate.to_string())
            .set(
                "configuration_file",
                s.configuration_file.display().to_string(),
            )
            .set("dq_channel", s.dq_channel.clone().unwrap_or_default())
            .set("on_bits", format!("0x{DEFAULT_ON_BITS:x}"))
            .set("off_bits", format!("0x{DEFAULT_OFF_BITS:x}"));
    }
}

/// Render sections as the text of a channel configuration.
pub(crate) fn sections_to_string(sections: &[GeneratedSection]) -> Result<String, ConfigError> {
    let mut ini = Ini::new();
    add_sections(&mut ini, sections);
    let mut buf = vec![];
    ini.write_to(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write one channel configuration per instrument and subsystem, as
/// `<dir>/<IFO>/<subsys>_channels.ini`. If `append` is true, sections are
/// added to any existing file rather than replacing it. Returns the paths
/// written.
pub fn write_subsystem_configs(
    sections: &[GeneratedSection],
    dir: &Path,
    append: bool,
) -> Result<Vec<PathBuf>, ConfigError> {
    let mut written = vec![];
    let groups = sections
        .iter()
        .sorted_by_key(|s| s.name.full_name())
        .group_by(|s| (s.name.instrument.clone(), s.name.subsystem.clone()));

    for ((instrument, subsystem), group) in &groups {
        let inst_dir = dir.join(&instrument);
        fs::create_dir_all(&inst_dir)?;
        let path = inst_dir.join(format!("{}_channels.ini", subsystem.to_lowercase()));

        let mut ini = if append && path.exists() {
            debug!("Appending to {}", path.display());
            load_ini(&path)?
        } else {
            Ini::new()
        };
        add_sections(&mut ini, group);
        ini.write_to_file(&path).map_err(|e| ConfigError::Write {
            path: path.clone(),
            source: e,
        })?;
        info!("Wrote {}", path.display());
        written.push(path);
    }

    Ok(written)
}
