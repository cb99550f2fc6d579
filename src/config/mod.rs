// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Configuration files.
//!
//! There are two kinds of INI files handled here:
//!
//! 1. A *channel configuration*, which has one section per channel (named
//!    after the channel, e.g. `[H1:PEM-EY_MAG]`) describing how to analyse it;
//! 2. a *program configuration* for each channel, which is owned by
//!    `gstlal_excesspower`. We only peek into it, and copy it next to the job
//!    that uses it.

mod channel_list;
mod error;
#[cfg(test)]
mod tests;

pub use channel_list::{
    infer_dq_channel, make_channel_sections, parse_channel_list, write_subsystem_configs,
    ChannelListEntry, GeneratedSection,
};
pub use error::ConfigError;
pub(crate) use channel_list::sections_to_string;

use std::path::{Path, PathBuf};

use ini::{Ini, Properties};
use log::{debug, trace};

use crate::channel::ChannelName;

/// Read an INI file, distinguishing between files we couldn't read and files
/// we couldn't understand.
fn load_ini(path: &Path) -> Result<Ini, ConfigError> {
    debug!("Reading configuration file {}", path.display());
    match Ini::load_from_file(path) {
        Ok(ini) => Ok(ini),
        Err(ini::Error::Io(e)) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        }),
        Err(ini::Error::Parse(e)) => Err(ConfigError::Parse {
            path: path.to_path_buf(),
            msg: e.to_string(),
        }),
    }
}

/// A set of channels to analyse. Section order is preserved.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    path: Option<PathBuf>,
    ini: Ini,
}

impl ChannelConfig {
    /// Read a channel configuration file. Failing to read it is fatal; nothing
    /// can be analysed without it.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<ChannelConfig, ConfigError> {
        let path = path.as_ref();
        let ini = load_ini(path)?;
        Ok(ChannelConfig {
            path: Some(path.to_path_buf()),
            ini,
        })
    }

    /// Parse a channel configuration from a string.
    pub fn parse(contents: &str) -> Result<ChannelConfig, ConfigError> {
        let ini = Ini::load_from_str(contents).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<string>"),
            msg: e.to_string(),
        })?;
        Ok(ChannelConfig { path: None, ini })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The names of all sections, in file order.
    pub fn section_names(&self) -> Vec<&str> {
        self.ini.iter().filter_map(|(name, _)| name).collect()
    }

    /// Parse the named section.
    pub fn channel(&self, name: &str) -> Result<ChannelSection, ConfigError> {
        let props = self
            .ini
            .section(Some(name))
            .ok_or_else(|| ConfigError::MissingSection(name.to_string()))?;
        ChannelSection::from_properties(name, props)
    }

    /// Parse every section, in file order.
    pub fn channels(&self) -> impl Iterator<Item = Result<ChannelSection, ConfigError>> + '_ {
        self.ini
            .iter()
            .filter_map(|(name, props)| name.map(|n| ChannelSection::from_properties(n, props)))
    }
}

/// A data-quality (state-vector) channel, and the bits that must be on and
/// off for data to be analysed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DqChannel {
    /// The channel name without an instrument prefix.
    pub channel: String,
    pub on_bits: Option<u32>,
    pub off_bits: Option<u32>,
}

/// Everything needed to set up jobs for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSection {
    pub name: ChannelName,

    /// The `gstlal_excesspower` configuration for this channel.
    pub configuration_file: PathBuf,

    /// [Hz]
    pub sample_rate: u32,

    /// If set, data are downsampled to this rate before analysis [Hz].
    pub downsample_rate: Option<u32>,

    pub dq: Option<DqChannel>,
}

impl ChannelSection {
    fn from_properties(name: &str, props: &Properties) -> Result<ChannelSection, ConfigError> {
        trace!("Parsing channel section '{name}'");
        let channel_name = ChannelName::new(name)?;

        // Empty values are treated the same as missing values.
        let get = |key: &str| props.get(key).map(str::trim).filter(|v| !v.is_empty());
        let get_u32 = |key: &str| -> Result<Option<u32>, ConfigError> {
            get(key)
                .map(|v| {
                    v.parse().map_err(|_| ConfigError::BadValue {
                        section: name.to_string(),
                        key: key.to_string(),
                        value: v.to_string(),
                    })
                })
                .transpose()
        };
        let get_bits = |key: &str| -> Result<Option<u32>, ConfigError> {
            get(key)
                .map(|v| {
                    parse_hex(v).ok_or_else(|| ConfigError::BadValue {
                        section: name.to_string(),
                        key: key.to_string(),
                        value: v.to_string(),
                    })
                })
                .transpose()
        };

        let configuration_file =
            get("configuration_file").ok_or_else(|| ConfigError::MissingKey {
                section: name.to_string(),
                key: "configuration_file",
            })?;
        let sample_rate = get_u32("sample_rate")?.ok_or_else(|| ConfigError::MissingKey {
            section: name.to_string(),
            key: "sample_rate",
        })?;
        let downsample_rate = get_u32("downsample_rate")?;
        let dq = match get("dq_channel").or_else(|| get("odc_channel")) {
            Some(dq_channel) => Some(DqChannel {
                channel: dq_channel.to_string(),
                on_bits: get_bits("on_bits")?,
                off_bits: get_bits("off_bits")?,
            }),
            None => None,
        };

        Ok(ChannelSection {
            name: channel_name,
            configuration_file: PathBuf::from(configuration_file),
            sample_rate,
            downsample_rate,
            dq,
        })
    }
}

/// Parse state-vector bits, which are written in hexadecimal, with or without
/// a leading `0x`.
fn parse_hex(s: &str) -> Option<u32> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(digits, 16).ok()
}

/// A `gstlal_excesspower` configuration file. Attribute names may be given
/// with underscores; they are looked up with dashes, in any section.
#[derive(Debug, Clone)]
pub struct ProgramConfig {
    path: PathBuf,
    ini: Ini,
}

impl ProgramConfig {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<ProgramConfig, ConfigError> {
        let path = path.as_ref();
        let ini = load_ini(path)?;
        Ok(ProgramConfig {
            path: path.to_path_buf(),
            ini,
        })
    }

    /// The file this configuration was last read from or written to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the value of the first matching attribute in any section.
    pub fn get_attr(&self, attr: &str) -> Option<&str> {
        let key = attr.replace('_', "-");
        self.ini.iter().find_map(|(_, props)| props.get(&key))
    }

    /// The same as `get_attr`, but the attribute must exist.
    pub fn require_attr(&self, attr: &str) -> Result<&str, ConfigError> {
        self.get_attr(attr)
            .ok_or_else(|| ConfigError::MissingAttribute {
                path: self.path.clone(),
                attr: attr.replace('_', "-"),
            })
    }

    /// Overwrite the value of the first matching attribute. Returns `false`
    /// if no section has the attribute (in which case nothing is changed).
    pub fn set_attr(&mut self, attr: &str, value: &str) -> bool {
        let key = attr.replace('_', "-");
        for (_, props) in self.ini.iter_mut() {
            if props.contains_key(&key) {
                props.insert(key, value);
                return true;
            }
        }
        false
    }

    /// Write this configuration to a new file, and remember that file as where
    /// this configuration lives.
    pub fn write<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        debug!("Writing configuration file {}", path.display());
        self.ini
            .write_to_file(path)
            .map_err(|e| ConfigError::Write {
                path: path.to_path_buf(),
                source: e,
            })?;
        self.path = path.to_path_buf();
        Ok(())
    }
}
