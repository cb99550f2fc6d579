// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with configuration files.

use std::path::PathBuf;

use thiserror::Error;

use crate::channel::ChannelNameError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No configuration files read; couldn't read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Couldn't parse configuration file {path}: {msg}")]
    Parse { path: PathBuf, msg: String },

    #[error("No section named '{0}' in the channel configuration")]
    MissingSection(String),

    #[error("Section '{section}' is missing the required key '{key}'")]
    MissingKey { section: String, key: &'static str },

    #[error("Section '{section}' has an invalid value for '{key}': '{value}'")]
    BadValue {
        section: String,
        key: String,
        value: String,
    },

    #[error("Configuration file {path} doesn't have a '{attr}' attribute in any section")]
    MissingAttribute { path: PathBuf, attr: String },

    #[error("Line {line_num} of the channel list isn't of the form 'IFO:SUBSYS-NAME RATE': '{line}'")]
    BadChannelListLine { line_num: usize, line: String },

    #[error("Couldn't write configuration file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    ChannelName(#[from] ChannelNameError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
