// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Detector channel names, e.g. `H1:PEM-EY_MAG_EBAY_SEIRACK_X_DQ`.

use std::{fmt::Display, str::FromStr};

use thiserror::Error;

/// A fully-qualified channel name, split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelName {
    /// e.g. `H1`.
    pub instrument: String,

    /// The channel name without the instrument, e.g. `PEM-EY_MAG`.
    pub channel: String,

    /// e.g. `PEM`.
    pub subsystem: String,
}

impl ChannelName {
    pub fn new(name: &str) -> Result<ChannelName, ChannelNameError> {
        let (instrument, channel) = match name.split(':').collect::<Vec<_>>().as_slice() {
            [i, c] if !i.is_empty() && !c.is_empty() => (i.to_string(), c.to_string()),
            _ => return Err(ChannelNameError::NoInstrument(name.to_string())),
        };
        let subsystem = match channel.split_once('-') {
            Some((s, _)) if !s.is_empty() => s.to_string(),
            _ => return Err(ChannelNameError::NoSubsystem(name.to_string())),
        };

        Ok(ChannelName {
            instrument,
            channel,
            subsystem,
        })
    }

    /// e.g. `H1:PEM-EY_MAG`.
    pub fn full_name(&self) -> String {
        format!("{}:{}", self.instrument, self.channel)
    }

    /// The full name, usable in file names, e.g. `H1_PEM_EY_MAG`.
    pub fn sanitized(&self) -> String {
        self.full_name().replace([':', '-'], "_")
    }

    /// The name as `gstlal_excesspower` wants it on the command line, e.g.
    /// `H1=PEM-EY_MAG`.
    pub fn as_instrument_assignment(&self) -> String {
        format!("{}={}", self.instrument, self.channel)
    }
}

impl FromStr for ChannelName {
    type Err = ChannelNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChannelName::new(s)
    }
}

impl Display for ChannelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.instrument, self.channel)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelNameError {
    #[error("Channel name '{0}' isn't of the form 'IFO:CHANNEL'; there must be exactly one ':'")]
    NoInstrument(String),

    #[error("Channel name '{0}' has no subsystem; expected something like 'H1:SUBSYS-NAME'")]
    NoSubsystem(String),
}
