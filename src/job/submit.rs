// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Scheduler settings shared by every job of a run.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

/// HTCondor settings common to all jobs. This is assembled once with a
/// [`SubmitConfigBuilder`] and then handed to each job; it can't be changed
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitConfig {
    universe: String,
    getenv: bool,
    accounting_group: Option<String>,
    accounting_group_user: Option<String>,
    bin_dir: Option<PathBuf>,
    extra_commands: IndexMap<String, String>,
}

impl SubmitConfig {
    pub fn builder() -> SubmitConfigBuilder {
        SubmitConfigBuilder::default()
    }

    pub fn universe(&self) -> &str {
        &self.universe
    }

    /// Do jobs pull in the submitter's environment? Useful when running
    /// software that isn't installed system-wide.
    pub fn getenv(&self) -> bool {
        self.getenv
    }

    pub fn accounting_group(&self) -> Option<&str> {
        self.accounting_group.as_deref()
    }

    pub fn accounting_group_user(&self) -> Option<&str> {
        self.accounting_group_user.as_deref()
    }

    /// Where executables live. If this is `None`, they are searched for in
    /// `PATH`.
    pub fn bin_dir(&self) -> Option<&Path> {
        self.bin_dir.as_deref()
    }

    pub fn extra_commands(&self) -> &IndexMap<String, String> {
        &self.extra_commands
    }

    /// The submit-file lines contributed by this config, in order.
    pub(crate) fn commands(&self) -> Vec<(String, String)> {
        let mut commands = vec![];
        if self.getenv {
            commands.push(("getenv".to_string(), "True".to_string()));
        }
        if let Some(group) = &self.accounting_group {
            commands.push(("accounting_group".to_string(), group.clone()));
        }
        if let Some(user) = &self.accounting_group_user {
            commands.push(("accounting_group_user".to_string(), user.clone()));
        }
        commands.extend(
            self.extra_commands
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        commands
    }
}

impl Default for SubmitConfig {
    fn default() -> Self {
        SubmitConfigBuilder::default().build()
    }
}

#[derive(Debug, Clone)]
pub struct SubmitConfigBuilder {
    universe: String,
    getenv: bool,
    accounting_group: Option<String>,
    accounting_group_user: Option<String>,
    bin_dir: Option<PathBuf>,
    extra_commands: IndexMap<String, String>,
}

impl Default for SubmitConfigBuilder {
    fn default() -> Self {
        SubmitConfigBuilder {
            universe: "vanilla".to_string(),
            getenv: false,
            accounting_group: None,
            accounting_group_user: None,
            bin_dir: None,
            extra_commands: IndexMap::new(),
        }
    }
}

impl SubmitConfigBuilder {
    pub fn universe<S: Into<String>>(mut self, universe: S) -> Self {
        self.universe = universe.into();
        self
    }

    pub fn getenv(mut self, getenv: bool) -> Self {
        self.getenv = getenv;
        self
    }

    pub fn accounting_group<S: Into<String>>(mut self, group: Option<S>) -> Self {
        self.accounting_group = group.map(Into::into);
        self
    }

    pub fn accounting_group_user<S: Into<String>>(mut self, user: Option<S>) -> Self {
        self.accounting_group_user = user.map(Into::into);
        self
    }

    pub fn bin_dir<P: Into<PathBuf>>(mut self, bin_dir: Option<P>) -> Self {
        self.bin_dir = bin_dir.map(Into::into);
        self
    }

    /// Add an arbitrary submit-file command. Later values for the same key
    /// replace earlier ones.
    pub fn extra_command<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.extra_commands.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> SubmitConfig {
        let SubmitConfigBuilder {
            universe,
            getenv,
            accounting_group,
            accounting_group_user,
            bin_dir,
            extra_commands,
        } = self;
        SubmitConfig {
            universe,
            getenv,
            accounting_group,
            accounting_group_user,
            bin_dir,
            extra_commands,
        }
    }
}
