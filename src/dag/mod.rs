// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! HTCondor DAGMan workflows.
//!
//! A [`Dag`] holds [`DagNode`]s in the order they were added. Nodes may only
//! refer to parents that are already in the DAG, so a DAG can never contain a
//! cycle. The same node can be added to more than one DAG (e.g. a per-channel
//! sub-DAG and the top-level DAG); each DAG keeps its own copy, and nodes are
//! identified by name.

mod error;

pub use error::DagError;

use std::{
    collections::HashSet,
    fmt::Display,
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, trace};

use crate::job::{Job, JobError};

/// A script run on the submit machine before a node's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreScript {
    pub executable: PathBuf,
    pub args: Vec<String>,
}

/// One invocation of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DagNode {
    name: String,
    sub_file: PathBuf,
    executable: PathBuf,
    arguments: String,
    macros: IndexMap<String, String>,
    pre_script: Option<PreScript>,
    parents: Vec<String>,
}

impl DagNode {
    /// Make a node for a job. The job must have been finalized, because the
    /// node refers to its submit file.
    pub fn new<S: Into<String>>(job: &Job, name: S) -> Result<DagNode, DagError> {
        let paths = job
            .finalized()
            .ok_or_else(|| JobError::NotFinalized(job.name()))?;
        Ok(DagNode {
            name: name.into(),
            sub_file: paths.sub_file.clone(),
            executable: job.executable().to_path_buf(),
            arguments: job.arguments(),
            macros: IndexMap::new(),
            pre_script: None,
            parents: vec![],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sub_file(&self) -> &Path {
        &self.sub_file
    }

    pub fn macros(&self) -> &IndexMap<String, String> {
        &self.macros
    }

    pub fn pre_script(&self) -> Option<&PreScript> {
        self.pre_script.as_ref()
    }

    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    /// Set a macro used in the job's submit file, e.g. `macrogpsstart`.
    pub fn add_macro<V: Display>(&mut self, key: &str, value: V) {
        self.macros.insert(key.to_string(), value.to_string());
    }

    pub fn set_pre_script<P: Into<PathBuf>>(&mut self, executable: P, args: Vec<String>) {
        self.pre_script = Some(PreScript {
            executable: executable.into(),
            args,
        });
    }

    /// This node won't run until `parent` has finished. Adding the same
    /// parent twice has no further effect.
    pub fn add_parent(&mut self, parent: &DagNode) {
        if !self.parents.iter().any(|p| p == &parent.name) {
            self.parents.push(parent.name.clone());
        }
    }

    /// The job's arguments with this node's macros substituted.
    pub fn command_line(&self) -> String {
        let mut args = self.arguments.clone();
        for (k, v) in &self.macros {
            args = args.replace(&format!("$({k})"), v);
        }
        format!("{}{args}", self.executable.display())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dag {
    dag_file: Option<PathBuf>,
    nodes: Vec<DagNode>,
    names: HashSet<String>,
}

impl Dag {
    pub fn new() -> Dag {
        Dag::default()
    }

    pub fn set_dag_file<P: Into<PathBuf>>(&mut self, dag_file: P) {
        self.dag_file = Some(dag_file.into());
    }

    pub fn dag_file(&self) -> Option<&Path> {
        self.dag_file.as_deref()
    }

    pub fn nodes(&self) -> &[DagNode] {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&DagNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a copy of `node`. All of its parents must already be in this DAG.
    pub fn add_node(&mut self, node: &DagNode) -> Result<(), DagError> {
        if self.names.contains(&node.name) {
            return Err(DagError::DuplicateNode(node.name.clone()));
        }
        if let Some(parent) = node.parents.iter().find(|p| !self.names.contains(*p)) {
            return Err(DagError::UnknownParent {
                node: node.name.clone(),
                parent: parent.clone(),
            });
        }
        trace!("Adding node {}", node.name);
        self.names.insert(node.name.clone());
        self.nodes.push(node.clone());
        Ok(())
    }

    /// The DAGMan description of this DAG.
    pub fn to_dag_string(&self) -> String {
        let mut s = String::new();
        for node in &self.nodes {
            s.push_str(&format!("JOB {} {}\n", node.name, node.sub_file.display()));
            if !node.macros.is_empty() {
                let vars = node
                    .macros
                    .iter()
                    .map(|(k, v)| format!("{k}=\"{}\"", v.replace('"', "\\\"")))
                    .join(" ");
                s.push_str(&format!("VARS {} {vars}\n", node.name));
            }
            if let Some(pre) = &node.pre_script {
                s.push_str(&format!(
                    "SCRIPT PRE {} {}",
                    node.name,
                    pre.executable.display()
                ));
                for arg in &pre.args {
                    s.push(' ');
                    s.push_str(arg);
                }
                s.push('\n');
            }
        }
        for node in self.nodes.iter().filter(|n| !n.parents.is_empty()) {
            s.push_str(&format!(
                "PARENT {} CHILD {}\n",
                node.parents.join(" "),
                node.name
            ));
        }
        s
    }

    /// A shell script running every node in order, without a scheduler.
    pub fn to_script_string(&self) -> String {
        let mut s = "#!/bin/sh\n".to_string();
        for node in &self.nodes {
            if let Some(pre) = &node.pre_script {
                s.push_str(&format!(
                    "{} {}\n",
                    pre.executable.display(),
                    pre.args.join(" ")
                ));
            }
            s.push_str(&node.command_line());
            s.push('\n');
        }
        s
    }

    /// Write the DAG file. Returns its path.
    pub fn write_dag(&self) -> Result<PathBuf, DagError> {
        let path = self.dag_file.clone().ok_or(DagError::NoDagFile)?;
        debug!("Writing DAG {} ({} nodes)", path.display(), self.len());
        write_file(&path, self.to_dag_string())?;
        Ok(path)
    }

    /// Write a shell-script equivalent of the DAG next to the DAG file, with a
    /// `.sh` extension. Returns its path.
    pub fn write_script(&self) -> Result<PathBuf, DagError> {
        let path = self
            .dag_file
            .as_ref()
            .ok_or(DagError::NoDagFile)?
            .with_extension("sh");
        debug!("Writing DAG script {}", path.display());
        write_file(&path, self.to_script_string())?;
        Ok(path)
    }
}

fn write_file(path: &Path, contents: String) -> Result<(), DagError> {
    fs::write(path, contents).map_err(|e| DagError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}
