// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parameters for `epdag` subcommands.
//!
//! The code here is kind of "mirroring" the code within the `cli` module; the
//! idea is that `cli` is unparsed, user-facing code, whereas parameters have
//! been parsed and are ready to be used directly.

mod offline_dag;
mod online;

pub(crate) use offline_dag::{DagRunError, OfflineDagParams};
pub(crate) use online::{OnlineError, OnlineKillParams, OnlineSetupParams};
