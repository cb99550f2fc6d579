// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Miscellaneous things.

use std::{
    env,
    path::{Path, PathBuf},
};

use hifitime::Epoch;

/// Find an executable in `PATH`, like the shell's `which`.
pub(crate) fn which(prog: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(prog))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(p: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    p.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o100 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(p: &Path) -> bool {
    p.is_file()
}

/// Make a path absolute without touching the filesystem (the path doesn't
/// need to exist).
pub(crate) fn absolute(p: &Path) -> std::io::Result<PathBuf> {
    std::path::absolute(p)
}

/// Render a GPS time as a UTC string, e.g. for log messages.
pub(crate) fn gps_to_utc_string(gps: f64) -> String {
    // Epochs display in the time scale they were created with.
    let utc = Epoch::from_utc_seconds(Epoch::from_gpst_seconds(gps).to_utc_seconds());
    utc.to_string()
}
