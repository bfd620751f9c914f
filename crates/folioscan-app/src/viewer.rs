// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hand the finished PDF to the system viewer.

use std::path::Path;
use std::process::Command;

use folioscan_core::error::Result;
use tracing::debug;

/// Launch the platform's default handler for `path` without waiting for it.
pub fn open_with_system_viewer(path: &Path) -> Result<()> {
    let mut command = viewer_command(path);
    debug!(?command, "Opening output");
    command.spawn()?;
    Ok(())
}

fn viewer_command(path: &Path) -> Command {
    if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]).arg(path);
        command
    } else if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(path);
        command
    } else {
        let mut command = Command::new("xdg-open");
        command.arg(path);
        command
    }
}
