//! Copy of an image from an NFS-visible path.

use std::path::Path;

use crate::runner::ToolCommand;

/// `rsync --progress -avH <src> <dest>`
pub fn rsync_command(src: &Path, dest: &Path) -> ToolCommand {
    ToolCommand::new("rsync")
        .args(["--progress", "-avH"])
        .arg(src)
        .arg(dest)
}
