//! Collaborators handed to every walk.

use crate::fs::{Filesystem, OsFilesystem};
use crate::shell::{BashShell, Shell};

/// External collaborators a walk may call out to.
pub struct Env {
    shell: Box<dyn Shell>,
    fs: Box<dyn Filesystem>,
}

impl Env {
    /// Real bash and the real filesystem.
    pub fn new() -> Self {
        Self {
            shell: Box::new(BashShell::default()),
            fs: Box::new(OsFilesystem),
        }
    }

    pub fn with_shell(mut self, shell: impl Shell + 'static) -> Self {
        self.shell = Box::new(shell);
        self
    }

    pub fn with_filesystem(mut self, fs: impl Filesystem + 'static) -> Self {
        self.fs = Box::new(fs);
        self
    }

    pub fn shell(&self) -> &dyn Shell {
        self.shell.as_ref()
    }

    pub fn fs(&self) -> &dyn Filesystem {
        self.fs.as_ref()
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
