//! Bash collaborator.
//!
//! [`Shell`] runs literal script lines and returns stdout lines. It backs three
//! things: running the script a successful execution produced, populating a
//! value from a snippet ([`BashCommand`]), and fetching completion candidates
//! ([`crate::completion::BashCompleter`]).

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};

use crate::error::CommandError;
use crate::value::ValueType;
use crate::walker::{Mode, Step, Walk};

/// Runs script lines and returns their stdout, one entry per line.
pub trait Shell {
    fn run(&self, script: &[String]) -> Result<Vec<String>>;
}

/// Runs scripts through a bash subprocess (`bash -c`).
#[derive(Debug, Clone)]
pub struct BashShell {
    program: String,
}

impl BashShell {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for BashShell {
    fn default() -> Self {
        Self::new("bash")
    }
}

impl Shell for BashShell {
    fn run(&self, script: &[String]) -> Result<Vec<String>> {
        tracing::debug!(program = %self.program, lines = script.len(), "running script");
        let output = Command::new(&self.program)
            .arg("-c")
            .arg(script.join("\n"))
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to spawn {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{} exited with {}: {}", self.program, output.status, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(String::from)
            .collect())
    }
}

/// Writes the script to a file for the calling shell to source instead of
/// running it in a subprocess (needed for `cd`, `export` and friends).
#[derive(Debug, Clone)]
pub struct ScriptFile {
    path: PathBuf,
}

impl ScriptFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Shell for ScriptFile {
    fn run(&self, script: &[String]) -> Result<Vec<String>> {
        let mut content = script.join("\n");
        content.push('\n');
        std::fs::write(&self.path, content)
            .with_context(|| format!("failed to write script file {}", self.path.display()))?;
        Ok(Vec::new())
    }
}

/// Single-quote `s` for use as one shell word.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Processor that stores the output of a bash snippet under a name.
///
/// Scalars take the trimmed output joined by newlines; lists take each
/// non-empty line. Only runs during completion when `during_completion` is set.
#[derive(Debug, Clone)]
pub struct BashCommand {
    name: String,
    value_type: ValueType,
    script: Vec<String>,
    during_completion: bool,
}

impl BashCommand {
    pub fn new(name: impl Into<String>, value_type: ValueType, script: Vec<String>) -> Self {
        Self {
            name: name.into(),
            value_type,
            script,
            during_completion: false,
        }
    }

    /// Also run while completing, so completers can read the value.
    pub fn during_completion(mut self) -> Self {
        self.during_completion = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn process(&self, w: &mut Walk<'_>) -> Result<Step, CommandError> {
        if w.mode == Mode::Complete && !self.during_completion {
            return Ok(Step::Continue);
        }

        let lines = w
            .env
            .shell()
            .run(&self.script)
            .map_err(|e| CommandError::Bash {
                name: self.name.clone(),
                message: format!("{:#}", e),
            })?;

        let tokens: Vec<String> = if self.value_type.is_list() {
            lines
                .into_iter()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect()
        } else {
            vec![lines.join("\n").trim().to_string()]
        };

        let value = self.value_type.parse(&tokens)?;
        w.data.set(self.name.clone(), value);
        Ok(Step::Continue)
    }
}
