//! Line-oriented output sinks.

/// Where executors and the runner write user-visible lines.
pub trait Output {
    fn stdout(&mut self, line: &str);
    fn stderr(&mut self, line: &str);
}

/// Writes to the process stdout/stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdOutput;

impl Output for StdOutput {
    fn stdout(&mut self, line: &str) {
        println!("{}", line);
    }

    fn stderr(&mut self, line: &str) {
        eprintln!("{}", line);
    }
}

/// Collects lines in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferedOutput {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl BufferedOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Output for BufferedOutput {
    fn stdout(&mut self, line: &str) {
        self.stdout.push(line.to_string());
    }

    fn stderr(&mut self, line: &str) {
        self.stderr.push(line.to_string());
    }
}
