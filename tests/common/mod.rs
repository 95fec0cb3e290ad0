//! Shared test utilities and fake collaborators.

#![allow(dead_code, unused_imports)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use cmdgraph::fs::{DirEntry, Filesystem};
use cmdgraph::output::BufferedOutput;
use cmdgraph::shell::Shell;
use cmdgraph::{complete, execute, Completed, CommandError, Data, Env, ExecuteData, Input, Node};

/// Shell that records every script and answers from a canned table.
///
/// A script whose joined text has a canned answer returns it; anything else
/// returns no output. Scripts listed in `failing` error out.
#[derive(Clone, Default)]
pub struct FakeShell {
    pub runs: Rc<RefCell<Vec<Vec<String>>>>,
    answers: BTreeMap<String, Vec<String>>,
    failing: Vec<String>,
}

impl FakeShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, script: &str, lines: &[&str]) -> Self {
        self.answers
            .insert(script.to_string(), lines.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn failing(mut self, script: &str) -> Self {
        self.failing.push(script.to_string());
        self
    }
}

impl Shell for FakeShell {
    fn run(&self, script: &[String]) -> anyhow::Result<Vec<String>> {
        self.runs.borrow_mut().push(script.to_vec());
        let joined = script.join("\n");
        if self.failing.contains(&joined) {
            anyhow::bail!("exit status 1");
        }
        Ok(self.answers.get(&joined).cloned().unwrap_or_default())
    }
}

/// Fixed directory tree rooted at `/`, with a fixed working directory.
#[derive(Clone)]
pub struct FakeFs {
    cwd: PathBuf,
    dirs: BTreeMap<PathBuf, Vec<DirEntry>>,
}

impl FakeFs {
    pub fn new(cwd: &str) -> Self {
        Self {
            cwd: PathBuf::from(cwd),
            dirs: BTreeMap::new(),
        }
    }

    pub fn dir(mut self, path: &str, entries: Vec<DirEntry>) -> Self {
        self.dirs.insert(PathBuf::from(path), entries);
        self
    }
}

impl Filesystem for FakeFs {
    fn current_dir(&self) -> io::Result<PathBuf> {
        Ok(self.cwd.clone())
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        self.dirs
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such directory"))
    }
}

pub fn tokens(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Execute `root` over `args` with the given env, returning the result and
/// the values committed along the way.
pub fn run_with(
    root: &Rc<Node>,
    args: &[&str],
    env: &Env,
) -> (Result<ExecuteData, CommandError>, Data, BufferedOutput) {
    let mut input = Input::new(tokens(args));
    let mut data = Data::new();
    let mut out = BufferedOutput::new();
    let result = execute(root, &mut input, &mut data, env, &mut out);
    (result, data, out)
}

pub fn run(root: &Rc<Node>, args: &[&str]) -> (Result<ExecuteData, CommandError>, Data) {
    let (result, data, _) = run_with(root, args, &Env::new());
    (result, data)
}

/// Complete the token list `args` (the last token is the word being typed).
pub fn suggest_with(root: &Rc<Node>, args: &[&str], env: &Env) -> Completed {
    let mut input = Input::new(tokens(args));
    complete(root, &mut input, &mut Data::new(), env)
}

pub fn suggest(root: &Rc<Node>, args: &[&str]) -> Completed {
    suggest_with(root, args, &Env::new())
}

/// Suggestions of a walk expected to succeed.
pub fn suggestions(root: &Rc<Node>, args: &[&str]) -> Vec<String> {
    let completed = suggest(root, args);
    if let Some(e) = &completed.error {
        panic!("unexpected completion error: {}", e);
    }
    completed.suggestions
}
