//! Completion candidates and the pluggable completers that produce them.

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use anyhow::Result;

use crate::data::Data;
use crate::env::Env;

/// Candidate set plus the policy used to filter it against a partial word.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub suggestions: Vec<String>,
    /// Drop candidates already chosen earlier in the same list argument.
    pub distinct: bool,
    pub case_insensitive: bool,
    /// Return every candidate regardless of the partial word.
    pub ignore_filter: bool,
}

impl Completion {
    pub fn new<S: Into<String>>(suggestions: impl IntoIterator<Item = S>) -> Self {
        Self {
            suggestions: suggestions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    pub fn ignore_filter(mut self) -> Self {
        self.ignore_filter = true;
        self
    }

    /// Candidates matching `partial`, minus `chosen` when distinct, sorted and
    /// deduplicated.
    pub fn filter(&self, partial: &str, chosen: &[String]) -> Vec<String> {
        let lowered = partial.to_lowercase();
        let mut out: Vec<String> = self
            .suggestions
            .iter()
            .filter(|s| {
                self.ignore_filter
                    || if self.case_insensitive {
                        s.to_lowercase().starts_with(&lowered)
                    } else {
                        s.starts_with(partial)
                    }
            })
            .filter(|s| !self.distinct || !chosen.contains(s))
            .cloned()
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

/// Produces a completion for the partial word of one argument.
///
/// Returning `Ok(None)` means "nothing to suggest" and is not an error.
pub trait Completer {
    fn complete(&self, partial: &str, data: &Data, env: &Env) -> Result<Option<Completion>>;
}

/// A fixed candidate list is its own completer.
impl Completer for Completion {
    fn complete(&self, _partial: &str, _data: &Data, _env: &Env) -> Result<Option<Completion>> {
        Ok(Some(self.clone()))
    }
}

type CompleteFn = Rc<dyn Fn(&str, &Data) -> Result<Option<Completion>>>;

/// Completer backed by a closure.
#[derive(Clone)]
pub struct FuncCompleter {
    f: CompleteFn,
}

impl FuncCompleter {
    pub fn new(f: impl Fn(&str, &Data) -> Result<Option<Completion>> + 'static) -> Self {
        Self { f: Rc::new(f) }
    }
}

impl fmt::Debug for FuncCompleter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FuncCompleter")
    }
}

impl Completer for FuncCompleter {
    fn complete(&self, partial: &str, data: &Data, _env: &Env) -> Result<Option<Completion>> {
        (self.f)(partial, data)
    }
}

/// Completer whose candidates are the stdout lines of a bash snippet.
#[derive(Debug, Clone)]
pub struct BashCompleter {
    script: Vec<String>,
    distinct: bool,
}

impl BashCompleter {
    pub fn new<S: Into<String>>(script: impl IntoIterator<Item = S>) -> Self {
        Self {
            script: script.into_iter().map(Into::into).collect(),
            distinct: false,
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

impl Completer for BashCompleter {
    fn complete(&self, _partial: &str, _data: &Data, env: &Env) -> Result<Option<Completion>> {
        let lines = env.shell().run(&self.script)?;
        let suggestions: Vec<String> = lines
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if suggestions.is_empty() {
            return Ok(None);
        }
        Ok(Some(Completion {
            suggestions,
            distinct: self.distinct,
            ..Completion::default()
        }))
    }
}

/// Filesystem path completer.
///
/// Lists the directory named by the partial word (everything up to its last
/// `/`), relative to the injected working directory. Directories are suggested
/// with a trailing `/`. Hidden entries only show up once the partial file name
/// starts with a dot.
#[derive(Debug, Clone, Default)]
pub struct FileCompleter {
    dirs_only: bool,
    show_hidden: bool,
    distinct: bool,
}

impl FileCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dirs_only(mut self) -> Self {
        self.dirs_only = true;
        self
    }

    pub fn show_hidden(mut self) -> Self {
        self.show_hidden = true;
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

impl Completer for FileCompleter {
    fn complete(&self, partial: &str, _data: &Data, env: &Env) -> Result<Option<Completion>> {
        let (dir_part, base) = match partial.rfind('/') {
            Some(i) => partial.split_at(i + 1),
            None => ("", partial),
        };
        let dir = if dir_part.is_empty() {
            env.fs().current_dir()?
        } else {
            env.fs().absolute(Path::new(dir_part))?
        };

        let suggestions: Vec<String> = env
            .fs()
            .read_dir(&dir)?
            .into_iter()
            .filter(|e| !self.dirs_only || e.is_dir)
            .filter(|e| self.show_hidden || base.starts_with('.') || !e.name.starts_with('.'))
            .map(|e| {
                let slash = if e.is_dir { "/" } else { "" };
                format!("{}{}{}", dir_part, e.name, slash)
            })
            .collect();

        Ok(Some(Completion {
            suggestions,
            distinct: self.distinct,
            ..Completion::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{DirEntry, Filesystem};
    use std::io;
    use std::path::PathBuf;

    struct Tree;

    impl Filesystem for Tree {
        fn current_dir(&self) -> io::Result<PathBuf> {
            Ok(PathBuf::from("/work"))
        }

        fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
            match path.to_str() {
                Some("/work") => Ok(vec![
                    DirEntry::dir("docs"),
                    DirEntry::dir("dist"),
                    DirEntry::file("main.rs"),
                    DirEntry::file(".env"),
                ]),
                Some("/work/docs") => Ok(vec![DirEntry::file("guide.md")]),
                _ => Err(io::Error::new(io::ErrorKind::NotFound, "no such directory")),
            }
        }
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_filter_prefix_distinct_sorted() {
        let c = Completion::new(["beta", "alpha", "alps", "alpha"]).distinct();
        assert_eq!(c.filter("al", &[]), strings(&["alpha", "alps"]));
        assert_eq!(c.filter("al", &strings(&["alps"])), strings(&["alpha"]));
    }

    #[test]
    fn test_filter_case_insensitive_and_ignore() {
        let c = Completion::new(["Hello", "help"]).case_insensitive();
        assert_eq!(c.filter("HEL", &[]), strings(&["Hello", "help"]));
        let c = Completion::new(["x", "y"]).ignore_filter();
        assert_eq!(c.filter("zzz", &[]), strings(&["x", "y"]));
    }

    #[test]
    fn test_file_completer_lists_cwd() {
        let env = Env::new().with_filesystem(Tree);
        let c = FileCompleter::new()
            .complete("d", &Data::new(), &env)
            .unwrap()
            .unwrap();
        assert_eq!(c.filter("d", &[]), strings(&["dist/", "docs/"]));

        let all = FileCompleter::new()
            .complete("", &Data::new(), &env)
            .unwrap()
            .unwrap();
        assert_eq!(all.filter("", &[]), strings(&["dist/", "docs/", "main.rs"]));
    }

    #[test]
    fn test_file_completer_nested_and_hidden() {
        let env = Env::new().with_filesystem(Tree);
        let nested = FileCompleter::new()
            .complete("docs/g", &Data::new(), &env)
            .unwrap()
            .unwrap();
        assert_eq!(nested.filter("docs/g", &[]), strings(&["docs/guide.md"]));

        let hidden = FileCompleter::new()
            .complete(".", &Data::new(), &env)
            .unwrap()
            .unwrap();
        assert_eq!(hidden.filter(".", &[]), strings(&[".env"]));

        let dirs = FileCompleter::new()
            .dirs_only()
            .complete("", &Data::new(), &env)
            .unwrap()
            .unwrap();
        assert_eq!(dirs.filter("", &[]), strings(&["dist/", "docs/"]));
    }

    #[test]
    fn test_file_completer_missing_dir_errors() {
        let env = Env::new().with_filesystem(Tree);
        assert!(FileCompleter::new()
            .complete("nope/x", &Data::new(), &env)
            .is_err());
    }
}
