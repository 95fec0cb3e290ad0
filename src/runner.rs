//! Verb dispatch over registered CLIs.
//!
//! Execute pipeline:
//! - Stage 1: seed tokens from the cache when a cacheable CLI is invoked bare
//! - Stage 2: expand a first-token shortcut
//! - Stage 3: walk the graph
//! - Stage 4: write the final tokens back to the cache if they changed
//! - Stage 5: hand the script to the shell

use std::rc::Rc;
use std::str::FromStr;

use crate::cache::Cache;
use crate::data::Data;
use crate::env::Env;
use crate::error::CommandError;
use crate::input::{parse_comp_line, Input};
use crate::node::Node;
use crate::output::Output;
use crate::shortcut::Shortcuts;
use crate::usage::usage;
use crate::walker::{self, Completed};

/// A named command with its graph.
pub trait Cli {
    fn name(&self) -> &str;

    fn node(&self) -> Rc<Node>;

    /// Replay the last successful tokens when invoked with none.
    fn cacheable(&self) -> bool {
        false
    }
}

/// Leading word of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Execute,
    Autocomplete,
    Usage,
}

impl FromStr for Verb {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "execute" => Ok(Verb::Execute),
            "autocomplete" => Ok(Verb::Autocomplete),
            "usage" => Ok(Verb::Usage),
            other => Err(CommandError::UnknownVerb(other.to_string())),
        }
    }
}

/// Runs CLIs against injected collaborators.
pub struct Runner<'a> {
    env: &'a Env,
    cache: Option<&'a mut dyn Cache>,
    shortcuts: Option<&'a dyn Shortcuts>,
}

impl<'a> Runner<'a> {
    pub fn new(env: &'a Env) -> Self {
        Self {
            env,
            cache: None,
            shortcuts: None,
        }
    }

    pub fn with_cache(mut self, cache: &'a mut dyn Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_shortcuts(mut self, shortcuts: &'a dyn Shortcuts) -> Self {
        self.shortcuts = Some(shortcuts);
        self
    }

    /// Dispatch one invocation. Failures are also written to stderr.
    ///
    /// For `autocomplete`, `args` are joined back into the completion line.
    pub fn run(
        &mut self,
        cli: &dyn Cli,
        verb: Verb,
        args: Vec<String>,
        out: &mut dyn Output,
    ) -> Result<(), CommandError> {
        tracing::info!(cli = cli.name(), ?verb, "invocation");
        match verb {
            Verb::Execute => self.execute(cli, args, out).map(|_| ()),
            Verb::Autocomplete => match self.autocomplete(cli, &args.join(" "), out).error {
                Some(e) => Err(e),
                None => Ok(()),
            },
            Verb::Usage => {
                self.usage(cli, out);
                Ok(())
            }
        }
    }

    /// Execute `cli` with `args`, returning the values it committed.
    pub fn execute(
        &mut self,
        cli: &dyn Cli,
        args: Vec<String>,
        out: &mut dyn Output,
    ) -> Result<Data, CommandError> {
        let result = self.execute_inner(cli, args, out);
        if let Err(e) = &result {
            out.stderr(&e.to_string());
        }
        result
    }

    fn execute_inner(
        &mut self,
        cli: &dyn Cli,
        mut args: Vec<String>,
        out: &mut dyn Output,
    ) -> Result<Data, CommandError> {
        // Stage 1: cache seed
        let cacheable = cli.cacheable();
        if cacheable && args.is_empty() {
            if let Some(saved) = self
                .cache
                .as_mut()
                .and_then(|cache| cache.cache().get(cli.name()).cloned())
            {
                tracing::info!(cli = cli.name(), tokens = saved.len(), "replaying cached args");
                args = saved;
            }
        }

        // Stage 2: shortcut
        let mut input = self.input_for(cli, args);

        // Stage 3: walk
        let mut data = Data::new();
        let exec = walker::execute(&cli.node(), &mut input, &mut data, self.env, out)?;

        // Stage 4: cache write-back
        if cacheable {
            if let Some(cache) = self.cache.as_mut() {
                let tokens = input.tokens().to_vec();
                if cache.cache().get(cli.name()) != Some(&tokens) {
                    cache.cache().insert(cli.name().to_string(), tokens);
                    cache.mark_changed();
                }
            }
        }

        // Stage 5: script
        let script = exec.script();
        if !script.is_empty() {
            let lines = self
                .env
                .shell()
                .run(&script)
                .map_err(|e| CommandError::Execution(format!("{:#}", e)))?;
            for line in lines {
                out.stdout(&line);
            }
        }
        Ok(data)
    }

    /// Complete `comp_line` (the whole line, command word included) and write
    /// one suggestion per stdout line.
    pub fn autocomplete(&self, cli: &dyn Cli, comp_line: &str, out: &mut dyn Output) -> Completed {
        let mut words = parse_comp_line(comp_line);
        // The command word itself.
        words.remove(0);
        if words.is_empty() {
            return Completed::default();
        }

        let mut input = if words.len() > 1 {
            self.input_for(cli, words)
        } else {
            Input::new(words)
        };
        let completed = walker::complete(&cli.node(), &mut input, &mut Data::new(), self.env);
        for suggestion in &completed.suggestions {
            out.stdout(suggestion);
        }
        if let Some(e) = &completed.error {
            out.stderr(&e.to_string());
        }
        completed
    }

    pub fn usage(&self, cli: &dyn Cli, out: &mut dyn Output) {
        for line in usage(cli.name(), &cli.node()) {
            out.stdout(&line);
        }
    }

    /// Input for `tokens` with a first-token shortcut expanded in place.
    fn input_for(&self, cli: &dyn Cli, mut tokens: Vec<String>) -> Input {
        let expansion = match (self.shortcuts, tokens.first()) {
            (Some(shortcuts), Some(first)) => shortcuts.expand(cli.name(), first),
            _ => None,
        };
        let Some(expansion) = expansion else {
            return Input::new(tokens);
        };
        tracing::debug!(shortcut = %tokens[0], tokens = ?expansion, "shortcut expanded");
        tokens.remove(0);
        let mut input = Input::new(tokens);
        input.push_front(expansion);
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_from_str() {
        assert_eq!("execute".parse::<Verb>().unwrap(), Verb::Execute);
        assert_eq!("autocomplete".parse::<Verb>().unwrap(), Verb::Autocomplete);
        assert_eq!("usage".parse::<Verb>().unwrap(), Verb::Usage);
        assert_eq!(
            "run".parse::<Verb>().unwrap_err().to_string(),
            "unknown verb \"run\" (expected execute, autocomplete or usage)"
        );
    }
}
