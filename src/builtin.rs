//! CLIs shipped with the binary.

use std::rc::Rc;

use anyhow::{bail, Context};

use crate::argument::{Argument, Transformer, Validator};
use crate::completion::{BashCompleter, FileCompleter};
use crate::flag::{Flag, FlagRegistry};
use crate::node::{Branch, Node, Processor, Repeater};
use crate::resolve::CompleteForExecute;
use crate::runner::Cli;
use crate::shell::quote;

/// Every built-in CLI.
pub fn builtin_clis() -> Vec<Box<dyn Cli>> {
    vec![Box::new(Goto), Box::new(EnvVar)]
}

/// Look up a built-in CLI by name.
pub fn find(name: &str) -> Option<Box<dyn Cli>> {
    builtin_clis().into_iter().find(|cli| cli.name() == name)
}

/// `goto [--print|-p] DIR`: change to a directory, abbreviations allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Goto;

impl Cli for Goto {
    fn name(&self) -> &str {
        "goto"
    }

    fn cacheable(&self) -> bool {
        true
    }

    fn node(&self) -> Rc<Node> {
        Node::chain(vec![
            Processor::description("Change to a directory. Unique prefixes are expanded."),
            FlagRegistry::new(vec![Flag::boolean("print")
                .with_short('p')
                .with_description("Print the directory instead of changing to it")])
            .into(),
            Argument::string("DIR")
                .with_description("Directory to change to")
                .with_completer(FileCompleter::new().dirs_only())
                .with_complete_for_execute(CompleteForExecute::new().allow_exact_match().best_effort())
                .with_transformer(Transformer::absolute_path())
                .into(),
            Processor::lines(|data| {
                let dir = data.string("DIR").context("DIR is not set")?;
                let verb = if data.boolean("print") { "echo" } else { "cd" };
                Ok(vec![format!("{} {}", verb, quote(dir))])
            }),
        ])
    }
}

/// `envvar {set|unset|show}`: manage variables of the calling shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvVar;

fn env_name_validator() -> Validator {
    Validator::new("EnvName", |value, _| {
        for name in value.to_tokens() {
            let mut chars = name.chars();
            let valid_start = chars
                .next()
                .is_some_and(|c| c == '_' || c.is_ascii_alphabetic());
            if !valid_start || !chars.all(|c| c == '_' || c.is_ascii_alphanumeric()) {
                bail!("{:?} is not a valid variable name", name);
            }
        }
        Ok(())
    })
}

fn env_names() -> BashCompleter {
    BashCompleter::new(["compgen -e"]).distinct()
}

impl Cli for EnvVar {
    fn name(&self) -> &str {
        "envvar"
    }

    fn node(&self) -> Rc<Node> {
        let set = Node::chain(vec![
            Repeater::new(
                vec![
                    Argument::string("NAME").with_validator(env_name_validator()),
                    Argument::string("VALUE"),
                ],
                1,
                None,
            )
            .into(),
            Processor::lines(|data| {
                let names = data.strings("NAME").unwrap_or_default();
                let values = data.strings("VALUE").unwrap_or_default();
                Ok(names
                    .iter()
                    .zip(values)
                    .map(|(name, value)| format!("export {}={}", name, quote(value)))
                    .collect())
            }),
        ]);

        let unset = Node::chain(vec![
            Argument::string_list("NAME", 1, None)
                .with_validator(env_name_validator())
                .with_completer(env_names())
                .with_complete_for_execute(CompleteForExecute::new().allow_exact_match().best_effort())
                .into(),
            Processor::lines(|data| {
                let names = data.strings("NAME").unwrap_or_default();
                Ok(vec![format!("unset {}", names.join(" "))])
            }),
        ]);

        let show = Node::chain(vec![
            Argument::string("NAME")
                .with_completer(env_names())
                .with_complete_for_execute(CompleteForExecute::new().allow_exact_match())
                .into(),
            Processor::executor(|out, data| {
                let name = data.string("NAME").context("NAME is not set")?;
                match std::env::var(name) {
                    Ok(value) => out.stdout(&format!("{}={}", name, value)),
                    Err(_) => bail!("{} is not set", name),
                }
                Ok(())
            }),
        ]);

        Node::chain_to(
            vec![Processor::description("Set, unset or show environment variables.")],
            Branch::new()
                .with_branch("set", set)
                .with_branch("unset", unset)
                .with_synonyms("unset", ["rm"])
                .with_branch("show", show)
                .with_synonyms("show", ["get"])
                .into(),
        )
    }
}
