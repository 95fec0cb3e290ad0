//! One-line usage synopsis generated from a command graph.

use std::rc::Rc;

use crate::argument::Argument;
use crate::node::{Edge, Node, Processor};

/// Synopsis line followed by any description lines found along the chain.
///
/// Follows `Next` edges only; a branch is rendered as `{a|b}` and ends the
/// synopsis, a route as `...`.
pub fn usage(cli: &str, root: &Rc<Node>) -> Vec<String> {
    let mut words = vec![cli.to_string()];
    let mut descriptions = Vec::new();
    let mut node = Rc::clone(root);

    loop {
        match node.processor() {
            Some(Processor::Arg(arg)) => words.push(arg_usage(arg)),
            Some(Processor::Flags(flags)) => {
                for flag in flags.flags() {
                    let value = if flag.is_boolean() {
                        String::new()
                    } else {
                        format!(" {}", flag.name().to_uppercase())
                    };
                    let short = flag.short().map(|c| format!("|-{}", c)).unwrap_or_default();
                    words.push(format!("[{}{}{}]", flag.long(), short, value));
                }
            }
            Some(Processor::Repeat(repeater)) => {
                let inner: Vec<String> = repeater.arguments().iter().map(arg_usage).collect();
                words.push(format!("{{ {} }}...", inner.join(" ")));
            }
            Some(Processor::Description(text)) => descriptions.push(text.clone()),
            _ => {}
        }

        match node.edge() {
            Some(Edge::Next(next)) => node = Rc::clone(next),
            Some(Edge::Branch(branch)) => {
                words.push(format!("{{{}}}", branch.keys().join("|")));
                break;
            }
            Some(Edge::Route(_)) => {
                words.push("...".to_string());
                break;
            }
            None => break,
        }
    }

    let mut lines = vec![words.join(" ")];
    lines.extend(descriptions);
    lines
}

fn arg_usage(arg: &Argument) -> String {
    let name = arg.name();
    let mut parts: Vec<String> = std::iter::repeat(name.to_string()).take(arg.min()).collect();
    match arg.max() {
        None => parts.push(format!("[{} ...]", name)),
        Some(max) => {
            parts.extend(std::iter::repeat(format!("[{}]", name)).take(max.saturating_sub(arg.min())))
        }
    }
    parts.join(" ")
}
