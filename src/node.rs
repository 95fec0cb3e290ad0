//! Command graph: nodes, processors, edges and the structural combinators.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use anyhow::Result;

use crate::argument::{never, Argument, ListBreaker};
use crate::completion::Completion;
use crate::data::Data;
use crate::error::CommandError;
use crate::flag::FlagRegistry;
use crate::input::Input;
use crate::output::Output;
use crate::shell::BashCommand;
use crate::value::Value;
use crate::walker::{self, Completed, ExecutorFn, Mode, Step, Walk};

type LinesFn = Rc<dyn Fn(&Data) -> Result<Vec<String>>>;
type RouteFn = Rc<dyn Fn(&Input, &Data) -> Result<Option<Rc<Node>>>>;

// ============================================================================
// Processors
// ============================================================================

/// The work a node does when the walker reaches it.
#[derive(Clone)]
pub enum Processor {
    /// Match one positional argument.
    Arg(Argument),
    /// Pull registered flags out of the remaining input.
    Flags(FlagRegistry),
    /// Repeat a group of arguments.
    Repeat(Repeater),
    /// Append script lines built from the values so far (execute only).
    Lines(LinesFn),
    /// Register deferred work to run after a successful walk.
    Executor(ExecutorFn),
    /// Wrap the final script in a shell function.
    FunctionWrap,
    /// Store the output of a bash snippet.
    Bash(BashCommand),
    /// Usage text only.
    Description(String),
}

impl Processor {
    pub fn lines(f: impl Fn(&Data) -> Result<Vec<String>> + 'static) -> Self {
        Processor::Lines(Rc::new(f))
    }

    pub fn executor(f: impl Fn(&mut dyn Output, &Data) -> Result<()> + 'static) -> Self {
        Processor::Executor(Rc::new(f))
    }

    pub fn description(text: impl Into<String>) -> Self {
        Processor::Description(text.into())
    }

    pub(crate) fn process(&self, w: &mut Walk<'_>) -> Result<Step, CommandError> {
        match self {
            Processor::Arg(arg) => arg.process(w, &never),
            Processor::Flags(flags) => flags.process(w),
            Processor::Repeat(repeater) => repeater.process(w),
            Processor::Lines(f) => {
                if w.mode == Mode::Execute {
                    let lines = f(&*w.data).map_err(|e| CommandError::Execution(format!("{:#}", e)))?;
                    w.exec.executable.extend(lines);
                }
                Ok(Step::Continue)
            }
            Processor::Executor(f) => {
                if w.mode == Mode::Execute {
                    w.exec.executors.push(Rc::clone(f));
                }
                Ok(Step::Continue)
            }
            Processor::FunctionWrap => {
                w.exec.function_wrap = true;
                Ok(Step::Continue)
            }
            Processor::Bash(command) => command.process(w),
            Processor::Description(_) => Ok(Step::Continue),
        }
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Processor::Arg(arg) => f.debug_tuple("Arg").field(&arg.name()).finish(),
            Processor::Flags(flags) => f.debug_tuple("Flags").field(&flags.flags().len()).finish(),
            Processor::Repeat(_) => f.write_str("Repeat"),
            Processor::Lines(_) => f.write_str("Lines"),
            Processor::Executor(_) => f.write_str("Executor"),
            Processor::FunctionWrap => f.write_str("FunctionWrap"),
            Processor::Bash(command) => f.debug_tuple("Bash").field(&command.name()).finish(),
            Processor::Description(text) => f.debug_tuple("Description").field(text).finish(),
        }
    }
}

impl From<Argument> for Processor {
    fn from(arg: Argument) -> Self {
        Processor::Arg(arg)
    }
}

impl From<FlagRegistry> for Processor {
    fn from(flags: FlagRegistry) -> Self {
        Processor::Flags(flags)
    }
}

impl From<Repeater> for Processor {
    fn from(repeater: Repeater) -> Self {
        Processor::Repeat(repeater)
    }
}

impl From<BashCommand> for Processor {
    fn from(command: BashCommand) -> Self {
        Processor::Bash(command)
    }
}

// ============================================================================
// Nodes and edges
// ============================================================================

/// One step of a command graph. Immutable once built.
#[derive(Debug)]
pub struct Node {
    processor: Option<Processor>,
    edge: Option<Edge>,
}

impl Node {
    pub fn new(processor: Option<Processor>, edge: Option<Edge>) -> Rc<Self> {
        Rc::new(Self { processor, edge })
    }

    /// Linear chain of processors ending in a terminal node.
    pub fn chain(processors: Vec<Processor>) -> Rc<Self> {
        Self::link(processors, None)
    }

    /// Linear chain of processors whose last node continues through `edge`.
    pub fn chain_to(processors: Vec<Processor>, edge: Edge) -> Rc<Self> {
        Self::link(processors, Some(edge))
    }

    fn link(mut processors: Vec<Processor>, edge: Option<Edge>) -> Rc<Self> {
        let Some(last) = processors.pop() else {
            return Self::new(None, edge);
        };
        let mut node = Self::new(Some(last), edge);
        while let Some(processor) = processors.pop() {
            node = Self::new(Some(processor), Some(Edge::Next(node)));
        }
        node
    }

    pub fn processor(&self) -> Option<&Processor> {
        self.processor.as_ref()
    }

    pub fn edge(&self) -> Option<&Edge> {
        self.edge.as_ref()
    }
}

/// Where the walk goes after a node.
#[derive(Clone)]
pub enum Edge {
    Next(Rc<Node>),
    Branch(Branch),
    /// Pick the next node from the input and values so far; `None` ends the walk.
    Route(RouteFn),
}

pub(crate) enum Routed {
    Node(Rc<Node>),
    Stop,
    Suggest(Completed),
}

impl Edge {
    pub fn route(f: impl Fn(&Input, &Data) -> Result<Option<Rc<Node>>> + 'static) -> Self {
        Edge::Route(Rc::new(f))
    }

    pub(crate) fn next(&self, w: &mut Walk<'_>) -> Result<Routed, CommandError> {
        match self {
            Edge::Next(node) => Ok(Routed::Node(Rc::clone(node))),
            Edge::Branch(branch) => branch.next(w),
            Edge::Route(f) => match f(&*w.input, &*w.data) {
                Ok(Some(node)) => Ok(Routed::Node(node)),
                Ok(None) => Ok(Routed::Stop),
                Err(e) => Err(CommandError::Execution(format!("{:#}", e))),
            },
        }
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Next(_) => f.write_str("Next"),
            Edge::Branch(branch) => f.debug_tuple("Branch").field(&branch.keys()).finish(),
            Edge::Route(_) => f.write_str("Route"),
        }
    }
}

impl From<Branch> for Edge {
    fn from(branch: Branch) -> Self {
        Edge::Branch(branch)
    }
}

// ============================================================================
// Branch dispatch
// ============================================================================

/// Dispatch on one token: a keyword (or synonym) selects a sub-graph.
#[derive(Clone, Default)]
pub struct Branch {
    branches: BTreeMap<String, Rc<Node>>,
    synonyms: BTreeMap<String, String>,
    default: Option<Rc<Node>>,
}

impl Branch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_branch(mut self, key: impl Into<String>, node: Rc<Node>) -> Self {
        self.branches.insert(key.into(), node);
        self
    }

    /// Extra spellings that resolve onto `key`.
    pub fn with_synonyms<S: Into<String>>(
        mut self,
        key: impl Into<String>,
        synonyms: impl IntoIterator<Item = S>,
    ) -> Self {
        let key = key.into();
        for synonym in synonyms {
            self.synonyms.insert(synonym.into(), key.clone());
        }
        self
    }

    /// Node used when the token matches no key (the token is left in place).
    pub fn with_default(mut self, node: Rc<Node>) -> Self {
        self.default = Some(node);
        self
    }

    /// Branch keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.branches.keys().cloned().collect()
    }

    fn lookup(&self, token: &str) -> Option<&Rc<Node>> {
        self.branches.get(token).or_else(|| {
            self.synonyms
                .get(token)
                .and_then(|key| self.branches.get(key))
        })
    }

    fn next(&self, w: &mut Walk<'_>) -> Result<Routed, CommandError> {
        let snapshot = w.input.snapshot();
        let token = w.input.pop();

        if w.mode == Mode::Complete && token.is_some() && w.input.at_end() {
            w.input.restore(snapshot);
            return Ok(Routed::Suggest(self.suggest(w)));
        }

        if let Some(node) = token.as_deref().and_then(|t| self.lookup(t)) {
            w.input.release(snapshot);
            tracing::debug!(branch = token.as_deref().unwrap_or_default(), "branch taken");
            return Ok(Routed::Node(Rc::clone(node)));
        }

        w.input.restore(snapshot);
        match &self.default {
            Some(node) => Ok(Routed::Node(Rc::clone(node))),
            None => Err(CommandError::Branch { keys: self.keys() }),
        }
    }

    /// Keys matching the final word, merged with the default node's suggestions.
    fn suggest(&self, w: &mut Walk<'_>) -> Completed {
        let partial = w.input.peek().unwrap_or_default().to_string();
        let mut completed = match &self.default {
            Some(node) => walker::walk_from(node, w),
            None => Completed::default(),
        };
        completed
            .suggestions
            .extend(Completion::new(self.keys()).filter(&partial, &[]));
        completed.suggestions.sort();
        completed.suggestions.dedup();
        completed
    }
}

// ============================================================================
// Repeater
// ============================================================================

/// Repeats a group of arguments as a unit.
///
/// Runs while fewer than `min` iterations completed, or while the optional
/// bound (`None` = unbounded) is not reached and tokens remain. Each inner
/// argument keeps its own arity. Values accumulate into lists stored under
/// each inner argument's name.
#[derive(Debug, Clone)]
pub struct Repeater {
    arguments: Vec<Argument>,
    min: usize,
    optional: Option<usize>,
}

impl Repeater {
    pub fn new(arguments: Vec<Argument>, min: usize, optional: Option<usize>) -> Self {
        Self {
            arguments,
            min,
            optional,
        }
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn proceed(&self, count: usize, input: &Input) -> bool {
        if count < self.min {
            return true;
        }
        let bounded = self.optional.is_some_and(|o| count >= self.min + o);
        !bounded && !input.at_end()
    }

    fn process(&self, w: &mut Walk<'_>) -> Result<Step, CommandError> {
        let mut collected: Vec<Option<Value>> = vec![None; self.arguments.len()];
        let mut count = 0;

        while self.proceed(count, w.input) {
            let before = w.input.remaining().len();
            for (arg, slot) in self.arguments.iter().zip(collected.iter_mut()) {
                // The argument stores this iteration's value on its own.
                w.data.remove(arg.name());
                let step = arg.process(w, &never);
                let merged = match (slot.take(), w.data.remove(arg.name())) {
                    (None, None) => None,
                    (None, Some(value)) => Some(value.into_list()),
                    (Some(acc), None) => Some(acc),
                    (Some(acc), Some(value)) => Some(acc.append(value)?),
                };
                if let Some(merged) = &merged {
                    w.data.set(arg.name(), merged.clone());
                }
                *slot = merged;
                if let Step::Suggest(completed) = step? {
                    return Ok(Step::Suggest(completed));
                }
            }
            count += 1;
            // An iteration that consumed nothing would repeat forever.
            if w.input.remaining().len() == before && count >= self.min {
                break;
            }
        }
        tracing::debug!(iterations = count, "repeater finished");
        Ok(Step::Continue)
    }
}

/// Two lists separated by an operator token that is consumed but not kept.
pub fn operator_lists(left: Argument, operator: impl Into<String>, right: Argument) -> Vec<Processor> {
    vec![
        Processor::Arg(left.with_breaker(ListBreaker::until(operator).discard())),
        Processor::Arg(right),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Env;
    use crate::output::BufferedOutput;

    fn tokens(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn run(root: &Rc<Node>, args: &[&str]) -> (Result<walker::ExecuteData, CommandError>, Data) {
        let mut input = Input::new(tokens(args));
        let mut data = Data::new();
        let result = walker::execute(root, &mut input, &mut data, &Env::new(), &mut BufferedOutput::new());
        (result, data)
    }

    #[test]
    fn test_chain_links_in_order() {
        let root = Node::chain(vec![
            Argument::string("A").into(),
            Argument::string("B").into(),
        ]);
        assert!(matches!(root.processor(), Some(Processor::Arg(a)) if a.name() == "A"));
        let (result, data) = run(&root, &["x", "y"]);
        result.unwrap();
        assert_eq!(data.string("B"), Some("y"));
    }

    #[test]
    fn test_empty_chain_is_terminal() {
        let root = Node::chain(Vec::new());
        assert!(root.processor().is_none());
        assert!(root.edge().is_none());
    }

    #[test]
    fn test_branch_synonym_and_default() {
        let root = Node::new(
            None,
            Some(
                Branch::new()
                    .with_branch("one", Node::chain(vec![Processor::lines(|_| Ok(vec!["1".into()]))]))
                    .with_synonyms("one", ["uno"])
                    .with_default(Node::chain(vec![Argument::string("REST").into()]))
                    .into(),
            ),
        );
        let (result, _) = run(&root, &["uno"]);
        assert_eq!(result.unwrap().executable, ["1"]);

        let (result, data) = run(&root, &["other"]);
        result.unwrap();
        assert_eq!(data.string("REST"), Some("other"));
    }

    #[test]
    fn test_branch_without_default_lists_keys() {
        let root = Node::new(
            None,
            Some(
                Branch::new()
                    .with_branch("b", Node::chain(Vec::new()))
                    .with_branch("a", Node::chain(Vec::new()))
                    .into(),
            ),
        );
        let (result, _) = run(&root, &["c"]);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Branching argument must be one of [a b]"
        );
    }

    #[test]
    fn test_route_edge() {
        let target = Node::chain(vec![Processor::lines(|_| Ok(vec!["routed".into()]))]);
        let root = Node::chain_to(
            vec![Argument::string("X").into()],
            Edge::route(move |_, data| {
                Ok((data.string("X") == Some("go")).then(|| Rc::clone(&target)))
            }),
        );
        let (result, _) = run(&root, &["go"]);
        assert_eq!(result.unwrap().executable, ["routed"]);
        let (result, _) = run(&root, &["stay"]);
        assert!(result.unwrap().executable.is_empty());
    }

    #[test]
    fn test_operator_lists() {
        let root = Node::chain(operator_lists(
            Argument::string_list("LEFT", 1, None),
            "+",
            Argument::string_list("RIGHT", 1, None),
        ));
        let (result, data) = run(&root, &["a", "b", "+", "c"]);
        result.unwrap();
        assert_eq!(data.strings("LEFT").unwrap(), ["a", "b"]);
        assert_eq!(data.strings("RIGHT").unwrap(), ["c"]);
    }

    #[test]
    fn test_function_wrap() {
        let root = Node::chain(vec![
            Processor::FunctionWrap,
            Processor::lines(|_| Ok(vec!["local x=1".into()])),
        ]);
        let (result, _) = run(&root, &[]);
        let exec = result.unwrap();
        assert!(exec.function_wrap);
        assert_eq!(
            exec.script(),
            ["function _cmdgraph_execute {", "  local x=1", "}", "_cmdgraph_execute"]
        );
    }
}
