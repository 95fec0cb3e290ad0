//! Resolving abbreviated tokens to full values before execution.

mod common;

use std::rc::Rc;

use anyhow::bail;
use cmdgraph::output::BufferedOutput;
use cmdgraph::{
    execute, Argument, BashCompleter, CompleteForExecute, Completion, Data, Env, FuncCompleter,
    Input, Node,
};
use common::{run, run_with, suggestions, tokens, FakeShell};

fn greeting(policy: CompleteForExecute) -> Rc<Node> {
    Node::chain(vec![Argument::string("GREETING")
        .with_completer(Completion::new(["Hello", "Hello!", "HelloThere"]))
        .with_complete_for_execute(policy)
        .into()])
}

/// Execute and return the input tokens afterwards.
fn replayed(root: &Rc<Node>, args: &[&str]) -> (Vec<String>, Data) {
    let mut input = Input::new(tokens(args));
    let mut data = Data::new();
    execute(root, &mut input, &mut data, &Env::new(), &mut BufferedOutput::new()).unwrap();
    (input.tokens().to_vec(), data)
}

// =============================================================================
// SINGLE VALUES
// =============================================================================

#[test]
fn test_shared_prefix_is_ambiguous() {
    let (result, _) = run(&greeting(CompleteForExecute::new()), &["Hello"]);
    assert_eq!(
        result.unwrap_err().to_string(),
        "requires exactly one suggestion to be returned for \"GREETING\", got 3: [Hello Hello! HelloThere]"
    );
}

#[test]
fn test_exact_match_wins_when_allowed() {
    let root = greeting(CompleteForExecute::new().allow_exact_match());
    let (result, data) = run(&root, &["Hello"]);
    result.unwrap();
    assert_eq!(data.string("GREETING"), Some("Hello"));
}

#[test]
fn test_unique_prefix_is_written_back_into_the_input() {
    let (tokens, data) = replayed(&greeting(CompleteForExecute::new()), &["HelloT"]);
    assert_eq!(tokens, ["HelloThere"]);
    assert_eq!(data.string("GREETING"), Some("HelloThere"));
}

#[test]
fn test_no_candidate_is_a_nil_completion() {
    let (result, _) = run(&greeting(CompleteForExecute::new()), &["Bye"]);
    assert_eq!(
        result.unwrap_err().to_string(),
        "nil completion returned for \"GREETING\""
    );
}

#[test]
fn test_best_effort_keeps_the_raw_token() {
    let (tokens, data) = replayed(&greeting(CompleteForExecute::new().best_effort()), &["Hel"]);
    assert_eq!(tokens, ["Hel"]);
    assert_eq!(data.string("GREETING"), Some("Hel"));
}

#[test]
fn test_completer_failure_and_nil_result() {
    let failing = Node::chain(vec![Argument::string("X")
        .with_completer(FuncCompleter::new(|_, _| bail!("boom")))
        .with_complete_for_execute(CompleteForExecute::new())
        .into()]);
    let (result, _) = run(&failing, &["a"]);
    assert_eq!(
        result.unwrap_err().to_string(),
        "failed to fetch completion for \"X\": boom"
    );

    let empty = Node::chain(vec![Argument::string("X")
        .with_completer(FuncCompleter::new(|_, _| Ok(None)))
        .with_complete_for_execute(CompleteForExecute::new())
        .into()]);
    let (result, _) = run(&empty, &["a"]);
    assert_eq!(result.unwrap_err().to_string(), "nil completion returned for \"X\"");
}

#[test]
fn test_bash_completer_candidates() {
    let env = Env::new().with_shell(FakeShell::new().answer("compgen -e", &["HOME", "HOSTNAME", "PATH"]));
    let root = Node::chain(vec![Argument::string("VAR")
        .with_completer(BashCompleter::new(["compgen -e"]))
        .with_complete_for_execute(CompleteForExecute::new())
        .into()]);

    let (result, data, _) = run_with(&root, &["PA"], &env);
    result.unwrap();
    assert_eq!(data.string("VAR"), Some("PATH"));

    let (result, _, _) = run_with(&root, &["HO"], &env);
    assert_eq!(
        result.unwrap_err().to_string(),
        "requires exactly one suggestion to be returned for \"VAR\", got 2: [HOME HOSTNAME]"
    );
}

// =============================================================================
// LISTS
// =============================================================================

#[test]
fn test_only_the_last_popped_value_is_resolved() {
    let root = Node::chain(vec![Argument::string_list("W", 1, None)
        .with_completer(Completion::new(["alpha", "beta"]))
        .with_complete_for_execute(CompleteForExecute::new())
        .into()]);
    let (tokens, data) = replayed(&root, &["al", "be"]);
    assert_eq!(tokens, ["al", "beta"]);
    assert_eq!(data.strings("W").unwrap(), ["al", "beta"]);
}

#[test]
fn test_unfilled_slots_are_filled_when_unique() {
    let root = Node::chain(vec![Argument::string_list("PICK", 2, Some(0))
        .with_completer(Completion::new(["a1", "b1"]).distinct())
        .with_complete_for_execute(CompleteForExecute::new())
        .into()]);
    let (tokens, data) = replayed(&root, &["b"]);
    assert_eq!(tokens, ["b1", "a1"]);
    assert_eq!(data.strings("PICK").unwrap(), ["b1", "a1"]);
}

#[test]
fn test_best_effort_stops_at_the_first_unfillable_slot() {
    let root = Node::chain(vec![Argument::string_list("PICK", 3, Some(0))
        .with_completer(Completion::new(["a1", "b1", "c1"]).distinct())
        .with_complete_for_execute(CompleteForExecute::new().best_effort())
        .into()]);
    let (result, data) = run(&root, &["b"]);
    assert_eq!(
        result.unwrap_err().to_string(),
        "Argument \"PICK\" requires at least 3 arguments, got 1"
    );
    assert_eq!(data.strings("PICK").unwrap(), ["b1"]);
}

// =============================================================================
// DURING COMPLETION
// =============================================================================

#[test]
fn test_resolution_failures_are_ignored_while_completing() {
    let root = Node::chain(vec![
        Argument::string("FRUIT")
            .with_completer(Completion::new(["apple", "avocado"]))
            .with_complete_for_execute(CompleteForExecute::new())
            .into(),
        Argument::string("SIZE")
            .with_completer(Completion::new(["large", "small"]))
            .into(),
    ]);
    assert_eq!(suggestions(&root, &["a", ""]), ["large", "small"]);

    let (result, _) = run(&root, &["a", "small"]);
    assert!(result.is_err());
}
