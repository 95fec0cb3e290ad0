//! Declare a command's arguments once, then execute it, complete it in the
//! shell, or resolve abbreviated values before running it, all from the same
//! node graph.

pub mod argument;
pub mod builtin;
pub mod cache;
pub mod completion;
pub mod config;
pub mod data;
pub mod env;
pub mod error;
pub mod flag;
pub mod fs;
pub mod input;
pub mod logging;
pub mod node;
pub mod output;
pub mod resolve;
pub mod runner;
pub mod shell;
pub mod shortcut;
pub mod usage;
pub mod value;
pub mod walker;

pub use argument::{Argument, ListBreaker, Transformer, Validator};
pub use completion::{BashCompleter, Completer, Completion, FileCompleter, FuncCompleter};
pub use data::Data;
pub use env::Env;
pub use error::CommandError;
pub use flag::{Flag, FlagRegistry};
pub use input::Input;
pub use node::{operator_lists, Branch, Edge, Node, Processor, Repeater};
pub use resolve::CompleteForExecute;
pub use runner::{Cli, Runner, Verb};
pub use value::{Value, ValueType};
pub use walker::{complete, execute, Completed, ExecuteData};
