use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cmdgraph::builtin;
use cmdgraph::cache::FileCache;
use cmdgraph::config::Config;
use cmdgraph::logging::init_tracing;
use cmdgraph::output::StdOutput;
use cmdgraph::shell::{BashShell, ScriptFile};
use cmdgraph::shortcut::ShortcutTable;
use cmdgraph::{CommandError, Env, Runner, Verb};

#[derive(Parser, Debug)]
#[command(name = "cmdgraph")]
#[command(about = "Execute, complete or describe a declared command")]
#[command(version)]
struct Args {
    /// Path to config file (defaults to ~/.config/cmdgraph/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the generated script to this file for the calling shell to source
    #[arg(long, value_name = "PATH")]
    script_file: Option<PathBuf>,

    /// One of: execute, autocomplete, usage
    verb: String,

    /// Name of the CLI to run
    cli: String,

    /// Arguments for the CLI (for autocomplete: the completion line)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() {
    init_tracing();
    match run() {
        Ok(true) => {}
        // The runner already wrote the error to stderr.
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<bool> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load config")?;

    let verb: Verb = args.verb.parse()?;
    let cli = builtin::find(&args.cli).ok_or_else(|| CommandError::UnknownCli(args.cli.clone()))?;

    let env = match &args.script_file {
        Some(path) => Env::new().with_shell(ScriptFile::new(path)),
        None => Env::new().with_shell(BashShell::new(config.shell.program.clone())),
    };
    let shortcuts = ShortcutTable::from_config(&config);
    let mut cache = if config.cache.enabled && verb == Verb::Execute {
        Some(FileCache::load(config.cache.resolved_path())?)
    } else {
        None
    };

    let result = {
        let mut runner = Runner::new(&env).with_shortcuts(&shortcuts);
        if let Some(cache) = cache.as_mut() {
            runner = runner.with_cache(cache);
        }
        runner.run(cli.as_ref(), verb, args.args, &mut StdOutput)
    };

    if let Some(cache) = &cache {
        cache.save()?;
    }
    Ok(result.is_ok())
}
