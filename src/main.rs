mod cli;

use clap::Parser;
use cli::{Cli, Commands, ParseArgs};
use std::fs;
use std::path::Path;
use stmt_parse::{CompilerLimits, DumpFlags};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Parse(args) => run_parse(&args, &cli.config),
    }
}

// RUST_LOG controls verbosity; warnings and up by default
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

fn run_parse(args: &ParseArgs, config: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let limits = CompilerLimits::from_project_toml(config)?;
    limits.validate()?;

    let source = fs::read_to_string(&args.file)
        .map_err(|e| format!("Failed to read {}: {}", args.file.display(), e))?;

    let mut ast = stmt_parse::parse_source(&source, &limits)?;
    ast.bind_program();
    tracing::info!(
        target: "stmt_parse::cli",
        file = %args.file.display(),
        statements = ast.program.len(),
        nodes = ast.len(),
        "parsed"
    );

    if args.tree {
        let mut flags = DumpFlags::empty();
        if args.ids {
            flags |= DumpFlags::IDS;
        }
        if args.parents {
            flags |= DumpFlags::PARENTS;
        }
        print!("{}", ast.to_tree_string(flags));
    } else if !ast.program.is_empty() {
        println!("{}", ast.render_program());
    }

    Ok(())
}
