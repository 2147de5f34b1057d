use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stmtp")]
#[command(about = "Statement parser for a small GOTO/SWITCH language")]
pub struct Cli {
    /// Project file holding a [limits] table
    #[arg(long, global = true, default_value = "project.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a source file and print its statements
    Parse(ParseArgs),
}

#[derive(clap::Args)]
pub struct ParseArgs {
    /// Input file path
    pub file: PathBuf,

    /// Print the bound tree outline instead of the statement renderings
    #[arg(long)]
    pub tree: bool,

    /// Show node ids in the tree outline
    #[arg(long, requires = "tree")]
    pub ids: bool,

    /// Show parent ids in the tree outline
    #[arg(long, requires = "tree")]
    pub parents: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        let cli = Cli::try_parse_from(["stmtp", "parse", "main.stmt"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("project.toml"));
        let Commands::Parse(args) = cli.command;
        assert_eq!(args.file, PathBuf::from("main.stmt"));
        assert!(!args.tree);
    }

    #[test]
    fn test_tree_flags() {
        let cli = Cli::try_parse_from([
            "stmtp", "parse", "a.stmt", "--tree", "--ids", "--parents", "--config", "x.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("x.toml"));
        let Commands::Parse(args) = cli.command;
        assert!(args.tree && args.ids && args.parents);
    }

    #[test]
    fn test_ids_require_tree() {
        assert!(Cli::try_parse_from(["stmtp", "parse", "a.stmt", "--ids"]).is_err());
    }
}
