//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Hierarchical reference-code management
#[derive(Parser, Debug)]
#[command(name = "codetree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Code store file (default: from config)
    #[arg(long, global = true, env = "CODETREE_DATA_FILE", value_hint = ValueHint::FilePath)]
    pub data_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a code
    Create {
        /// Natural key, unique and immutable
        code: String,
        /// Display name
        #[arg(short, long)]
        name: String,
        /// Parent code id (omit for a root code)
        #[arg(short, long)]
        parent: Option<i64>,
        /// Position among siblings (0 appends)
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        seq: i32,
        /// Free text
        #[arg(long)]
        description: Option<String>,
    },

    /// Update a code; unspecified fields keep their current value
    Update {
        /// Code id
        id: i64,
        /// Display name
        #[arg(short, long)]
        name: Option<String>,
        /// Move below this parent id
        #[arg(short, long, conflicts_with = "root")]
        parent: Option<i64>,
        /// Move to the root group
        #[arg(long)]
        root: bool,
        /// Position among siblings
        #[arg(short, long, allow_negative_numbers = true)]
        seq: Option<i32>,
        /// Free text
        #[arg(long)]
        description: Option<String>,
        /// Soft-delete the code
        #[arg(long)]
        delete: bool,
    },

    /// Show a code by id
    Get {
        /// Code id
        id: i64,
        /// Include the subtree
        #[arg(short, long)]
        children: bool,
    },

    /// Show a code and its subtree by natural key (root codes are cached)
    Lookup {
        /// Natural key
        code: String,
    },

    /// List codes page by page
    List {
        /// Exact natural key
        #[arg(long)]
        code: Option<String>,
        /// Name substring (case-insensitive)
        #[arg(long)]
        name: Option<String>,
        /// Only children of this parent id
        #[arg(short, long, conflicts_with = "roots")]
        parent: Option<i64>,
        /// Only root codes
        #[arg(long)]
        roots: bool,
        /// Include soft-deleted codes
        #[arg(long)]
        include_deleted: bool,
        /// Zero-based page
        #[arg(long, default_value_t = 0)]
        page: usize,
        /// Page size (default: from config)
        #[arg(long)]
        size: Option<usize>,
        /// Include subtrees
        #[arg(short, long)]
        children: bool,
    },

    /// Show every root code with its subtree
    Tree,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Show config file locations
    Path,
    /// Print a commented template
    Template,
}
