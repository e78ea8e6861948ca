use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "localnote")]
#[command(about = "Local-first notes with swappable storage backends", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Storage root (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new note
    #[command(alias = "n")]
    New {
        /// Title of the note
        title: String,

        /// Content of the note
        #[arg(default_value = "")]
        content: String,
    },

    /// List notes, most recently updated first
    #[command(alias = "ls")]
    List {
        /// Only notes whose title contains this term
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show a note
    #[command(alias = "v")]
    Show {
        /// Note id
        id: String,
    },

    /// Update a note's title and/or content
    #[command(alias = "e")]
    Edit {
        /// Note id
        id: String,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New content
        #[arg(short, long)]
        content: Option<String>,
    },

    /// Delete a note
    #[command(alias = "rm")]
    Delete {
        /// Note id
        id: String,
    },

    /// Search note titles
    Search {
        term: String,
    },

    /// Show the available storage backends and which one is active
    Storage,

    /// Move all notes to a different backend
    Migrate {
        /// Target backend: indexed, kv, or directory
        target: String,
    },

    /// Write all notes to a backup file
    Export {
        /// Output path (defaults to localnote-backup-<date>.json)
        output: Option<PathBuf>,
    },

    /// Restore notes from a backup file
    Import {
        /// Backup file produced by `export`
        file: PathBuf,
    },

    /// Check that the active storage is readable
    Doctor,

    /// Show or change advisory settings
    Config {
        /// Enable or disable auto-backup
        #[arg(long)]
        auto_backup: Option<bool>,

        /// Auto-backup interval in milliseconds
        #[arg(long)]
        backup_interval: Option<u64>,
    },
}
