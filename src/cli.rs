use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reorganize a bookmark collection and write the structured export.
    Optimize {
        /// Extracted bookmarks JSON.
        #[clap(short, long)]
        input: PathBuf,

        /// Where the structured export is written.
        #[clap(short, long)]
        output: PathBuf,

        /// Also write the final folder tree in record shape
        /// (input for the HTML generator).
        #[clap(long)]
        tree: Option<PathBuf>,

        /// Config file. Created with defaults when missing.
        #[clap(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the reorganized tree without writing anything.
    Preview {
        /// Extracted bookmarks JSON.
        #[clap(short, long)]
        input: PathBuf,

        /// Config file. Created with defaults when missing.
        #[clap(short, long)]
        config: Option<PathBuf>,
    },
}
