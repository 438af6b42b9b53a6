use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};

mod bookmarks;
mod cli;
mod config;
mod export;
mod optimize;
#[cfg(test)]
mod tests;

use bookmarks::{Bookmark, FolderNode};
use config::Config;
use optimize::RunReport;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = cli::Args::parse();

    match args.command {
        cli::Command::Optimize {
            input,
            output,
            tree,
            config,
        } => {
            let config = load_config(config)?;
            let bookmarks = load_bookmarks(&input)?;
            log::info!("read {} bookmarks from {}", bookmarks.len(), input.display());

            let optimized = optimize::run(&bookmarks, &config)?;

            export::write_export(&optimized.tree, &output)?;
            if let Some(tree_path) = tree {
                export::write_tree(&optimized.tree, &tree_path)?;
            }

            print_summary(&optimized.report, &input, &output);
            Ok(())
        }

        cli::Command::Preview { input, config } => {
            let config = load_config(config)?;
            let bookmarks = load_bookmarks(&input)?;

            let optimized = optimize::run(&bookmarks, &config)?;

            println!("Original Organization:");
            println!("=====================");
            let original = bookmarks::build_tree(&bookmarks);
            for bookmark in &original.bookmarks {
                println!("  - {} ({})", bookmark.title, bookmark.url);
            }
            for folder in &original.children {
                print_folder(folder, 0);
            }

            println!("\nOptimized Bookmark Organization:");
            println!("==============================");
            for folder in &optimized.tree.children {
                print_folder(folder, 0);
            }
            for warning in &optimized.report.warnings {
                println!("\nWarning: {warning}");
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(&path),
        None => Ok(Config::default()),
    }
}

fn load_bookmarks(path: &Path) -> anyhow::Result<Vec<Bookmark>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading bookmarks from {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("bookmarks file {} is malformed", path.display()))
}

fn print_folder(folder: &FolderNode, depth: usize) {
    let indent = "  ".repeat(depth);
    println!("{indent}{}/", folder.name);
    for bookmark in &folder.bookmarks {
        println!("{indent}  - {} ({})", bookmark.title, bookmark.url);
    }
    for child in &folder.children {
        print_folder(child, depth + 1);
    }
}

fn print_summary(report: &RunReport, input: &Path, output: &Path) {
    println!("\nProcessing Summary:");
    println!("==================");
    println!("Total bookmarks: {}", report.total_bookmarks);
    println!("Clustering: {}", report.strategy.as_str());
    println!("Topic groups: {}", report.cluster_count);
    println!("Promoted to quick access: {}", report.promoted);
    println!("Input file: {}", input.display());
    println!("Output file: {}", output.display());
    for warning in &report.warnings {
        println!("Warning: {warning}");
    }
}
