use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::Engine;

#[derive(Parser)]
#[command(name = "spec-recon")]
#[command(about = "Reverse-engineers API specifications from legacy Controller/Service/Mapper codebases")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a codebase and generate API documentation
    Analyze {
        /// Source directory to analyze (overrides config)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Output directory for reports (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Comma-separated report formats (csv, html, openapi)
        #[arg(short, long)]
        formats: Option<String>,
    },

    /// Write a default configuration file
    Init {
        /// Target directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

impl Cli {
    pub fn execute(self, mut engine: Engine) -> Result<()> {
        match self.command {
            Commands::Analyze {
                source,
                output,
                formats,
            } => engine.analyze(source, output, formats),
            Commands::Init { path } => engine.init(path),
        }
    }
}
