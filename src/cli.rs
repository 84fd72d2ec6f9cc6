use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Semantic job search over multi-source listings", long_about = None)]
pub struct Args {
    /// Data directory (config and index), defaults to ~/.config/jobscout
    #[clap(long)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch live postings from the enabled listing providers
    Fetch {
        /// Skills to search for (repeatable)
        #[clap(short, long)]
        skill: Vec<String>,

        /// Preferences, e.g. "remote" (repeatable)
        #[clap(short, long)]
        preference: Vec<String>,

        /// Free-text experience summary
        #[clap(short, long, default_value = "")]
        experience: String,

        /// Location filter
        #[clap(short, long, default_value = "")]
        location: String,

        /// Employment type filter, e.g. FULLTIME, INTERN
        #[clap(short, long, default_value = "")]
        job_type: String,

        /// Cap on results per provider (config default when omitted)
        #[clap(long)]
        max_results: Option<usize>,

        /// Index the fetched jobs instead of printing them
        #[clap(long, default_value = "false")]
        ingest: bool,

        /// Skip the SerpAPI provider
        #[clap(long, default_value = "false")]
        no_serpapi: bool,

        /// Skip the JSearch provider
        #[clap(long, default_value = "false")]
        no_jsearch: bool,
    },

    /// Index jobs from a CSV or JSON file
    Ingest {
        /// Path to a .csv (headered) or .json (array of jobs) file
        file: PathBuf,
    },

    /// Recommend indexed jobs for a free-text query
    Recommend {
        /// What you are looking for: skills, preferences, experience
        query: String,

        /// Number of recommendations
        #[clap(short = 'k', long, default_value = "5")]
        top_k: usize,
    },
}
