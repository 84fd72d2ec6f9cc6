use std::sync::Arc;

use clap::Parser;

mod cli;
mod config;
mod embedder;
mod jobs;
mod providers;
mod recommend;
mod store;
#[cfg(test)]
mod tests;

use config::Config;
use embedder::GeminiEmbedder;
use providers::{ProviderRegistry, SearchParams};
use recommend::Recommender;
use store::VectorStore;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = cli::Args::parse();
    let config = Config::load(args.data_dir.clone())?;

    match args.command {
        cli::Command::Fetch {
            skill,
            preference,
            experience,
            location,
            job_type,
            max_results,
            ingest,
            no_serpapi,
            no_jsearch,
        } => {
            let mut providers_config = config.providers.clone();
            if no_serpapi {
                providers_config.serpapi = false;
            }
            if no_jsearch {
                providers_config.jsearch = false;
            }

            let registry = ProviderRegistry::from_env(&providers_config);
            if registry.is_empty() {
                anyhow::bail!(
                    "no listing providers available; set SERPAPI_KEY and/or RAPIDAPI_KEY"
                );
            }

            let params = SearchParams {
                skills: skill,
                preferences: preference,
                experience,
                location,
                job_type,
                max_results: max_results.unwrap_or(providers_config.max_results),
            };

            let found = registry.aggregate(&params);
            if found.is_empty() {
                println!("no jobs found");
                return Ok(());
            }

            if ingest {
                let recommender = build_recommender(&config)?;
                let count = recommender.ingest(&found)?;
                println!("indexed {count} jobs");
            } else {
                println!("{}", serde_json::to_string_pretty(&found)?);
            }
        }

        cli::Command::Ingest { file } => {
            let found = jobs::read_jobs_file(&file)?;
            let recommender = build_recommender(&config)?;
            let count = recommender.ingest(&found)?;
            println!("indexed {count} jobs from {}", file.display());
        }

        cli::Command::Recommend { query, top_k } => {
            let recommender = build_recommender(&config)?;
            let results = recommender.recommend(&query, top_k)?;
            if results.is_empty() {
                println!("no matching jobs found");
            } else {
                println!("{}", serde_json::to_string_pretty(&results)?);
            }
        }
    }

    Ok(())
}

/// Construct the embedder once and wire it through the store. Missing
/// credentials fail here, before any pipeline work starts.
fn build_recommender(config: &Config) -> anyhow::Result<Recommender> {
    let embedder = Arc::new(GeminiEmbedder::new(&config.embedding)?);
    let store = VectorStore::new(config.index_path(), embedder);
    Ok(Recommender::new(store))
}
