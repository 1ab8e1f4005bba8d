use clap::{ArgAction, Parser};

use tutorsearch_core::config::AppConfig;
use tutorsearch_core::error::Error;
use tutorsearch_core::filter::parse_assignment;

/// Search the math-tutor exercise index with a sentence embedding.
#[derive(Debug, Parser)]
#[command(name = "tutorsearch", version, about, long_about = None)]
pub struct Cli {
    /// Query text to embed (defaults to `search.query` from config).
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    /// Query text, as a flag instead of the positional argument.
    #[arg(long = "query", value_name = "TEXT", conflicts_with = "query")]
    pub query_flag: Option<String>,

    /// Number of matches to request.
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Metadata equality filter; repeatable. Replaces the configured filter.
    #[arg(long = "filter", value_name = "FIELD=VALUE")]
    pub filters: Vec<String>,

    /// Query without any metadata filter.
    #[arg(long, conflicts_with = "filters")]
    pub no_filter: bool,

    /// Index name (overrides `pinecone.index_name`).
    #[arg(long)]
    pub index: Option<String>,

    /// Namespace inside the index.
    #[arg(long)]
    pub namespace: Option<String>,

    /// Detailed logs (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply(&self, config: &mut AppConfig) -> Result<(), Error> {
        if let Some(query) = self.query.as_ref().or(self.query_flag.as_ref()) {
            config.search.query.clone_from(query);
        }
        if let Some(top_k) = self.top_k {
            config.search.top_k = top_k;
        }
        if self.no_filter {
            config.search.filter.clear();
        } else if !self.filters.is_empty() {
            config.search.filter = self
                .filters
                .iter()
                .map(|raw| parse_assignment(raw))
                .collect::<Result<_, _>>()?;
        }
        if let Some(index) = &self.index {
            config.pinecone.index_name.clone_from(index);
        }
        if let Some(namespace) = &self.namespace {
            config.pinecone.namespace = Some(namespace.clone());
        }
        config.validate()
    }
}
