use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use tutorsearch_cli::cli::Cli;
use tutorsearch_cli::{logging, pipeline};
use tutorsearch_core::config::AppConfig;
use tutorsearch_embed::load_embedder;
use tutorsearch_pinecone::PineconeClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let mut config = AppConfig::load()?;
    cli.apply(&mut config)?;

    let (embedder, index) = pipeline::start(&config, load_embedder, |api_key, pinecone| async move {
        let client = PineconeClient::new(&api_key, &pinecone)?;
        client.connect_index(&pinecone).await
    })
    .await?;

    let stdout = std::io::stdout();
    pipeline::run(&config, embedder.as_ref(), &index, &mut stdout.lock()).await
}
