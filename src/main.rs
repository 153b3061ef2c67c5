//! Command-line interface for the langstat binary.
//!
//! A single invocation performs one full run: fetch statistics, compare them
//! with the published snapshot and, when needed, render and publish charts.

use std::{path::PathBuf, process};

use clap::{ArgAction, Parser};
use langstat::{
    Config, Error, GitCli, GithubClient, OctocrabTransport, Outcome, PipelineOptions,
    PublishTarget, Publisher, Secret, SvgBarChart, load_config, run_pipeline,
};
use tracing_subscriber::EnvFilter;

/// Command line interface for refreshing language usage charts.
#[derive(Debug, Parser,)]
#[command(name = "langstat", version, about = "Publish GitHub language usage charts")]
struct Cli
{
    /// Path to the YAML configuration file.
    #[arg(long = "config", value_name = "PATH")]
    config: PathBuf,

    /// Render and copy charts even when the statistics did not change.
    #[arg(short = 'n', long = "force", action = ArgAction::SetTrue)]
    force: bool,

    /// Skip committing and pushing to the destination repository.
    #[arg(short = 'd', long = "skip-publish", action = ArgAction::SetTrue)]
    skip_publish: bool,

    /// Access token overriding the one stored in the configuration.
    #[arg(long = "token", env = "GH_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    token: Option<String,>,
}

impl Cli
{
    fn options(&self,) -> PipelineOptions
    {
        PipelineOptions {
            force_render: self.force,
            skip_publish: self.skip_publish,
        }
    }
}

/// Entry point that reports errors and sets the appropriate exit status.
fn main()
{
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info",),),)
        .with_writer(std::io::stderr,)
        .init();

    match run() {
        Ok(outcome,) => println!("{outcome}"),
        Err(error,) => {
            eprintln!("{}", error.to_display_string());
            process::exit(1,);
        }
    }
}

/// Parses arguments and drives one run on a single-threaded runtime.
///
/// # Errors
///
/// Propagates configuration, API and publishing errors.
fn run() -> Result<Outcome, Error,>
{
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::service(format!("failed to start async runtime: {e}"),),)?;

    runtime.block_on(execute(cli,),)
}

async fn execute(cli: Cli,) -> Result<Outcome, Error,>
{
    let config = load_config(&cli.config,)?;
    let token = config.resolve_token(cli.token.clone().map(Secret::new,),)?;

    let client = build_client(&config, &token,)?;
    let mut publisher = Publisher::new(
        GitCli::new(config.publish.committer.clone(),),
        PublishTarget::from_config(&config, token,),
    );

    run_pipeline(&config, &client, &mut publisher, &SvgBarChart, cli.options(),).await
}

fn build_client(config: &Config, token: &Secret,) -> Result<GithubClient<OctocrabTransport,>, Error,>
{
    let transport = OctocrabTransport::new(token,)?;
    Ok(GithubClient::new(
        transport,
        &config.github.api_base_url,
        config.github.repository_type,
        config.github.retry.policy(),
    ),)
}
