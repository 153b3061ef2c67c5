// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! End-to-end run: fetch, aggregate, compare, render and publish.
//!
//! Steps run strictly one after another. The publisher's clone is removed on
//! every exit path, including failures of any intermediate step.

use std::{fmt, fs, io::ErrorKind, path::Path};

use chrono::{DateTime, Local, TimeZone};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::{
    aggregate::{LanguageAggregator, LanguageDistribution},
    chart::{ChartRenderer, Theme},
    config::Config,
    error::{self, Error},
    git::VersionControl,
    github::{GithubClient, Transport},
    publish::Publisher,
    snapshot::{has_changed, load_snapshot, write_snapshot},
};

/// Run-level switches supplied by the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq,)]
pub struct PipelineOptions
{
    /// Render and copy artifacts even when the statistics are unchanged.
    pub force_render: bool,
    /// Stop before committing and pushing.
    pub skip_publish: bool,
}

/// How a completed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum Outcome
{
    /// New artifacts were committed and pushed.
    Published,
    /// Nothing new reached the destination: either the statistics match the
    /// published snapshot, or a forced run rendered identical artifacts.
    Unchanged,
    /// Artifacts were rendered but publishing was disabled.
    PublishSkipped,
}

impl Outcome
{
    /// One-line summary for the user.
    pub fn message(self,) -> &'static str
    {
        match self {
            Self::Published => "Destination repository has been successfully updated.",
            Self::Unchanged => {
                "Destination repository has NOT been updated, because stats did not change."
            }
            Self::PublishSkipped => {
                "Destination repository has NOT been updated, because --skip-publish was used."
            }
        }
    }
}

impl fmt::Display for Outcome
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(self.message(),)
    }
}

/// Executes one run and removes the local clone afterwards.
///
/// # Arguments
///
/// * `config` - Validated configuration
/// * `client` - API client used for the listing and language endpoints
/// * `publisher` - Idle publisher owning the clone directory
/// * `renderer` - Chart renderer invoked once per [`Theme`]
/// * `options` - Force and skip switches
///
/// # Errors
///
/// Returns the first error of any step. Cleanup runs regardless; a cleanup
/// failure is reported only when the run itself succeeded.
pub async fn run_pipeline<T, V, R,>(
    config: &Config,
    client: &GithubClient<T,>,
    publisher: &mut Publisher<V,>,
    renderer: &R,
    options: PipelineOptions,
) -> Result<Outcome, Error,>
where
    T: Transport,
    V: VersionControl,
    R: ChartRenderer,
{
    let result = execute(config, client, publisher, renderer, options,).await;
    let cleanup = publisher.cleanup();

    match (result, cleanup,) {
        (Ok(outcome,), Ok((),),) => Ok(outcome,),
        (Ok(_,), Err(error,),) => Err(error,),
        (Err(error,), Ok((),),) => Err(error,),
        (Err(error,), Err(cleanup_error,),) => {
            warn!("Cleanup after failed run also failed: {}", cleanup_error);
            Err(error,)
        }
    }
}

async fn execute<T, V, R,>(
    config: &Config,
    client: &GithubClient<T,>,
    publisher: &mut Publisher<V,>,
    renderer: &R,
    options: PipelineOptions,
) -> Result<Outcome, Error,>
where
    T: Transport,
    V: VersionControl,
    R: ChartRenderer,
{
    let distribution = collect_distribution(config, client,).await?;

    let output = config.output.directory.as_path();
    recreate_directory(output,)?;
    write_snapshot(&config.output.stats_path(), &distribution,)?;

    publisher.clone_repository()?;
    let published = publisher.artifact_directory().join(&config.output.stats_file,);
    let changed = has_changed(&load_snapshot(&published,), &distribution,);

    if !changed && !options.force_render {
        info!("Statistics unchanged, skipping render and publish");
        return Ok(Outcome::Unchanged,);
    }
    if !changed {
        info!("Statistics unchanged, rendering anyway (--force)");
    }

    for theme in Theme::ALL {
        let path = output.join(theme.file_name(),);
        renderer.render(&config.chart.title, &distribution.percentage, theme, &path,)?;
        info!("Chart saved to {}", path.display());
    }

    publisher.copy_artifacts(output,)?;

    if options.skip_publish {
        info!("Publishing disabled, leaving destination repository untouched");
        return Ok(Outcome::PublishSkipped,);
    }

    let message = commit_message(&config.publish.commit_message, &Local::now(),);
    if !publisher.commit(&message,)? {
        return Ok(Outcome::Unchanged,);
    }
    publisher.push()?;
    Ok(Outcome::Published,)
}

async fn collect_distribution<T: Transport,>(
    config: &Config,
    client: &GithubClient<T,>,
) -> Result<LanguageDistribution, Error,>
{
    let repositories = client.list_repositories(config.github.page_size,).await?;

    let rules = config.languages.rules();
    let mut aggregator = LanguageAggregator::new(&rules,);

    let pb = ProgressBar::new_spinner();
    if let Ok(style,) =
        ProgressStyle::default_spinner().template("{spinner:.yellow} [{elapsed_precise}] {msg}",)
    {
        pb.set_style(style,);
    }

    for (index, repository,) in repositories.iter().enumerate() {
        pb.set_message(format!(
            "Fetching languages {}/{}: {}",
            index + 1,
            repositories.len(),
            repository
        ),);
        let languages = client.fetch_language_bytes(&repository.full_name,).await?;
        debug!("Processed {} ({} languages)", repository, languages.len());
        aggregator.add(&languages,);
    }

    let distribution = aggregator.finish();
    pb.finish_with_message(format!(
        "Aggregated {} languages from {} repositories",
        distribution.percentage.len(),
        repositories.len()
    ),);
    info!(
        "Aggregated {} bytes across {} languages",
        distribution.total_bytes,
        distribution.percentage.len()
    );
    Ok(distribution,)
}

fn recreate_directory(directory: &Path,) -> Result<(), Error,>
{
    match fs::remove_dir_all(directory,) {
        Ok((),) => debug!("Removed previous output at {}", directory.display()),
        Err(source,) if source.kind() == ErrorKind::NotFound => {}
        Err(source,) => return Err(error::io_error(directory, source,),),
    }
    fs::create_dir_all(directory,).map_err(|source| error::io_error(directory, source,),)
}

/// Appends a `YYYY-MM-DD HH:MM` timestamp to the configured message.
pub fn commit_message<Tz,>(template: &str, now: &DateTime<Tz,>,) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    format!("{} {}", template.trim_end(), now.format("%Y-%m-%d %H:%M"))
}
