//! Language usage statistics for a GitHub account.
//!
//! The library walks every repository of the authenticated user, sums the
//! per-language byte counts reported by the API, normalizes them into a
//! distribution and publishes bar charts of that distribution into a
//! repository of choice. Publishing only happens when the distribution
//! differs from the last published snapshot, unless a run is forced.
//!
//! Network access, version control and chart rendering sit behind the
//! [`Transport`], [`VersionControl`] and [`ChartRenderer`] traits so that
//! [`run_pipeline`] can be driven entirely in memory.

mod aggregate;
mod chart;
mod config;
mod error;
mod file;
mod git;
mod github;
mod pipeline;
mod publish;
mod retry;
mod snapshot;
#[cfg(test)]
mod testing;

pub use aggregate::{
    LanguageAggregator, LanguageDistribution, LanguageRules, LanguageShare, LanguageTotal,
    aggregate, round_fraction,
};
pub use chart::{ChartRenderer, SvgBarChart, Theme};
pub use config::{
    ChartSettings, Committer, Config, GithubSettings, LanguageSettings, OutputSettings,
    PublishSettings, RepositoryType, RetrySettings, Secret, load_config, parse_config,
};
pub use error::{Error, io_error};
pub use file::{MirrorResult, mirror_directory};
pub use git::{GitCli, VersionControl, authenticated_url, redact_credentials};
pub use github::{
    GithubClient, LanguageBytes, OctocrabTransport, RawResponse, RepositoryPager, RepositoryRef,
    Transport,
};
pub use pipeline::{Outcome, PipelineOptions, commit_message, run_pipeline};
pub use publish::{PublishState, PublishTarget, Publisher};
pub use retry::{RetryOutcome, RetryPolicy, retry_linear};
pub use snapshot::{PreviousSnapshot, has_changed, load_snapshot, snapshots_differ, write_snapshot};
