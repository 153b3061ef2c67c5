//! Configuration document describing a language statistics publishing run.
//!
//! The types in this module mirror the structure of the YAML document consumed
//! by the CLI. Optional sections fall back to built-in defaults. The whole
//! document is validated once, at load time, so the pipeline never touches the
//! network or the filesystem with a half-valid configuration.

use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Component, Path, PathBuf},
};

use serde::Deserialize;

use crate::{
    aggregate::LanguageRules,
    error::{self, Error},
    retry::RetryPolicy,
};

const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
const DEFAULT_PAGE_SIZE: u8 = 100;
const MAX_PAGE_SIZE: u8 = 100;
const DEFAULT_UNIT_DELAY_MS: u64 = 300;
const DEFAULT_RETRY_BUDGET_MS: u64 = 1000;
const DEFAULT_OUTPUT_DIR: &str = ".langstat/output";
const DEFAULT_CLONE_DIR: &str = ".langstat/repository";
const DEFAULT_STATS_FILE: &str = "languages.json";
const DEFAULT_CHART_TITLE: &str = "Top Used Languages";

/// Root configuration document.
///
/// # Examples
///
/// ```
/// use langstat::parse_config;
///
/// let yaml = r#"
/// publish:
///   repository_url: https://github.com/octocat/octocat
///   artifact_path: assets/languages
///   commit_message: Language statistics update
/// languages:
///   exclude: [CSS]
/// "#;
/// let config = parse_config(yaml,).expect("valid configuration",);
/// assert_eq!(config.github.page_size, 100);
/// assert!(config.languages.rules().is_excluded("CSS"));
/// ```
#[derive(Debug, Deserialize, Clone,)]
#[serde(deny_unknown_fields)]
pub struct Config
{
    /// API access settings.
    #[serde(default)]
    pub github: GithubSettings,

    /// Destination repository settings.
    pub publish: PublishSettings,

    /// Local working directory for freshly rendered artifacts.
    #[serde(default)]
    pub output: OutputSettings,

    /// Chart presentation settings.
    #[serde(default)]
    pub chart: ChartSettings,

    /// Exclusion and rename rules applied during aggregation.
    #[serde(default)]
    pub languages: LanguageSettings,
}

/// Settings for talking to the GitHub REST API.
#[derive(Debug, Deserialize, Clone,)]
#[serde(deny_unknown_fields)]
pub struct GithubSettings
{
    /// Access token; the CLI `--token` flag takes precedence.
    #[serde(default)]
    pub token: Option<Secret,>,

    /// Base URL of the REST API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Which repositories of the authenticated user are listed.
    #[serde(default)]
    pub repository_type: RepositoryType,

    /// Number of repositories requested per page, `1..=100`.
    #[serde(default = "default_page_size")]
    pub page_size: u8,

    /// Backoff settings for failing API calls.
    #[serde(default)]
    pub retry: RetrySettings,
}

impl Default for GithubSettings
{
    fn default() -> Self
    {
        Self {
            token:           None,
            api_base_url:    default_api_base_url(),
            repository_type: RepositoryType::default(),
            page_size:       DEFAULT_PAGE_SIZE,
            retry:           RetrySettings::default(),
        }
    }
}

/// Repository filter passed as the `type` query parameter.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default,)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryType
{
    /// Repositories owned by the authenticated user.
    #[default]
    Owner,
    /// Repositories the user collaborates on.
    Collaborator,
    /// Every repository visible to the user.
    All,
}

impl RepositoryType
{
    /// Returns the value sent in the `type` query parameter.
    pub fn as_query(self,) -> &'static str
    {
        match self {
            Self::Owner => "owner",
            Self::Collaborator => "collaborator",
            Self::All => "all",
        }
    }
}

/// Linear backoff settings, see [`RetryPolicy`].
#[derive(Debug, Deserialize, Clone, Copy,)]
#[serde(deny_unknown_fields)]
pub struct RetrySettings
{
    /// Base delay multiplied by the attempt number.
    #[serde(default = "default_unit_delay_ms")]
    pub unit_delay_ms: u64,

    /// Upper bound for a single backoff delay.
    #[serde(default = "default_retry_budget_ms")]
    pub budget_ms: u64,
}

impl Default for RetrySettings
{
    fn default() -> Self
    {
        Self {
            unit_delay_ms: DEFAULT_UNIT_DELAY_MS, budget_ms: DEFAULT_RETRY_BUDGET_MS,
        }
    }
}

impl RetrySettings
{
    /// Converts the settings into a runtime policy.
    pub fn policy(&self,) -> RetryPolicy
    {
        RetryPolicy::from_millis(self.unit_delay_ms, self.budget_ms,)
    }
}

/// Destination repository that receives the rendered artifacts.
#[derive(Debug, Deserialize, Clone,)]
#[serde(deny_unknown_fields)]
pub struct PublishSettings
{
    /// HTTPS clone URL of the repository to update.
    pub repository_url: String,

    /// Local directory the repository is cloned into for the run.
    #[serde(default = "default_clone_directory")]
    pub clone_directory: PathBuf,

    /// Directory inside the repository that mirrors the output directory.
    pub artifact_path: PathBuf,

    /// Commit message prefix; a timestamp is appended.
    pub commit_message: String,

    /// Optional identity used for the commit.
    #[serde(default)]
    pub committer: Option<Committer,>,
}

/// Commit author identity.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq,)]
#[serde(deny_unknown_fields)]
pub struct Committer
{
    /// `user.name` passed to git.
    pub name:  String,
    /// `user.email` passed to git.
    pub email: String,
}

/// Local output directory holding the freshly generated artifacts.
#[derive(Debug, Deserialize, Clone,)]
#[serde(deny_unknown_fields)]
pub struct OutputSettings
{
    /// Directory recreated on every run.
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,

    /// File name of the JSON statistics snapshot.
    #[serde(default = "default_stats_file")]
    pub stats_file: String,
}

impl Default for OutputSettings
{
    fn default() -> Self
    {
        Self {
            directory: default_output_directory(), stats_file: default_stats_file(),
        }
    }
}

impl OutputSettings
{
    /// Location of the freshly computed snapshot.
    pub fn stats_path(&self,) -> PathBuf
    {
        self.directory.join(&self.stats_file,)
    }
}

#[derive(Debug, Deserialize, Clone,)]
#[serde(deny_unknown_fields)]
pub struct ChartSettings
{
    /// Title drawn above the bars.
    #[serde(default = "default_chart_title")]
    pub title: String,
}

impl Default for ChartSettings
{
    fn default() -> Self
    {
        Self {
            title: default_chart_title(),
        }
    }
}

/// Exclusion list and rename table as written in the document.
#[derive(Debug, Deserialize, Clone, Default,)]
#[serde(deny_unknown_fields)]
pub struct LanguageSettings
{
    /// Languages left out of the statistics (raw or display names).
    #[serde(default)]
    pub exclude: Vec<String,>,

    /// Raw API language name mapped to the display name.
    #[serde(default)]
    pub rename: BTreeMap<String, String,>,
}

impl LanguageSettings
{
    /// Builds the lookup structure used by the aggregator.
    pub fn rules(&self,) -> LanguageRules
    {
        LanguageRules::new(
            self.exclude.iter().cloned(),
            self.rename.iter().map(|(raw, display,)| (raw.clone(), display.clone(),),),
        )
    }
}

/// Access token wrapper that never prints its contents.
#[derive(Clone, Deserialize, PartialEq, Eq,)]
#[serde(transparent)]
pub struct Secret(String,);

impl Secret
{
    /// Wraps a raw token.
    pub fn new<S: Into<String,>,>(value: S,) -> Self
    {
        Self(value.into(),)
    }

    /// Returns the raw token for use in request credentials.
    pub fn expose(&self,) -> &str
    {
        &self.0
    }

    fn is_blank(&self,) -> bool
    {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str("Secret(***)",)
    }
}

impl Config
{
    /// Picks the access token, preferring the command-line override.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when neither source provides a non-empty
    /// token.
    pub fn resolve_token(&self, override_token: Option<Secret,>,) -> Result<Secret, Error,>
    {
        override_token
            .filter(|token| !token.is_blank(),)
            .or_else(|| self.github.token.clone().filter(|token| !token.is_blank(),),)
            .ok_or_else(|| {
                Error::validation(
                    "missing GitHub access token: set github.token, --token or GH_TOKEN",
                )
            },)
    }

    /// Checks every invariant the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] describing the first violated rule.
    pub fn validate(&self,) -> Result<(), Error,>
    {
        let github = &self.github;
        if github.page_size == 0 || github.page_size > MAX_PAGE_SIZE {
            return Err(Error::validation(format!(
                "github.page_size must be between 1 and {MAX_PAGE_SIZE}"
            ),),);
        }
        if !github.api_base_url.starts_with("https://",)
            && !github.api_base_url.starts_with("http://",)
        {
            return Err(Error::validation("github.api_base_url must be an http(s) URL",),);
        }
        if github.retry.unit_delay_ms == 0 || github.retry.budget_ms == 0 {
            return Err(Error::validation(
                "github.retry.unit_delay_ms and github.retry.budget_ms must be positive",
            ),);
        }

        let publish = &self.publish;
        if !publish.repository_url.starts_with("https://",) {
            return Err(Error::validation("publish.repository_url must start with https://",),);
        }
        if publish.commit_message.trim().is_empty() {
            return Err(Error::validation("publish.commit_message must not be empty",),);
        }
        ensure_relative(&publish.artifact_path, "publish.artifact_path",)?;
        if let Some(committer,) = publish.committer.as_ref()
            && (committer.name.trim().is_empty() || committer.email.trim().is_empty())
        {
            return Err(Error::validation("publish.committer requires name and email",),);
        }

        let stats_file = self.output.stats_file.as_str();
        if stats_file.is_empty() || stats_file.contains(['/', '\\',],) {
            return Err(Error::validation("output.stats_file must be a plain file name",),);
        }
        let output = ensure_dedicated(&self.output.directory, "output.directory",)?;
        let clone = ensure_dedicated(&publish.clone_directory, "publish.clone_directory",)?;
        if output.starts_with(&clone,) || clone.starts_with(&output,) {
            return Err(Error::validation(
                "output.directory and publish.clone_directory must not contain each other",
            ),);
        }

        for (raw, display,) in &self.languages.rename {
            if display.trim().is_empty() {
                return Err(Error::validation(format!(
                    "languages.rename entry '{raw}' maps to an empty name"
                ),),);
            }
        }

        Ok((),)
    }
}

/// Loads and validates the configuration file at `path`.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read, [`Error::Parse`] for
/// malformed YAML and [`Error::Validation`] for rule violations.
pub fn load_config(path: &Path,) -> Result<Config, Error,>
{
    let contents = fs::read_to_string(path,).map_err(|source| error::io_error(path, source,),)?;
    parse_config(&contents,)
}

/// Parses and validates a configuration document.
///
/// # Errors
///
/// See [`load_config`].
pub fn parse_config(contents: &str,) -> Result<Config, Error,>
{
    let config: Config = serde_yaml::from_str(contents,)?;
    config.validate()?;
    Ok(config,)
}

fn ensure_relative(path: &Path, field: &str,) -> Result<(), Error,>
{
    if path.as_os_str().is_empty() {
        return Err(Error::validation(format!("{field} must not be empty"),),);
    }
    let escapes = path
        .components()
        .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir),);
    if escapes {
        return Err(Error::validation(format!(
            "{field} must be a relative path inside the repository"
        ),),);
    }
    if without_current_dir(path,).as_os_str().is_empty() {
        return Err(Error::validation(format!(
            "{field} must name a directory below the repository root"
        ),),);
    }
    Ok((),)
}

/// Rejects directories that are wiped wholesale yet could hold unrelated data.
fn ensure_dedicated(path: &Path, field: &str,) -> Result<PathBuf, Error,>
{
    let normalized = without_current_dir(path,);
    let names_directory =
        normalized.components().any(|component| matches!(component, Component::Normal(_)),);
    let climbs = normalized.components().any(|component| matches!(component, Component::ParentDir),);
    if !names_directory || climbs {
        return Err(Error::validation(format!(
            "{field} must name a dedicated directory, got {}",
            path.display()
        ),),);
    }
    Ok(normalized,)
}

fn without_current_dir(path: &Path,) -> PathBuf
{
    path.components().filter(|component| !matches!(component, Component::CurDir),).collect()
}

fn default_api_base_url() -> String
{
    DEFAULT_API_BASE_URL.to_owned()
}

fn default_page_size() -> u8
{
    DEFAULT_PAGE_SIZE
}

fn default_unit_delay_ms() -> u64
{
    DEFAULT_UNIT_DELAY_MS
}

fn default_retry_budget_ms() -> u64
{
    DEFAULT_RETRY_BUDGET_MS
}

fn default_clone_directory() -> PathBuf
{
    PathBuf::from(DEFAULT_CLONE_DIR,)
}

fn default_output_directory() -> PathBuf
{
    PathBuf::from(DEFAULT_OUTPUT_DIR,)
}

fn default_stats_file() -> String
{
    DEFAULT_STATS_FILE.to_owned()
}

fn default_chart_title() -> String
{
    DEFAULT_CHART_TITLE.to_owned()
}

#[cfg(test)]
mod tests
{
    use std::time::Duration;

    use tempfile::tempdir;

    use super::*;

    const MINIMAL: &str = r"
publish:
  repository_url: https://github.com/octocat/octocat
  artifact_path: assets/languages
  commit_message: Language statistics update
";

    #[test]
    fn minimal_document_uses_defaults()
    {
        let config = parse_config(MINIMAL,).expect("expected minimal config to parse",);

        assert_eq!(config.github.api_base_url, "https://api.github.com");
        assert_eq!(config.github.repository_type, RepositoryType::Owner);
        assert_eq!(config.github.page_size, 100);
        assert_eq!(config.github.retry.unit_delay_ms, 300);
        assert_eq!(config.github.retry.budget_ms, 1000);
        assert_eq!(config.output.stats_path(), Path::new(".langstat/output/languages.json"));
        assert_eq!(config.chart.title, "Top Used Languages");
        assert!(config.languages.exclude.is_empty());
    }

    #[test]
    fn full_document_round_trips_language_rules()
    {
        let yaml = r#"
github:
  repository_type: collaborator
  page_size: 50
  retry:
    unit_delay_ms: 100
    budget_ms: 400
publish:
  repository_url: https://github.com/octocat/octocat
  clone_directory: /tmp/clone
  artifact_path: assets/languages
  commit_message: Stats
  committer:
    name: stats-bot
    email: bot@example.com
output:
  directory: /tmp/out
  stats_file: stats.json
chart:
  title: Languages
languages:
  exclude: [HTML]
  rename:
    Jupyter Notebook: Python
"#;
        let config = parse_config(yaml,).expect("expected full config to parse",);
        assert_eq!(config.github.repository_type.as_query(), "collaborator");
        assert_eq!(config.github.retry.policy().unit_delay(), Duration::from_millis(100));

        let rules = config.languages.rules();
        assert!(rules.is_excluded("HTML"));
        assert_eq!(rules.display_name("Jupyter Notebook"), "Python");
        assert_eq!(
            config.publish.committer,
            Some(Committer {
                name: "stats-bot".to_owned(), email: "bot@example.com".to_owned(),
            })
        );
    }

    #[test]
    fn rejects_unknown_fields()
    {
        let yaml = format!("{MINIMAL}unexpected: true\n");
        let error = parse_config(&yaml,).unwrap_err();
        assert!(matches!(error, Error::Parse { .. }));
    }

    #[test]
    fn rejects_page_size_out_of_range()
    {
        let yaml = format!("{MINIMAL}github:\n  page_size: 0\n");
        let error = parse_config(&yaml,).unwrap_err();
        assert!(error.to_string().contains("page_size"));
    }

    #[test]
    fn rejects_non_https_repository()
    {
        let yaml = r"
publish:
  repository_url: git@github.com:octocat/octocat.git
  artifact_path: assets
  commit_message: Stats
";
        let error = parse_config(yaml,).unwrap_err();
        assert!(error.to_string().contains("https://"));
    }

    #[test]
    fn rejects_artifact_path_escaping_repository()
    {
        let yaml = r"
publish:
  repository_url: https://github.com/octocat/octocat
  artifact_path: ../outside
  commit_message: Stats
";
        let error = parse_config(yaml,).unwrap_err();
        assert!(error.to_string().contains("artifact_path"));
    }

    #[test]
    fn rejects_artifact_path_at_repository_root()
    {
        for artifact_path in [".", "./.", "./"] {
            let yaml = format!(
                "publish:\n  repository_url: https://github.com/octocat/octocat\n  artifact_path: \"{artifact_path}\"\n  commit_message: Stats\n"
            );
            let error = parse_config(&yaml,).unwrap_err();
            assert!(error.to_string().contains("artifact_path"), "accepted {artifact_path:?}");
        }
    }

    #[test]
    fn accepts_artifact_path_with_leading_current_dir()
    {
        let yaml = MINIMAL.replace("assets/languages", "./assets/languages",);
        assert!(parse_config(&yaml,).is_ok());
    }

    #[test]
    fn rejects_current_directory_as_output_or_clone()
    {
        let documents = [
            format!("{MINIMAL}output:\n  directory: .\n"),
            MINIMAL.replace("publish:\n", "publish:\n  clone_directory: ./\n",),
        ];
        for yaml in documents {
            let error = parse_config(&yaml,).unwrap_err();
            assert!(error.to_string().contains("dedicated directory"), "{error}");
        }
    }

    #[test]
    fn rejects_parent_directory_as_output()
    {
        let yaml = format!("{MINIMAL}output:\n  directory: ..\n");
        let error = parse_config(&yaml,).unwrap_err();
        assert!(error.to_string().contains("output.directory"));
    }

    #[test]
    fn rejects_clone_nested_in_output()
    {
        let yaml = format!("{MINIMAL}output:\n  directory: out\n")
            .replace("publish:\n", "publish:\n  clone_directory: ./out/repo\n",);
        let error = parse_config(&yaml,).unwrap_err();
        assert!(error.to_string().contains("must not contain each other"));
    }

    #[test]
    fn rejects_output_nested_in_clone()
    {
        let yaml = format!("{MINIMAL}output:\n  directory: repo/out\n")
            .replace("publish:\n", "publish:\n  clone_directory: repo\n",);
        let error = parse_config(&yaml,).unwrap_err();
        assert!(error.to_string().contains("must not contain each other"));
    }

    #[test]
    fn accepts_sibling_output_and_clone()
    {
        let yaml = format!("{MINIMAL}output:\n  directory: work/output\n")
            .replace("publish:\n", "publish:\n  clone_directory: work/repository\n",);
        assert!(parse_config(&yaml,).is_ok());
    }

    #[test]
    fn rejects_stats_file_with_directories()
    {
        let yaml = format!("{MINIMAL}output:\n  stats_file: nested/stats.json\n");
        let error = parse_config(&yaml,).unwrap_err();
        assert!(error.to_string().contains("stats_file"));
    }

    #[test]
    fn rejects_empty_rename_target()
    {
        let yaml = format!("{MINIMAL}languages:\n  rename:\n    Shell: \"  \"\n");
        let error = parse_config(&yaml,).unwrap_err();
        assert!(error.to_string().contains("Shell"));
    }

    #[test]
    fn resolve_token_prefers_override()
    {
        let yaml = format!("{MINIMAL}github:\n  token: from-config\n");
        let config = parse_config(&yaml,).expect("expected config to parse",);

        let token = config.resolve_token(Some(Secret::new("from-cli",),),).expect("token",);
        assert_eq!(token.expose(), "from-cli");

        let token = config.resolve_token(Some(Secret::new("  ",),),).expect("token",);
        assert_eq!(token.expose(), "from-config");
    }

    #[test]
    fn resolve_token_requires_a_value()
    {
        let config = parse_config(MINIMAL,).expect("expected config to parse",);
        let error = config.resolve_token(None,).unwrap_err();
        assert!(error.to_string().contains("missing GitHub access token"));
    }

    #[test]
    fn secret_debug_is_redacted()
    {
        let secret = Secret::new("ghp_supersecret",);
        let rendered = format!("{secret:?}");
        assert!(!rendered.contains("supersecret"));
    }

    #[test]
    fn load_config_reports_missing_file()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let path = temp.path().join("missing.yaml",);
        let error = load_config(&path,).unwrap_err();
        match error {
            Error::Io {
                path: stored, ..
            } => assert_eq!(stored, path),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }
}
