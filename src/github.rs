// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// GitHub REST client for repository listings and language statistics.
///
/// Requests go through a [`Transport`] so the pagination and retry behaviour
/// can be exercised without a network. The production transport is backed by
/// octocrab, which attaches the bearer token to every request.
use std::fmt;

use octocrab::Octocrab;
use serde::{
    Deserialize, Deserializer,
    de::{MapAccess, Visitor},
};
use tracing::{debug, info};

use crate::{
    config::{RepositoryType, Secret},
    error::Error,
    retry::{RetryOutcome, RetryPolicy, retry_linear},
};

const LIST_REPOSITORIES_PATH: &str = "/user/repos";
const UNAUTHORIZED: u16 = 401;

/// Status code and body of a single HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct RawResponse
{
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body:   String,
}

impl RawResponse
{
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self,) -> bool
    {
        (200..300).contains(&self.status,)
    }

    /// Whether another attempt may produce a different result.
    pub fn is_retryable(&self,) -> bool
    {
        !self.is_success() && self.status != UNAUTHORIZED
    }
}

/// Network seam used by [`GithubClient`].
pub trait Transport
{
    /// Issues an authenticated `GET` for the absolute `url`.
    ///
    /// Non-2xx statuses are returned as regular responses; only failures that
    /// prevent obtaining a response at all are errors.
    fn get(&self, url: &str,) -> impl Future<Output = Result<RawResponse, Error,>,> + Send;
}

/// [`Transport`] backed by an authenticated octocrab instance.
#[derive(Debug, Clone,)]
pub struct OctocrabTransport
{
    octocrab: Octocrab,
}

impl OctocrabTransport
{
    /// Builds a transport authenticating with a personal access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] when the client cannot be initialized.
    pub fn new(token: &Secret,) -> Result<Self, Error,>
    {
        let octocrab = Octocrab::builder()
            .personal_token(token.expose().to_owned(),)
            .build()
            .map_err(|e| Error::service(format!("failed to initialize GitHub client: {e}"),),)?;

        Ok(Self {
            octocrab,
        },)
    }
}

impl Transport for OctocrabTransport
{
    async fn get(&self, url: &str,) -> Result<RawResponse, Error,>
    {
        let response = self
            .octocrab
            ._get(url,)
            .await
            .map_err(|e| Error::service(format!("GET {url} failed: {e}"),),)?;
        let status = response.status().as_u16();
        let body = self
            .octocrab
            .body_to_string(response,)
            .await
            .map_err(|e| Error::service(format!("failed to read body of {url}: {e}"),),)?;

        Ok(RawResponse {
            status, body,
        },)
    }
}

/// Repository owned by, or accessible to, the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize,)]
pub struct RepositoryRef
{
    /// `owner/name` identifier.
    pub full_name:  String,
    /// Repository name.
    pub name:       String,
    /// Creation timestamp as reported by the API.
    pub created_at: String,
    /// Last metadata update timestamp.
    pub updated_at: String,
    /// Last push timestamp; empty repositories report none.
    #[serde(default)]
    pub pushed_at:  Option<String,>,
}

impl fmt::Display for RepositoryRef
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(&self.full_name,)
    }
}

/// Language name to byte count mapping of one repository.
///
/// Entries keep the order in which the API reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct LanguageBytes
{
    entries: Vec<(String, u64,),>,
}

impl LanguageBytes
{
    /// Creates an empty mapping.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Iterates over `(language, bytes)` pairs in reported order.
    pub fn iter(&self,) -> impl Iterator<Item = (&str, u64,),> + '_
    {
        self.entries.iter().map(|(name, bytes,)| (name.as_str(), *bytes,),)
    }

    /// Number of languages.
    pub fn len(&self,) -> usize
    {
        self.entries.len()
    }

    /// Whether the repository reported no languages.
    pub fn is_empty(&self,) -> bool
    {
        self.entries.is_empty()
    }
}

impl<S: Into<String,>,> FromIterator<(S, u64,),> for LanguageBytes
{
    fn from_iter<I: IntoIterator<Item = (S, u64,),>,>(iter: I,) -> Self
    {
        Self {
            entries: iter.into_iter().map(|(name, bytes,)| (name.into(), bytes,),).collect(),
        }
    }
}

impl<'de,> Deserialize<'de,> for LanguageBytes
{
    fn deserialize<D,>(deserializer: D,) -> Result<Self, D::Error,>
    where
        D: Deserializer<'de,>,
    {
        struct LanguageBytesVisitor;

        impl<'de,> Visitor<'de,> for LanguageBytesVisitor
        {
            type Value = LanguageBytes;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_,>,) -> fmt::Result
            {
                formatter.write_str("an object mapping language names to byte counts",)
            }

            fn visit_map<A,>(self, mut access: A,) -> Result<Self::Value, A::Error,>
            where
                A: MapAccess<'de,>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(8,),);
                while let Some((name, bytes,),) = access.next_entry::<String, u64>()? {
                    entries.push((name, bytes,),);
                }
                Ok(LanguageBytes {
                    entries,
                },)
            }
        }

        deserializer.deserialize_map(LanguageBytesVisitor,)
    }
}

/// Page cursor for the repository listing.
///
/// Pages are requested from 1 upwards; the first empty page ends the walk.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct RepositoryPager
{
    next_page: u32,
    page_size: u8,
    finished:  bool,
}

impl RepositoryPager
{
    /// Starts a walk at page 1.
    pub fn new(page_size: u8,) -> Self
    {
        Self {
            next_page: 1, page_size, finished: false,
        }
    }

    /// Page number the next request asks for, `None` once finished.
    pub fn next_page(&self,) -> Option<u32,>
    {
        (!self.finished).then_some(self.next_page,)
    }

    /// Records the number of items returned for the current page.
    pub fn advance(&mut self, items: usize,)
    {
        if items == 0 {
            self.finished = true;
        } else {
            self.next_page += 1;
        }
    }

    /// Configured page size.
    pub fn page_size(&self,) -> u8
    {
        self.page_size
    }
}

/// Client for the two GitHub endpoints the pipeline needs.
#[derive(Debug,)]
pub struct GithubClient<T,>
{
    transport:       T,
    base_url:        String,
    repository_type: RepositoryType,
    retry:           RetryPolicy,
}

impl<T: Transport,> GithubClient<T,>
{
    /// Creates a client on top of `transport`.
    pub fn new(
        transport: T,
        base_url: &str,
        repository_type: RepositoryType,
        retry: RetryPolicy,
    ) -> Self
    {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/',).to_owned(),
            repository_type,
            retry,
        }
    }

    /// Returns the underlying transport.
    pub fn transport(&self,) -> &T
    {
        &self.transport
    }

    /// Lists every repository of the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] when the token is rejected,
    /// [`Error::Degraded`] when a page keeps failing past the retry budget and
    /// [`Error::Decode`] for unexpected payloads.
    pub async fn list_repositories(&self, page_size: u8,) -> Result<Vec<RepositoryRef,>, Error,>
    {
        let mut pager = RepositoryPager::new(page_size,);
        let mut repositories = Vec::new();

        while let Some(page,) = pager.next_page() {
            let url = format!(
                "{}{LIST_REPOSITORIES_PATH}?per_page={}&page={page}&type={}",
                self.base_url,
                pager.page_size(),
                self.repository_type.as_query()
            );
            let items: Vec<RepositoryRef,> = self.get_json(&url,).await?;
            debug!("Page {} returned {} repositories", page, items.len());

            pager.advance(items.len(),);
            repositories.extend(items,);
        }

        info!("Found {} repositories", repositories.len());
        Ok(repositories,)
    }

    /// Fetches the language byte counts of `full_name`.
    ///
    /// # Errors
    ///
    /// Same as [`GithubClient::list_repositories`].
    pub async fn fetch_language_bytes(&self, full_name: &str,) -> Result<LanguageBytes, Error,>
    {
        let url = format!("{}/repos/{full_name}/languages", self.base_url);
        self.get_json(&url,).await
    }

    async fn get_json<R,>(&self, url: &str,) -> Result<R, Error,>
    where
        R: for<'de,> Deserialize<'de,>,
    {
        let outcome = retry_linear(&self.retry, url, RawResponse::is_retryable, || {
            self.transport.get(url,)
        },)
        .await?;

        let response = match outcome {
            RetryOutcome::Settled {
                value, ..
            } => value,
            RetryOutcome::Exhausted {
                value,
                attempts,
            } => {
                return Err(Error::Degraded {
                    url: url.to_owned(),
                    status: value.status,
                    attempts,
                },);
            }
        };

        if response.status == UNAUTHORIZED {
            return Err(Error::Unauthorized {
                url: url.to_owned(),
            },);
        }

        serde_json::from_str(&response.body,).map_err(|source| Error::Decode {
            url: url.to_owned(),
            source,
        },)
    }
}
