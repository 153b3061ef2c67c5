// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! In-memory doubles for the network, version-control and rendering seams.

use std::{
    collections::VecDeque,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::{
    aggregate::LanguageShare,
    chart::{ChartRenderer, Theme},
    error::{self, Error},
    git::VersionControl,
    github::{RawResponse, Transport},
};

/// Transport replaying queued responses and recording requested URLs.
#[derive(Debug, Default,)]
pub struct ScriptedTransport
{
    responses: Mutex<VecDeque<RawResponse,>,>,
    requests:  Mutex<Vec<String,>,>,
}

impl ScriptedTransport
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn push_ok(&self, body: impl Into<String,>,)
    {
        self.push_status(200, body,);
    }

    pub fn push_status(&self, status: u16, body: impl Into<String,>,)
    {
        self.responses.lock().unwrap().push_back(RawResponse {
            status,
            body: body.into(),
        },);
    }

    pub fn requests(&self,) -> Vec<String,>
    {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport
{
    async fn get(&self, url: &str,) -> Result<RawResponse, Error,>
    {
        self.requests.lock().unwrap().push(url.to_owned(),);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::service(format!("no scripted response for {url}"),),)
    }
}

/// Version control double that records operations instead of running git.
#[derive(Debug, Default,)]
pub struct RecordingVcs
{
    operations:  Mutex<Vec<String,>,>,
    cloned_urls: Mutex<Vec<String,>,>,
    failing:     Option<&'static str,>,
    seed_files:  Vec<(PathBuf, String,),>,
    clean_index: bool,
}

impl RecordingVcs
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Makes `operation` (`clone`, `add`, `commit` or `push`) fail.
    pub fn failing_on(mut self, operation: &'static str,) -> Self
    {
        self.failing = Some(operation,);
        self
    }

    /// Writes `contents` to `relative` inside every clone.
    pub fn with_file(mut self, relative: impl Into<PathBuf,>, contents: impl Into<String,>,) -> Self
    {
        self.seed_files.push((relative.into(), contents.into(),),);
        self
    }

    /// Reports an index identical to `HEAD` after staging.
    pub fn with_nothing_staged(mut self,) -> Self
    {
        self.clean_index = true;
        self
    }

    pub fn operations(&self,) -> Vec<String,>
    {
        self.operations.lock().unwrap().clone()
    }

    pub fn cloned_urls(&self,) -> Vec<String,>
    {
        self.cloned_urls.lock().unwrap().clone()
    }

    fn record(&self, operation: &str,) -> Result<(), Error,>
    {
        self.operations.lock().unwrap().push(operation.to_owned(),);
        if self.failing == Some(operation,) {
            return Err(Error::Git {
                operation: operation.to_owned(),
                message:   "scripted failure".to_owned(),
            },);
        }
        Ok((),)
    }
}

impl VersionControl for RecordingVcs
{
    fn clone_repository(&self, url: &str, destination: &Path,) -> Result<(), Error,>
    {
        self.cloned_urls.lock().unwrap().push(url.to_owned(),);
        fs::create_dir_all(destination,).map_err(|source| error::io_error(destination, source,),)?;
        self.record("clone",)?;

        for (relative, contents,) in &self.seed_files {
            let path = destination.join(relative,);
            if let Some(parent,) = path.parent() {
                fs::create_dir_all(parent,).map_err(|source| error::io_error(parent, source,),)?;
            }
            fs::write(&path, contents,).map_err(|source| error::io_error(&path, source,),)?;
        }
        Ok((),)
    }

    fn add_all(&self, _repository: &Path,) -> Result<(), Error,>
    {
        self.record("add",)
    }

    fn has_staged_changes(&self, _repository: &Path,) -> Result<bool, Error,>
    {
        Ok(!self.clean_index,)
    }

    fn commit(&self, _repository: &Path, _message: &str,) -> Result<(), Error,>
    {
        self.record("commit",)
    }

    fn push(&self, _repository: &Path,) -> Result<(), Error,>
    {
        self.record("push",)
    }
}

/// Renderer writing placeholder images and remembering each call.
#[derive(Debug, Default,)]
pub struct StubRenderer
{
    rendered: Mutex<Vec<(Theme, usize,),>,>,
}

impl StubRenderer
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Themes rendered so far with the number of bars of each chart.
    pub fn rendered(&self,) -> Vec<(Theme, usize,),>
    {
        self.rendered.lock().unwrap().clone()
    }
}

impl ChartRenderer for StubRenderer
{
    fn render(
        &self,
        _title: &str,
        shares: &[LanguageShare],
        theme: Theme,
        path: &Path,
    ) -> Result<(), Error,>
    {
        self.rendered.lock().unwrap().push((theme, shares.len(),),);
        fs::write(path, "<svg/>",).map_err(|source| error::io_error(path, source,),)
    }
}
