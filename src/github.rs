// Copyright (c) 2026  ForkPurge contributors
//
// This file is part of ForkPurge.
//
// ForkPurge is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// ForkPurge is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with ForkPurge. If not, see <https://www.gnu.org/licenses/>.


use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::ClientBuilder;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Config;


const USER_AGENT: &'static str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION"),
);

const API_VERSION: &'static str = "2022-11-28";

/// Page size requested for both the page count probe and page listings.
const PER_PAGE: u32 = 100;

/// Format of the `updated_at` field in repository responses.
const TIMESTAMP_FORMAT: &'static str = "%Y-%m-%dT%H:%M:%SZ";


#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request error")]
    Http(#[from] reqwest::Error),

    #[error("request header error")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("'{url}' responded with {status}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("invalid timestamp '{0}'")]
    Timestamp(String, #[source] chrono::ParseError),
}


#[derive(Clone, Debug, Deserialize)]
pub struct Repo {
    pub url: String,
    pub fork: bool,
    pub updated_at: String,
}

impl Repo {
    /// Parse the last-updated timestamp as UTC.
    pub fn updated_at(&self) -> Result<DateTime<Utc>, Error> {
        NaiveDateTime::parse_from_str(&self.updated_at, TIMESTAMP_FORMAT)
            .map(|naive| Utc.from_utc_datetime(&naive))
            .map_err(|e| Error::Timestamp(self.updated_at.clone(), e))
    }
}


/// Repository operations against a hosted Git platform for a single user.
#[allow(async_fn_in_trait)]
pub trait Forge {
    /// Number of repository listing pages. Falls back to 1 when the
    /// platform does not advertise pagination.
    async fn page_count(&self) -> Result<u32, Error>;

    /// Repositories on the given 1-based page.
    async fn repos_page(&self, page: u32) -> Result<Vec<Repo>, Error>;

    /// Delete the repository at its API URL.
    async fn delete_repo(&self, url: &str) -> Result<(), Error>;
}


/// GitHub REST API client authenticated as the configured user.
#[derive(Debug)]
pub struct Client {
    http: reqwest::Client,
    repos_url: String,
}

impl Client {
    pub fn new(config: &Config) -> Result<Self, Error> {
        Self::with_builder(config, ClientBuilder::new())
    }

    /// Build from a caller-supplied `reqwest` builder, for example one with
    /// custom proxy or TLS settings.
    pub fn with_builder(
        config: &Config,
        builder: ClientBuilder,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, "application/vnd.github+json".parse()?);
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let mut authorization: HeaderValue =
            format!("Bearer {}", config.api_token).parse()?;
        authorization.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, authorization);

        let http = builder
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(
            Client {
                http,
                repos_url: format!(
                    "{}/users/{}/repos",
                    config.api_url.trim_end_matches('/'),
                    config.username,
                ),
            }
        )
    }
}

impl Forge for Client {
    async fn page_count(&self) -> Result<u32, Error> {
        let response = self.http.head(&self.repos_url)
            .query(&[("per_page", PER_PAGE)])
            .send()
            .await?;
        let response = check_status(response)?;

        Ok(
            response.headers()
                .get(header::LINK)
                .and_then(|link| link.to_str().ok())
                .and_then(last_page)
                .unwrap_or(1)
        )
    }

    async fn repos_page(&self, page: u32) -> Result<Vec<Repo>, Error> {
        let response = self.http.get(&self.repos_url)
            .query(&[("per_page", PER_PAGE), ("page", page)])
            .send()
            .await?;

        Ok(check_status(response)?.json::<Vec<Repo>>().await?)
    }

    async fn delete_repo(&self, url: &str) -> Result<(), Error> {
        let response = self.http.delete(url)
            .send()
            .await?;
        check_status(response)?;

        Ok(())
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();

    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::Status {
            status,
            url: response.url().to_string(),
        })
    }
}


/// Get the total page count from a `Link` header.
///
/// Uses the `rel="last"` entry, or the final entry if none is marked as
/// last. Returns `None` if the header has no usable page number.
pub fn last_page(link: &str) -> Option<u32> {
    let entries: Vec<&str> = link.split(',').collect();

    let last = entries.iter()
        .find(|entry| {
            entry.split(';')
                .skip(1)
                .any(|param| param.trim() == r#"rel="last""#)
        })
        .or(entries.last())?;

    page_number(last).filter(|&page| page > 0)
}

fn page_number(entry: &str) -> Option<u32> {
    let target = entry.split(';')
        .next()?
        .trim()
        .strip_prefix('<')?
        .strip_suffix('>')?;

    reqwest::Url::parse(target)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}


/// A fork is stale when strictly more than `older_than` has passed since
/// its last update.
pub fn is_stale(
    updated_at: DateTime<Utc>,
    now: DateTime<Utc>,
    older_than: Duration,
) -> bool {
    now.signed_duration_since(updated_at) > older_than
}

/// Fetch the API URLs of all forks not updated within `older_than`.
///
/// Pages are fetched in order. Any failed request aborts the listing.
pub async fn fetch_stale_forks<F: Forge>(
    forge: &F,
    older_than: Duration,
) -> Result<Vec<String>, Error> {
    info!("Getting the list of forked repositories");

    let pages = forge.page_count().await?;
    let mut urls = Vec::new();

    for page in 1..=pages {
        let repos = forge.repos_page(page).await?;
        debug!(page, pages, count = repos.len(), "fetched repository page");

        let now = Utc::now();

        for repo in repos {
            if !repo.fork {
                continue;
            }

            if is_stale(repo.updated_at()?, now, older_than) {
                debug!(url = %repo.url, updated_at = %repo.updated_at, "stale fork");
                urls.push(repo.url);
            }
        }
    }

    Ok(urls)
}
