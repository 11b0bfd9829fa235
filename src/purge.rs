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


use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::Instant;
use tracing::{error, info};

use crate::config::Config;
use crate::github::{self, Forge};
use crate::multi_error::MultiError;


#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not list forked repositories")]
    Listing(#[source] github::Error),

    #[error(
        "deadline exceeded with {outstanding} deletions outstanding \
        ({} deleted, {} failed)",
        .deleted.len(),
        .errors.len()
    )]
    DeadlineExceeded {
        deleted: Vec<String>,

        #[source]
        errors: MultiError,
        outstanding: usize,
    },

    #[error("{} deletion(s) failed", .errors.len())]
    Deletions {
        deleted: Vec<String>,

        #[source]
        errors: MultiError,
    },
}


/// Outcome of a run in which every selected fork was deleted.
#[derive(Debug, Default, PartialEq)]
pub struct PurgeReport {
    pub deleted: Vec<String>,
}


/// List stale forks, then delete them all concurrently.
///
/// Returns an empty report without deleting anything when no fork
/// qualifies. The configured timeout bounds the deletion phase only.
pub async fn run<F: Forge>(
    forge: &F,
    config: &Config,
) -> Result<PurgeReport, Error> {
    let older_than = chrono::Duration::days(i64::from(config.older_than_days));

    let urls = github::fetch_stale_forks(forge, older_than)
        .await
        .map_err(Error::Listing)?;

    if urls.is_empty() {
        info!(
            "No forked repositories found that were updated more than {} days ago",
            config.older_than_days,
        );

        return Ok(PurgeReport::default());
    }

    let report = delete_all(forge, urls, config.timeout).await?;

    info!(
        "Deleted {} forked repositories not updated in more than {} days",
        report.deleted.len(),
        config.older_than_days,
    );

    Ok(report)
}

/// Delete every repository in `urls` concurrently.
///
/// A failed deletion does not cancel the others. If `timeout` elapses
/// first, outstanding deletions are dropped and the error records what
/// had already finished.
pub async fn delete_all<F: Forge>(
    forge: &F,
    urls: Vec<String>,
    timeout: Option<Duration>,
) -> Result<PurgeReport, Error> {
    info!("Deleting {} forked repositories", urls.len());

    // A deadline past the end of the clock's range never fires.
    let deadline = timeout.and_then(|timeout| Instant::now().checked_add(timeout));

    let mut pending = urls.into_iter()
        .map(move |url| async move {
            let result = forge.delete_repo(&url).await;
            (url, result)
        })
        .collect::<FuturesUnordered<_>>();

    let mut deleted = Vec::new();
    let mut errors = MultiError::default();

    loop {
        let next = match deadline {
            Some(deadline) => {
                match tokio::time::timeout_at(deadline, pending.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        error!(outstanding = pending.len(), "deletion deadline exceeded");

                        return Err(Error::DeadlineExceeded {
                            outstanding: pending.len(),
                            deleted,
                            errors,
                        });
                    },
                }
            },
            None => pending.next().await,
        };

        let (url, result) = match next {
            Some(outcome) => outcome,
            None => break,
        };

        match result {
            Ok(()) => {
                info!("Deleted '{}'", url);
                deleted.push(url);
            },
            Err(e) => {
                error!(url = %url, error = %e, "could not delete repository");
                errors.push(
                    anyhow::Error::new(e)
                        .context(format!("could not delete '{}'", url)),
                );
            },
        }
    }

    if errors.is_empty() {
        Ok(PurgeReport { deleted })
    } else {
        Err(Error::Deletions { deleted, errors })
    }
}
