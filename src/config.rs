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


use std::fmt;
use std::time::Duration;


pub const USERNAME_VAR: &'static str = "GITHUB_USERNAME";
pub const API_TOKEN_VAR: &'static str = "GITHUB_API_TOKEN";
pub const API_URL_VAR: &'static str = "GITHUB_API_URL";
pub const TIMEOUT_VAR: &'static str = "TIMEOUT";
pub const OLDER_THAN_VAR: &'static str = "OLDER_THAN";

pub const DEFAULT_API_URL: &'static str = "https://api.github.com";
pub const DEFAULT_OLDER_THAN_DAYS: u32 = 60;


#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing required variable '{0}'")]
    Missing(&'static str),

    #[error("invalid value '{value}' for '{name}'")]
    Invalid {
        name: &'static str,
        value: String,
    },
}


/// Run configuration, built once at startup.
#[derive(Clone, PartialEq)]
pub struct Config {
    pub username: String,
    pub api_token: String,
    pub api_url: String,

    /// Forks not updated for strictly more than this many days are
    /// deleted.
    pub older_than_days: u32,

    /// Deadline for the deletion phase. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("api_token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("older_than_days", &self.older_than_days)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build the configuration from a variable lookup function.
    pub fn from_vars<F>(var: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            var(name)
                .filter(|value| !value.is_empty())
                .ok_or(Error::Missing(name))
        };

        let username = required(USERNAME_VAR)?;
        let api_token = required(API_TOKEN_VAR)?;

        let older_than_days = match var(OLDER_THAN_VAR) {
            Some(value) => parse_older_than(OLDER_THAN_VAR, &value)?,
            None => DEFAULT_OLDER_THAN_DAYS,
        };

        let timeout = var(TIMEOUT_VAR)
            .map(|value| parse_timeout(TIMEOUT_VAR, &value))
            .transpose()?;

        Ok(
            Config {
                username,
                api_token,
                api_url: var(API_URL_VAR)
                    .filter(|value| !value.is_empty())
                    .unwrap_or_else(|| DEFAULT_API_URL.to_owned()),
                older_than_days,
                timeout,
            }
        )
    }
}


/// Parse an age threshold in whole days.
pub fn parse_older_than(name: &'static str, value: &str) -> Result<u32, Error> {
    value.trim()
        .parse()
        .map_err(|_| Error::Invalid {
            name,
            value: value.to_owned(),
        })
}

/// Parse a timeout in seconds. Fractional seconds are allowed.
pub fn parse_timeout(name: &'static str, value: &str) -> Result<Duration, Error> {
    let invalid = || Error::Invalid {
        name,
        value: value.to_owned(),
    };

    let seconds: f64 = value.trim()
        .parse()
        .map_err(|_| invalid())?;

    Duration::try_from_secs_f64(seconds)
        .map_err(|_| invalid())
}
