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


/// Wraps a list of errors, one per failed deletion.
#[derive(Debug, Default, thiserror::Error)]
pub struct MultiError {
    errors: Vec<anyhow::Error>,
}

impl MultiError {
    pub fn push(&mut self, error: anyhow::Error) {
        self.errors.push(error);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &anyhow::Error> {
        self.errors.iter()
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.errors
                .iter()
                .map(|e| format!("{:#}", e))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

impl From<anyhow::Error> for MultiError {
    fn from(error: anyhow::Error) -> Self {
        MultiError { errors: vec![error] }
    }
}
