// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Bank clients.
//!
//! A [`Client`] is the unit the [`Bank`](crate::Bank) registers and the
//! recipient every welcome [`Notification`](crate::Notification) is addressed to.

use crate::base::ClientId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Client gender, used for the salutation in outgoing mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn salutation(&self) -> &'static str {
        match self {
            Self::Male => "Mr.",
            Self::Female => "Ms.",
        }
    }
}

/// A registered bank client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Client {
    id: ClientId,
    name: String,
    gender: Gender,
    city: String,
}

impl Client {
    pub fn new(
        id: ClientId,
        name: impl Into<String>,
        gender: Gender,
        city: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            gender,
            city: city.into(),
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// Returns the name prefixed with the gender salutation, e.g. `Ms. Jane`.
    pub fn greeting_name(&self) -> String {
        format!("{} {}", self.gender.salutation(), self.name)
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{}, {})", self.greeting_name(), self.id, self.city)
    }
}
