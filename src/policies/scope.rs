/*
 * Copyright 2018-2020 Cargill Incorporated
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 * ------------------------------------------------------------------------------
 */

//! Location of the config groups that carry policies.

use crate::protocol::config::{Config, ConfigGroup};

use super::PolicyError;

pub const ORDERER_GROUP_KEY: &str = "Orderer";
pub const APPLICATION_GROUP_KEY: &str = "Application";
pub const CONSORTIUMS_GROUP_KEY: &str = "Consortiums";

/// A config group whose policies can be read or edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    /// The channel's `Consortiums` group
    Consortiums,
    /// A consortium within the `Consortiums` group
    Consortium(&'a str),
    /// An organization within a consortium
    ConsortiumOrg { consortium: &'a str, org: &'a str },
    /// The channel's `Orderer` group
    Orderer,
    /// An organization within the `Orderer` group
    OrdererOrg(&'a str),
    /// The channel's `Application` group
    Application,
    /// An organization within the `Application` group
    ApplicationOrg(&'a str),
}

/// One key of a scope's path and the description used when it is missing
struct Segment<'a> {
    key: &'a str,
    description: String,
}

impl<'a> Segment<'a> {
    fn group(key: &'a str) -> Self {
        Segment {
            key,
            description: key.to_string(),
        }
    }

    fn named(kind: &str, key: &'a str) -> Self {
        Segment {
            key,
            description: format!("{} '{}'", kind, key),
        }
    }

    fn not_found(&self) -> PolicyError {
        PolicyError::NotFound(format!(
            "{} does not exist in channel config",
            self.description
        ))
    }
}

impl<'a> Scope<'a> {
    /// The keys leading from the channel group to this scope's group.
    fn path(&self) -> Vec<Segment<'a>> {
        match *self {
            Scope::Consortiums => vec![Segment::group(CONSORTIUMS_GROUP_KEY)],
            Scope::Consortium(consortium) => vec![
                Segment::group(CONSORTIUMS_GROUP_KEY),
                Segment::named("consortium", consortium),
            ],
            Scope::ConsortiumOrg { consortium, org } => vec![
                Segment::group(CONSORTIUMS_GROUP_KEY),
                Segment::named("consortium", consortium),
                Segment::named("consortium org", org),
            ],
            Scope::Orderer => vec![Segment::group(ORDERER_GROUP_KEY)],
            Scope::OrdererOrg(org) => vec![
                Segment::group(ORDERER_GROUP_KEY),
                Segment::named("orderer org", org),
            ],
            Scope::Application => vec![Segment::group(APPLICATION_GROUP_KEY)],
            Scope::ApplicationOrg(org) => vec![
                Segment::group(APPLICATION_GROUP_KEY),
                Segment::named("application org", org),
            ],
        }
    }
}

impl<'a> std::fmt::Display for Scope<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let keys = self
            .path()
            .iter()
            .map(|segment| segment.key)
            .collect::<Vec<_>>();
        f.write_str(&keys.join("/"))
    }
}

/// Returns the group of the given scope.
///
/// # Errors
///
/// Returns `PolicyError::NotFound` naming the first segment of the scope's path that is absent.
pub fn locate<'c>(config: &'c Config, scope: &Scope) -> Result<&'c ConfigGroup, PolicyError> {
    scope
        .path()
        .iter()
        .try_fold(config.channel_group(), |group, segment| {
            group.group(segment.key).ok_or_else(|| segment.not_found())
        })
}

/// Returns the group of the given scope for modification.
///
/// # Errors
///
/// Returns `PolicyError::NotFound` naming the first segment of the scope's path that is absent.
pub fn locate_mut<'c>(
    config: &'c mut Config,
    scope: &Scope,
) -> Result<&'c mut ConfigGroup, PolicyError> {
    scope
        .path()
        .iter()
        .try_fold(config.channel_group_mut(), |group, segment| {
            group.group_mut(segment.key).ok_or_else(|| segment.not_found())
        })
}
