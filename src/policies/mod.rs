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

//! The policies module reads and edits the named policies attached to the groups of a channel
//! configuration. Policies are exchanged with callers in their textual rule form, such as
//! `ANY Readers` or `AND('Org1MSP.admin', 'Org2MSP.admin')`, while the configuration stores them
//! encoded.

mod compiler;
mod editor;
mod error;
pub mod format;
mod scope;

use std::collections::HashMap;
use std::str::FromStr;

use log::trace;
use protobuf::ProtobufEnum;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::protocol::config::{Config, ConfigPolicy};
use crate::protocol::policy::{ImplicitMetaPolicy, SignaturePolicyEnvelope};
use crate::protos::policies::Policy_PolicyType;
use crate::protos::FromBytes;

pub use compiler::{DslRuleCompiler, RuleCompileError, RuleCompiler};
pub use editor::PolicyEditor;
pub use error::PolicyError;
pub use scope::{
    locate, locate_mut, Scope, APPLICATION_GROUP_KEY, CONSORTIUMS_GROUP_KEY, ORDERER_GROUP_KEY,
};

pub const ADMINS_POLICY_KEY: &str = "Admins";
pub const READERS_POLICY_KEY: &str = "Readers";
pub const WRITERS_POLICY_KEY: &str = "Writers";
pub const BLOCK_VALIDATION_POLICY_KEY: &str = "BlockValidation";

/// The form of a policy's rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PolicyType {
    ImplicitMeta,
    Signature,
}

impl PolicyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyType::ImplicitMeta => "ImplicitMeta",
            PolicyType::Signature => "Signature",
        }
    }
}

impl std::fmt::Display for PolicyType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyType {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ImplicitMeta" => Ok(PolicyType::ImplicitMeta),
            "Signature" => Ok(PolicyType::Signature),
            _ => Err(PolicyError::UnknownKind(format!(
                "unknown policy type: {}",
                s
            ))),
        }
    }
}

/// A policy in its textual form
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Policy {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    policy_type: PolicyType,
    rule: String,
}

impl Policy {
    pub fn new(policy_type: PolicyType, rule: &str) -> Self {
        Policy {
            policy_type,
            rule: rule.into(),
        }
    }

    pub fn implicit_meta(rule: &str) -> Self {
        Policy::new(PolicyType::ImplicitMeta, rule)
    }

    pub fn signature(rule: &str) -> Self {
        Policy::new(PolicyType::Signature, rule)
    }

    pub fn policy_type(&self) -> PolicyType {
        self.policy_type
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }
}

/// Decodes a group's policy map into textual policies.
///
/// # Errors
///
/// Returns an error, and no policies, if any entry has an unsupported type, cannot be decoded
/// or cannot be rendered.
pub fn get_policies(
    policies: &HashMap<String, ConfigPolicy>,
) -> Result<HashMap<String, Policy>, PolicyError> {
    let mut result = HashMap::with_capacity(policies.len());

    for (name, config_policy) in policies {
        let policy = to_policy(config_policy)?;
        trace!(
            "Read {} policy '{}': {}",
            policy.policy_type(),
            name,
            policy.rule()
        );
        result.insert(name.clone(), policy);
    }

    Ok(result)
}

/// Decodes the policies of the group at the given scope.
///
/// # Errors
///
/// Returns `PolicyError::NotFound` if the scope does not exist, or any error of
/// [`get_policies`](fn.get_policies.html).
pub fn get_policies_for_scope(
    config: &Config,
    scope: &Scope,
) -> Result<HashMap<String, Policy>, PolicyError> {
    get_policies(locate(config, scope)?.policies())
}

fn to_policy(config_policy: &ConfigPolicy) -> Result<Policy, PolicyError> {
    let stored = config_policy.policy();

    match Policy_PolicyType::from_i32(stored.policy_type()) {
        Some(Policy_PolicyType::IMPLICIT_META) => {
            let policy = ImplicitMetaPolicy::from_bytes(stored.value())?;
            Ok(Policy::implicit_meta(&format::implicit_meta_to_string(
                &policy,
            )))
        }
        Some(Policy_PolicyType::SIGNATURE) => {
            let envelope = SignaturePolicyEnvelope::from_bytes(stored.value())?;
            Ok(Policy::signature(&format::envelope_to_string(&envelope)?))
        }
        _ => Err(PolicyError::UnknownKind(format!(
            "unknown policy type: {}",
            stored.policy_type()
        ))),
    }
}
