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

//! Provides a policy editor which installs and removes the policies of config groups.

use std::collections::HashMap;

use log::debug;

use crate::protocol::config::{Config, ConfigGroup, ConfigPolicy, StoredPolicy};
use crate::protos::policies::Policy_PolicyType;
use crate::protos::IntoBytes;

use super::compiler::{DslRuleCompiler, RuleCompiler};
use super::scope::{locate_mut, Scope};
use super::{
    Policy, PolicyError, PolicyType, ADMINS_POLICY_KEY, BLOCK_VALIDATION_POLICY_KEY,
    READERS_POLICY_KEY, WRITERS_POLICY_KEY,
};

const REQUIRED_POLICIES: [&str; 3] = [ADMINS_POLICY_KEY, READERS_POLICY_KEY, WRITERS_POLICY_KEY];

/// The PolicyEditor compiles textual policies with a [`RuleCompiler`](trait.RuleCompiler.html)
/// and stores them, encoded, in the policy maps of config groups.
///
/// The editor performs no locking; callers sharing a `Config` must serialize access to it.
pub struct PolicyEditor {
    compiler: Box<dyn RuleCompiler>,
}

impl PolicyEditor {
    pub fn new(compiler: Box<dyn RuleCompiler>) -> Self {
        PolicyEditor { compiler }
    }

    /// Adds a policy to the group at the given scope, replacing any policy of the same name.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::NotFound` if the scope does not exist, or any error of
    /// [`add_group_policy`](#method.add_group_policy).
    pub fn add_policy(
        &self,
        config: &mut Config,
        scope: &Scope,
        mod_policy: &str,
        policy_name: &str,
        policy: &Policy,
    ) -> Result<(), PolicyError> {
        debug!(
            "Adding {} policy '{}' to {} with mod policy '{}'",
            policy.policy_type(),
            policy_name,
            scope,
            mod_policy
        );
        self.add_group_policy(locate_mut(config, scope)?, mod_policy, policy_name, policy)
    }

    /// Adds a policy to a group, replacing any policy of the same name. The modification policy
    /// is recorded as given.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::InvalidRule` if the rule does not compile; the group is unchanged.
    pub fn add_group_policy(
        &self,
        group: &mut ConfigGroup,
        mod_policy: &str,
        policy_name: &str,
        policy: &Policy,
    ) -> Result<(), PolicyError> {
        let config_policy = self.encode_policy(mod_policy, policy)?;
        group
            .policies_mut()
            .insert(policy_name.to_string(), config_policy);

        Ok(())
    }

    /// Adds a full policy set to the group at the given scope.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::NotFound` if the scope does not exist, or any error of
    /// [`add_group_policies`](#method.add_group_policies).
    pub fn add_policies(
        &self,
        config: &mut Config,
        scope: &Scope,
        policies: &HashMap<String, Policy>,
        mod_policy: &str,
    ) -> Result<(), PolicyError> {
        debug!(
            "Adding {} policies to {} with mod policy '{}'",
            policies.len(),
            scope,
            mod_policy
        );
        self.add_group_policies(locate_mut(config, scope)?, policies, mod_policy)
    }

    /// Adds a full policy set to a group, typically one being created.
    ///
    /// The set must define the `Admins`, `Readers` and `Writers` policies. Every rule is
    /// compiled before the group is touched, so either all policies are added or none are.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::InvariantViolation` if a required policy is missing, or
    /// `PolicyError::InvalidRule` if any rule does not compile.
    pub fn add_group_policies(
        &self,
        group: &mut ConfigGroup,
        policies: &HashMap<String, Policy>,
        mod_policy: &str,
    ) -> Result<(), PolicyError> {
        if let Some(missing) = REQUIRED_POLICIES
            .iter()
            .find(|name| !policies.contains_key(**name))
        {
            return Err(PolicyError::InvariantViolation(format!(
                "no {} policy defined",
                missing
            )));
        }

        let encoded = policies
            .iter()
            .map(|(name, policy)| {
                self.encode_policy(mod_policy, policy)
                    .map(|config_policy| (name.clone(), config_policy))
            })
            .collect::<Result<Vec<_>, _>>()?;

        group.policies_mut().extend(encoded);

        Ok(())
    }

    /// Removes a policy from the group at the given scope.
    ///
    /// The orderer's `BlockValidation` policy can never be removed.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::InvariantViolation` for the orderer's `BlockValidation` policy,
    /// `PolicyError::NotFound` if the scope or the policy does not exist.
    pub fn remove_policy(
        &self,
        config: &mut Config,
        scope: &Scope,
        policy_name: &str,
    ) -> Result<(), PolicyError> {
        if *scope == Scope::Orderer && policy_name == BLOCK_VALIDATION_POLICY_KEY {
            return Err(PolicyError::InvariantViolation(format!(
                "{} policy must be defined",
                BLOCK_VALIDATION_POLICY_KEY
            )));
        }

        let group = locate_mut(config, scope)?;
        if group.policies_mut().remove(policy_name).is_none() {
            return Err(PolicyError::NotFound(format!(
                "could not find policy '{}'",
                policy_name
            )));
        }

        debug!("Removed policy '{}' from {}", policy_name, scope);
        Ok(())
    }

    fn encode_policy(&self, mod_policy: &str, policy: &Policy) -> Result<ConfigPolicy, PolicyError> {
        let stored = match policy.policy_type() {
            PolicyType::ImplicitMeta => {
                let implicit_meta = self
                    .compiler
                    .compile_implicit_meta_policy(policy.rule())
                    .map_err(|err| PolicyError::InvalidRule {
                        context: format!("invalid implicit meta policy rule: '{}'", policy.rule()),
                        source: err,
                    })?;

                StoredPolicy::new(
                    Policy_PolicyType::IMPLICIT_META as i32,
                    implicit_meta.into_bytes()?,
                )
            }
            PolicyType::Signature => {
                let envelope = self
                    .compiler
                    .compile_signature_policy(policy.rule())
                    .map_err(|err| PolicyError::InvalidRule {
                        context: format!("invalid signature policy rule: '{}'", policy.rule()),
                        source: err,
                    })?;

                StoredPolicy::new(Policy_PolicyType::SIGNATURE as i32, envelope.into_bytes()?)
            }
        };

        Ok(ConfigPolicy::new(mod_policy.to_string(), stored))
    }
}

impl Default for PolicyEditor {
    fn default() -> Self {
        PolicyEditor::new(Box::new(DslRuleCompiler::new()))
    }
}
