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

//! Channel configuration tree

use std::collections::HashMap;

use protobuf::Message;

use crate::protos::{
    configtx::{
        Config as ConfigProto, ConfigGroup as ConfigGroupProto,
        ConfigPolicy as ConfigPolicyProto, ConfigValue as ConfigValueProto,
    },
    policies::Policy as StoredPolicyProto,
    FromBytes, FromNative, FromProto, IntoBytes, IntoNative, IntoProto, ProtoConversionError,
};

/// A channel configuration: a sequence number and the root group of the configuration tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    sequence: u64,
    channel_group: ConfigGroup,
}

impl Config {
    pub fn new(sequence: u64, channel_group: ConfigGroup) -> Self {
        Config {
            sequence,
            channel_group,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn channel_group(&self) -> &ConfigGroup {
        &self.channel_group
    }

    pub fn channel_group_mut(&mut self) -> &mut ConfigGroup {
        &mut self.channel_group
    }
}

impl FromBytes<Config> for Config {
    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtoConversionError> {
        Message::parse_from_bytes(bytes)
            .map_err(|_| {
                ProtoConversionError::SerializationError(
                    "Unable to get Config from bytes".to_string(),
                )
            })
            .and_then(Self::from_proto)
    }
}

impl FromNative<Config> for ConfigProto {
    fn from_native(config: Config) -> Result<Self, ProtoConversionError> {
        let mut config_proto = ConfigProto::new();
        config_proto.set_sequence(config.sequence);
        config_proto.set_channel_group(config.channel_group.into_proto()?);

        Ok(config_proto)
    }
}

impl FromProto<ConfigProto> for Config {
    fn from_proto(mut config: ConfigProto) -> Result<Self, ProtoConversionError> {
        Ok(Config {
            sequence: config.sequence,
            channel_group: config.take_channel_group().into_native()?,
        })
    }
}

impl IntoBytes for Config {
    fn into_bytes(self) -> Result<Vec<u8>, ProtoConversionError> {
        self.into_proto()?.write_to_bytes().map_err(|_| {
            ProtoConversionError::SerializationError("Unable to get bytes from Config".to_string())
        })
    }
}

impl IntoNative<Config> for ConfigProto {}
impl IntoProto<ConfigProto> for Config {}

/// A node of the configuration tree.
///
/// A group owns its child groups, its values and the policies governing it, each keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigGroup {
    version: u64,
    groups: HashMap<String, ConfigGroup>,
    values: HashMap<String, ConfigValue>,
    policies: HashMap<String, ConfigPolicy>,
    mod_policy: String,
}

impl ConfigGroup {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn groups(&self) -> &HashMap<String, ConfigGroup> {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut HashMap<String, ConfigGroup> {
        &mut self.groups
    }

    pub fn group(&self, name: &str) -> Option<&ConfigGroup> {
        self.groups.get(name)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut ConfigGroup> {
        self.groups.get_mut(name)
    }

    pub fn values(&self) -> &HashMap<String, ConfigValue> {
        &self.values
    }

    pub fn policies(&self) -> &HashMap<String, ConfigPolicy> {
        &self.policies
    }

    pub fn policies_mut(&mut self) -> &mut HashMap<String, ConfigPolicy> {
        &mut self.policies
    }

    pub fn mod_policy(&self) -> &str {
        &self.mod_policy
    }
}

impl FromBytes<ConfigGroup> for ConfigGroup {
    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtoConversionError> {
        Message::parse_from_bytes(bytes)
            .map_err(|_| {
                ProtoConversionError::SerializationError(
                    "Unable to get ConfigGroup from bytes".to_string(),
                )
            })
            .and_then(Self::from_proto)
    }
}

impl FromNative<ConfigGroup> for ConfigGroupProto {
    fn from_native(group: ConfigGroup) -> Result<Self, ProtoConversionError> {
        let groups = convert_entries(group.groups, ConfigGroupProto::from_native)?;
        let values = convert_entries(group.values, ConfigValueProto::from_native)?;
        let policies = convert_entries(group.policies, ConfigPolicyProto::from_native)?;

        let mut group_proto = ConfigGroupProto::new();
        group_proto.set_version(group.version);
        group_proto.set_groups(groups);
        group_proto.set_values(values);
        group_proto.set_policies(policies);
        group_proto.set_mod_policy(group.mod_policy);

        Ok(group_proto)
    }
}

impl FromProto<ConfigGroupProto> for ConfigGroup {
    fn from_proto(group: ConfigGroupProto) -> Result<Self, ProtoConversionError> {
        let groups = convert_entries(group.groups, ConfigGroup::from_proto)?;
        let values = convert_entries(group.values, ConfigValue::from_proto)?;
        let policies = convert_entries(group.policies, ConfigPolicy::from_proto)?;

        Ok(ConfigGroupBuilder::new()
            .with_version(group.version)
            .with_groups(groups)
            .with_values(values)
            .with_policies(policies)
            .with_mod_policy(group.mod_policy)
            .build())
    }
}

impl IntoBytes for ConfigGroup {
    fn into_bytes(self) -> Result<Vec<u8>, ProtoConversionError> {
        self.into_proto()?.write_to_bytes().map_err(|_| {
            ProtoConversionError::SerializationError(
                "Unable to get bytes from ConfigGroup".to_string(),
            )
        })
    }
}

impl IntoNative<ConfigGroup> for ConfigGroupProto {}
impl IntoProto<ConfigGroupProto> for ConfigGroup {}

fn convert_entries<A, B, F>(
    entries: HashMap<String, A>,
    convert: F,
) -> Result<HashMap<String, B>, ProtoConversionError>
where
    F: Fn(A) -> Result<B, ProtoConversionError>,
{
    entries
        .into_iter()
        .map(|(name, entry)| convert(entry).map(|entry| (name, entry)))
        .collect()
}

/// Builder for [`ConfigGroup`](struct.ConfigGroup.html)
///
/// Every field is optional; unset fields are left empty.
#[derive(Default, Clone)]
pub struct ConfigGroupBuilder {
    version: Option<u64>,
    groups: HashMap<String, ConfigGroup>,
    values: HashMap<String, ConfigValue>,
    policies: HashMap<String, ConfigPolicy>,
    mod_policy: Option<String>,
}

impl ConfigGroupBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_groups(mut self, groups: HashMap<String, ConfigGroup>) -> Self {
        self.groups = groups;
        self
    }

    /// Adds a single child group, replacing any child of the same name
    pub fn with_group(mut self, name: &str, group: ConfigGroup) -> Self {
        self.groups.insert(name.to_string(), group);
        self
    }

    pub fn with_values(mut self, values: HashMap<String, ConfigValue>) -> Self {
        self.values = values;
        self
    }

    pub fn with_policies(mut self, policies: HashMap<String, ConfigPolicy>) -> Self {
        self.policies = policies;
        self
    }

    /// Adds a single policy, replacing any policy of the same name
    pub fn with_policy(mut self, name: &str, policy: ConfigPolicy) -> Self {
        self.policies.insert(name.to_string(), policy);
        self
    }

    pub fn with_mod_policy(mut self, mod_policy: String) -> Self {
        self.mod_policy = Some(mod_policy);
        self
    }

    pub fn build(self) -> ConfigGroup {
        ConfigGroup {
            version: self.version.unwrap_or(0),
            groups: self.groups,
            values: self.values,
            policies: self.policies,
            mod_policy: self.mod_policy.unwrap_or_default(),
        }
    }
}

/// An opaque configuration value; carried so that edited trees encode without loss
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigValue {
    version: u64,
    value: Vec<u8>,
    mod_policy: String,
}

impl ConfigValue {
    pub fn new(version: u64, value: Vec<u8>, mod_policy: String) -> Self {
        ConfigValue {
            version,
            value,
            mod_policy,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn mod_policy(&self) -> &str {
        &self.mod_policy
    }
}

impl FromNative<ConfigValue> for ConfigValueProto {
    fn from_native(value: ConfigValue) -> Result<Self, ProtoConversionError> {
        let mut value_proto = ConfigValueProto::new();
        value_proto.set_version(value.version);
        value_proto.set_value(value.value);
        value_proto.set_mod_policy(value.mod_policy);

        Ok(value_proto)
    }
}

impl FromProto<ConfigValueProto> for ConfigValue {
    fn from_proto(value: ConfigValueProto) -> Result<Self, ProtoConversionError> {
        Ok(ConfigValue {
            version: value.version,
            value: value.value,
            mod_policy: value.mod_policy,
        })
    }
}

impl IntoNative<ConfigValue> for ConfigValueProto {}
impl IntoProto<ConfigValueProto> for ConfigValue {}

/// A policy entry of a config group: the stored policy and the name of the policy that governs
/// modifications to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPolicy {
    version: u64,
    policy: StoredPolicy,
    mod_policy: String,
}

impl ConfigPolicy {
    pub fn new(mod_policy: String, policy: StoredPolicy) -> Self {
        ConfigPolicy {
            version: 0,
            policy,
            mod_policy,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn policy(&self) -> &StoredPolicy {
        &self.policy
    }

    pub fn mod_policy(&self) -> &str {
        &self.mod_policy
    }
}

impl FromNative<ConfigPolicy> for ConfigPolicyProto {
    fn from_native(policy: ConfigPolicy) -> Result<Self, ProtoConversionError> {
        let mut stored_proto = StoredPolicyProto::new();
        stored_proto.set_field_type(policy.policy.policy_type);
        stored_proto.set_value(policy.policy.value);

        let mut policy_proto = ConfigPolicyProto::new();
        policy_proto.set_version(policy.version);
        policy_proto.set_policy(stored_proto);
        policy_proto.set_mod_policy(policy.mod_policy);

        Ok(policy_proto)
    }
}

impl FromProto<ConfigPolicyProto> for ConfigPolicy {
    fn from_proto(mut policy: ConfigPolicyProto) -> Result<Self, ProtoConversionError> {
        let stored = policy.take_policy();

        Ok(ConfigPolicy {
            version: policy.version,
            policy: StoredPolicy::new(stored.field_type, stored.value),
            mod_policy: policy.mod_policy,
        })
    }
}

impl IntoNative<ConfigPolicy> for ConfigPolicyProto {}
impl IntoProto<ConfigPolicyProto> for ConfigPolicy {}

/// An encoded policy and the raw tag of its type.
///
/// The tag is kept as read from the wire so that entries of unsupported types can be reported
/// rather than lost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredPolicy {
    policy_type: i32,
    value: Vec<u8>,
}

impl StoredPolicy {
    pub fn new(policy_type: i32, value: Vec<u8>) -> Self {
        StoredPolicy { policy_type, value }
    }

    pub fn policy_type(&self) -> i32 {
        self.policy_type
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }
}
