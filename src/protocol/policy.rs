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

//! Structured policy payloads: implicit-meta policies and signature policy envelopes

use std::convert::TryFrom;

use protobuf::{Message, ProtobufEnum};

use crate::protos::{
    policies::{
        ImplicitMetaPolicy as ImplicitMetaPolicyProto, ImplicitMetaPolicy_Rule,
        SignaturePolicy as SignaturePolicyProto, SignaturePolicyEnvelope as EnvelopeProto,
        SignaturePolicy_NOutOf, SignaturePolicy_oneof_Type,
    },
    FromBytes, FromNative, FromProto, IntoBytes, IntoNative, IntoProto, ProtoConversionError,
};

use super::principal::MspPrincipal;
use super::ProtocolBuildError;

/// The quantifier applied to the sub-policies of child groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImplicitMetaRule {
    Any,
    All,
    Majority,
}

impl ImplicitMetaRule {
    /// The canonical upper-case name of the rule.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::All => "ALL",
            Self::Majority => "MAJORITY",
        }
    }
}

impl std::fmt::Display for ImplicitMetaRule {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i32> for ImplicitMetaRule {
    type Error = ProtoConversionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Any),
            1 => Ok(Self::All),
            2 => Ok(Self::Majority),
            _ => Err(ProtoConversionError::InvalidTypeError(format!(
                "unknown implicit meta policy rule type {}",
                value
            ))),
        }
    }
}

impl From<ImplicitMetaRule> for ImplicitMetaPolicy_Rule {
    fn from(rule: ImplicitMetaRule) -> Self {
        match rule {
            ImplicitMetaRule::Any => Self::ANY,
            ImplicitMetaRule::All => Self::ALL,
            ImplicitMetaRule::Majority => Self::MAJORITY,
        }
    }
}

/// A policy that delegates to the policy named `sub_policy` in each child group, satisfied
/// according to `rule`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicitMetaPolicy {
    rule: ImplicitMetaRule,
    sub_policy: String,
}

impl ImplicitMetaPolicy {
    pub fn new(rule: ImplicitMetaRule, sub_policy: String) -> Self {
        ImplicitMetaPolicy { rule, sub_policy }
    }

    pub fn rule(&self) -> ImplicitMetaRule {
        self.rule
    }

    pub fn sub_policy(&self) -> &str {
        &self.sub_policy
    }
}

impl FromBytes<ImplicitMetaPolicy> for ImplicitMetaPolicy {
    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtoConversionError> {
        Message::parse_from_bytes(bytes)
            .map_err(|_| {
                ProtoConversionError::SerializationError(
                    "Unable to get ImplicitMetaPolicy from bytes".to_string(),
                )
            })
            .and_then(Self::from_proto)
    }
}

impl FromNative<ImplicitMetaPolicy> for ImplicitMetaPolicyProto {
    fn from_native(policy: ImplicitMetaPolicy) -> Result<Self, ProtoConversionError> {
        let mut policy_proto = ImplicitMetaPolicyProto::new();
        policy_proto.set_rule(ImplicitMetaPolicy_Rule::from(policy.rule).value());
        policy_proto.set_sub_policy(policy.sub_policy);

        Ok(policy_proto)
    }
}

impl FromProto<ImplicitMetaPolicyProto> for ImplicitMetaPolicy {
    fn from_proto(policy: ImplicitMetaPolicyProto) -> Result<Self, ProtoConversionError> {
        Ok(ImplicitMetaPolicy {
            rule: ImplicitMetaRule::try_from(policy.rule)?,
            sub_policy: policy.sub_policy,
        })
    }
}

impl IntoBytes for ImplicitMetaPolicy {
    fn into_bytes(self) -> Result<Vec<u8>, ProtoConversionError> {
        self.into_proto()?.write_to_bytes().map_err(|_| {
            ProtoConversionError::SerializationError(
                "Unable to get bytes from ImplicitMetaPolicy".to_string(),
            )
        })
    }
}

impl IntoNative<ImplicitMetaPolicy> for ImplicitMetaPolicyProto {}
impl IntoProto<ImplicitMetaPolicyProto> for ImplicitMetaPolicy {}

/// A threshold tree over the identities of a
/// [`SignaturePolicyEnvelope`](struct.SignaturePolicyEnvelope.html).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignaturePolicy {
    /// A signature from the identity at the given index of the envelope's identity list
    SignedBy(usize),
    /// At least `n` of the given rules must be satisfied
    NOutOf { n: usize, rules: Vec<SignaturePolicy> },
}

impl SignaturePolicy {
    pub fn signed_by(index: usize) -> Self {
        SignaturePolicy::SignedBy(index)
    }

    pub fn n_out_of(n: usize, rules: Vec<SignaturePolicy>) -> Self {
        SignaturePolicy::NOutOf { n, rules }
    }
}

impl FromNative<SignaturePolicy> for SignaturePolicyProto {
    fn from_native(policy: SignaturePolicy) -> Result<Self, ProtoConversionError> {
        let mut policy_proto = SignaturePolicyProto::new();

        match policy {
            SignaturePolicy::SignedBy(index) => {
                let index = i32::try_from(index).map_err(|_| {
                    ProtoConversionError::SerializationError(format!(
                        "signed by index {} does not fit in an int32",
                        index
                    ))
                })?;
                policy_proto.set_signed_by(index);
            }
            SignaturePolicy::NOutOf { n, rules } => {
                let n = i32::try_from(n).map_err(|_| {
                    ProtoConversionError::SerializationError(format!(
                        "threshold {} does not fit in an int32",
                        n
                    ))
                })?;
                let rules = rules
                    .into_iter()
                    .map(FromNative::from_native)
                    .collect::<Result<_, _>>()?;

                let mut n_out_of = SignaturePolicy_NOutOf::new();
                n_out_of.set_n(n);
                n_out_of.set_rules(rules);
                policy_proto.set_n_out_of(n_out_of);
            }
        }

        Ok(policy_proto)
    }
}

impl FromProto<SignaturePolicyProto> for SignaturePolicy {
    fn from_proto(policy: SignaturePolicyProto) -> Result<Self, ProtoConversionError> {
        match policy.Type {
            Some(SignaturePolicy_oneof_Type::signed_by(index)) => usize::try_from(index)
                .map(SignaturePolicy::SignedBy)
                .map_err(|_| {
                    ProtoConversionError::DeserializationError(format!(
                        "negative signed by index {}",
                        index
                    ))
                }),
            Some(SignaturePolicy_oneof_Type::n_out_of(n_out_of)) => {
                let n = usize::try_from(n_out_of.n).map_err(|_| {
                    ProtoConversionError::DeserializationError(format!(
                        "negative threshold {}",
                        n_out_of.n
                    ))
                })?;
                let rules = n_out_of
                    .rules
                    .into_iter()
                    .map(FromProto::from_proto)
                    .collect::<Result<_, _>>()?;

                Ok(SignaturePolicy::NOutOf { n, rules })
            }
            None => Err(ProtoConversionError::InvalidTypeError(
                "unknown signature policy type".into(),
            )),
        }
    }
}

impl IntoNative<SignaturePolicy> for SignaturePolicyProto {}
impl IntoProto<SignaturePolicyProto> for SignaturePolicy {}

/// A signature policy together with the identities its leaves refer to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturePolicyEnvelope {
    version: i32,
    rule: SignaturePolicy,
    identities: Vec<MspPrincipal>,
}

impl SignaturePolicyEnvelope {
    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn rule(&self) -> &SignaturePolicy {
        &self.rule
    }

    pub fn identities(&self) -> &[MspPrincipal] {
        &self.identities
    }
}

impl FromBytes<SignaturePolicyEnvelope> for SignaturePolicyEnvelope {
    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtoConversionError> {
        Message::parse_from_bytes(bytes)
            .map_err(|_| {
                ProtoConversionError::SerializationError(
                    "Unable to get SignaturePolicyEnvelope from bytes".to_string(),
                )
            })
            .and_then(Self::from_proto)
    }
}

impl FromNative<SignaturePolicyEnvelope> for EnvelopeProto {
    fn from_native(envelope: SignaturePolicyEnvelope) -> Result<Self, ProtoConversionError> {
        let identities = envelope
            .identities
            .into_iter()
            .map(FromNative::from_native)
            .collect::<Result<_, _>>()?;

        let mut envelope_proto = EnvelopeProto::new();
        envelope_proto.set_version(envelope.version);
        envelope_proto.set_rule(envelope.rule.into_proto()?);
        envelope_proto.set_identities(identities);

        Ok(envelope_proto)
    }
}

impl FromProto<EnvelopeProto> for SignaturePolicyEnvelope {
    fn from_proto(mut envelope: EnvelopeProto) -> Result<Self, ProtoConversionError> {
        let rule = envelope.take_rule().into_native()?;
        let identities = envelope
            .identities
            .into_iter()
            .map(FromProto::from_proto)
            .collect::<Result<_, _>>()?;

        SignaturePolicyEnvelopeBuilder::new()
            .with_version(envelope.version)
            .with_rule(rule)
            .with_identities(identities)
            .build()
            .map_err(|err| {
                ProtoConversionError::DeserializationError(format!(
                    "Unable to get SignaturePolicyEnvelope from proto: {}",
                    err
                ))
            })
    }
}

impl IntoBytes for SignaturePolicyEnvelope {
    fn into_bytes(self) -> Result<Vec<u8>, ProtoConversionError> {
        self.into_proto()?.write_to_bytes().map_err(|_| {
            ProtoConversionError::SerializationError(
                "Unable to get bytes from SignaturePolicyEnvelope".to_string(),
            )
        })
    }
}

impl IntoNative<SignaturePolicyEnvelope> for EnvelopeProto {}
impl IntoProto<EnvelopeProto> for SignaturePolicyEnvelope {}

/// Builder for [`SignaturePolicyEnvelope`](struct.SignaturePolicyEnvelope.html)
#[derive(Default, Clone)]
pub struct SignaturePolicyEnvelopeBuilder {
    version: Option<i32>,
    rule: Option<SignaturePolicy>,
    identities: Option<Vec<MspPrincipal>>,
}

impl SignaturePolicyEnvelopeBuilder {
    /// Creates a new `SignaturePolicyEnvelopeBuilder`
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the envelope version; defaults to 0
    pub fn with_version(mut self, version: i32) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the threshold tree of the envelope
    pub fn with_rule(mut self, rule: SignaturePolicy) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Sets the identities referenced by the rule's leaves
    pub fn with_identities(mut self, identities: Vec<MspPrincipal>) -> Self {
        self.identities = Some(identities);
        self
    }

    /// Builds the `SignaturePolicyEnvelope`
    ///
    /// # Errors
    ///
    /// Returns an error if the rule or identities are not set
    pub fn build(self) -> Result<SignaturePolicyEnvelope, ProtocolBuildError> {
        let rule = self.rule.ok_or_else(|| {
            ProtocolBuildError::MissingField("'rule' field is required".to_string())
        })?;
        let identities = self.identities.ok_or_else(|| {
            ProtocolBuildError::MissingField("'identities' field is required".to_string())
        })?;

        Ok(SignaturePolicyEnvelope {
            version: self.version.unwrap_or(0),
            rule,
            identities,
        })
    }
}
