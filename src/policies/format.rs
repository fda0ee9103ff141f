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

//! Rendering of structured policies as textual rules.
//!
//! This is the inverse of the [`RuleCompiler`](../trait.RuleCompiler.html): signature policy
//! trees are rendered as nested `AND`, `OR` and `OUTOF` gates over quoted principals, and
//! implicit meta policies as `<RULE> <sub policy>`.

use log::debug;

use crate::protocol::policy::{ImplicitMetaPolicy, SignaturePolicy, SignaturePolicyEnvelope};
use crate::protocol::principal::{MspPrincipal, MspRole, PrincipalClassification};
use crate::protos::FromBytes;

use super::PolicyError;

/// The boolean combinator written for an `NOutOf` node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    And,
    Or,
    OutOf,
}

impl Gate {
    /// Infers the gate for a node requiring `n` of `rule_count` rules.
    ///
    /// | condition          | gate    |
    /// |--------------------|---------|
    /// | `n == 1`           | `OR`    |
    /// | `n == rule_count`  | `AND`   |
    /// | otherwise          | `OUTOF` |
    ///
    /// The first matching row wins, so a single rule with a threshold of one is an `OR`.
    pub fn infer(n: usize, rule_count: usize) -> Self {
        if n == 1 {
            Gate::Or
        } else if n == rule_count {
            Gate::And
        } else {
            Gate::OutOf
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Gate::And => "AND",
            Gate::Or => "OR",
            Gate::OutOf => "OUTOF",
        }
    }
}

/// Renders a principal as a quoted identity reference such as `'Org1MSP.admin'`.
///
/// Only role principals have a textual form. The other classifications render as an empty
/// string without error, as no rule syntax exists for them.
///
/// # Errors
///
/// Returns an error if the payload of a role principal cannot be decoded.
pub fn principal_to_string(principal: &MspPrincipal) -> Result<String, PolicyError> {
    match principal.classification() {
        PrincipalClassification::Role => {
            let role = MspRole::from_bytes(principal.principal())?;
            Ok(format!(
                "'{}.{}'",
                role.msp_identifier(),
                role.role().as_str()
            ))
        }
        PrincipalClassification::OrganizationUnit
        | PrincipalClassification::Identity
        | PrincipalClassification::Anonymity
        | PrincipalClassification::Combined => {
            debug!(
                "No textual form for {:?} principal {}",
                principal.classification(),
                hex::encode(principal.principal())
            );
            Ok(String::new())
        }
    }
}

/// Renders a signature policy tree, substituting each `SignedBy` leaf with the identity text at
/// its index. Rules are rendered in their stored order.
///
/// # Panics
///
/// Panics if a `SignedBy` index is not a valid index into `identities`.
pub fn signature_policy_to_string(policy: &SignaturePolicy, identities: &[String]) -> String {
    match policy {
        SignaturePolicy::SignedBy(index) => identities[*index].clone(),
        SignaturePolicy::NOutOf { n, rules } => {
            let gate = Gate::infer(*n, rules.len());

            let mut args = Vec::with_capacity(rules.len() + 1);
            if gate == Gate::OutOf {
                args.push(n.to_string());
            }
            args.extend(
                rules
                    .iter()
                    .map(|rule| signature_policy_to_string(rule, identities)),
            );

            format!("{}({})", gate.keyword(), args.join(", "))
        }
    }
}

/// Renders a signature policy envelope: each identity is rendered once, then the rule tree.
///
/// # Errors
///
/// Returns an error if any of the identities cannot be rendered.
pub fn envelope_to_string(envelope: &SignaturePolicyEnvelope) -> Result<String, PolicyError> {
    let identities = envelope
        .identities()
        .iter()
        .map(principal_to_string)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(signature_policy_to_string(envelope.rule(), &identities))
}

/// Renders an implicit meta policy as `<RULE> <sub policy>`, e.g. `MAJORITY Admins`.
pub fn implicit_meta_to_string(policy: &ImplicitMetaPolicy) -> String {
    format!("{} {}", policy.rule(), policy.sub_policy())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol::policy::{ImplicitMetaRule, SignaturePolicyEnvelopeBuilder};
    use crate::protocol::principal::MspRoleType;

    fn ids(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("'Org{}MSP.member'", i)).collect()
    }

    fn leaves(count: usize) -> Vec<SignaturePolicy> {
        (0..count).map(SignaturePolicy::signed_by).collect()
    }

    /// Verify the gate decision table for every threshold and rule count up to four, including
    /// the zero threshold and single rule edge cases.
    #[test]
    fn gate_decision_table() {
        for rule_count in 0..=4 {
            for n in 0..=4 {
                let expected = if n == 1 {
                    Gate::Or
                } else if n == rule_count {
                    Gate::And
                } else {
                    Gate::OutOf
                };
                assert_eq!(
                    Gate::infer(n, rule_count),
                    expected,
                    "n = {}, rule count = {}",
                    n,
                    rule_count
                );
            }
        }

        assert_eq!(Gate::infer(0, 0), Gate::And);
        assert_eq!(Gate::infer(1, 1), Gate::Or);
        assert_eq!(Gate::infer(0, 2), Gate::OutOf);
        assert_eq!(Gate::infer(3, 2), Gate::OutOf);
    }

    /// Verify the prefix of rendered gates:
    ///
    /// 1. A threshold of one renders as `OR(`
    /// 2. A threshold equal to a rule count above one renders as `AND(`
    /// 3. A threshold strictly between one and the rule count renders as `OUTOF(` with the
    ///    threshold as the first argument
    #[test]
    fn gate_prefixes() {
        let identities = ids(5);

        for rule_count in 1..=5 {
            let text = signature_policy_to_string(
                &SignaturePolicy::n_out_of(1, leaves(rule_count)),
                &identities,
            );
            assert!(text.starts_with("OR("), "{}", text);
        }

        for rule_count in 2..=5 {
            let text = signature_policy_to_string(
                &SignaturePolicy::n_out_of(rule_count, leaves(rule_count)),
                &identities,
            );
            assert!(text.starts_with("AND("), "{}", text);
        }

        for rule_count in 3..=5 {
            for n in 2..rule_count {
                let text = signature_policy_to_string(
                    &SignaturePolicy::n_out_of(n, leaves(rule_count)),
                    &identities,
                );
                assert!(text.starts_with("OUTOF("), "{}", text);
                let first_arg = text["OUTOF(".len()..]
                    .split(", ")
                    .next()
                    .expect("No first argument");
                assert_eq!(first_arg, n.to_string());
            }
        }
    }

    /// Verify that nested trees render recursively with children in stored order.
    #[test]
    fn nested_tree() {
        let identities = vec![
            "'A.admin'".to_string(),
            "'B.member'".to_string(),
            "'C.peer'".to_string(),
        ];
        let policy = SignaturePolicy::n_out_of(
            2,
            vec![
                SignaturePolicy::signed_by(2),
                SignaturePolicy::n_out_of(
                    2,
                    vec![SignaturePolicy::signed_by(0), SignaturePolicy::signed_by(1)],
                ),
                SignaturePolicy::n_out_of(1, vec![SignaturePolicy::signed_by(0)]),
            ],
        );

        assert_eq!(
            signature_policy_to_string(&policy, &identities),
            "OUTOF(2, 'C.peer', AND('A.admin', 'B.member'), OR('A.admin'))"
        );
    }

    /// Verify the degenerate thresholds: an empty node renders as `AND()` and a zero threshold
    /// over rules renders as `OUTOF(0, ...)`.
    #[test]
    fn zero_threshold() {
        let identities = ids(2);

        assert_eq!(
            signature_policy_to_string(&SignaturePolicy::n_out_of(0, vec![]), &identities),
            "AND()"
        );
        assert_eq!(
            signature_policy_to_string(&SignaturePolicy::n_out_of(0, leaves(2)), &identities),
            "OUTOF(0, 'Org0MSP.member', 'Org1MSP.member')"
        );
    }

    /// Verify that role principals render as quoted `msp.role` references.
    #[test]
    fn role_principal() {
        let principal =
            MspPrincipal::from_role(MspRole::new("Org1MSP".into(), MspRoleType::Orderer))
                .expect("Failed to build principal");

        assert_eq!(
            principal_to_string(&principal).expect("Failed to render principal"),
            "'Org1MSP.orderer'"
        );
    }

    /// Verify that principals without a textual form render as an empty string without error.
    #[test]
    fn unsupported_principals_render_empty() {
        for classification in &[
            PrincipalClassification::OrganizationUnit,
            PrincipalClassification::Identity,
            PrincipalClassification::Anonymity,
            PrincipalClassification::Combined,
        ] {
            let principal = MspPrincipal::new(*classification, vec![0x0a, 0x01, 0x41]);
            assert_eq!(
                principal_to_string(&principal).expect("Failed to render principal"),
                ""
            );
        }
    }

    /// Verify that a role principal whose payload is not a role fails to render.
    #[test]
    fn malformed_role_payload() {
        let principal = MspPrincipal::new(PrincipalClassification::Role, vec![0xff, 0xff, 0xff]);

        match principal_to_string(&principal) {
            Err(PolicyError::Codec(_)) => {}
            res => panic!("Expected Err(PolicyError::Codec), got {:?}", res),
        }
    }

    /// Verify that an envelope renders its identities in index order.
    #[test]
    fn envelope() {
        let envelope = SignaturePolicyEnvelopeBuilder::new()
            .with_rule(SignaturePolicy::n_out_of(
                2,
                vec![SignaturePolicy::signed_by(1), SignaturePolicy::signed_by(0)],
            ))
            .with_identities(vec![
                MspPrincipal::from_role(MspRole::new("Org1MSP".into(), MspRoleType::Admin))
                    .expect("Failed to build principal"),
                MspPrincipal::from_role(MspRole::new("Org2MSP".into(), MspRoleType::Client))
                    .expect("Failed to build principal"),
            ])
            .build()
            .expect("Failed to build envelope");

        assert_eq!(
            envelope_to_string(&envelope).expect("Failed to render envelope"),
            "AND('Org2MSP.client', 'Org1MSP.admin')"
        );
    }

    #[test]
    fn implicit_meta() {
        let policy = ImplicitMetaPolicy::new(ImplicitMetaRule::Majority, "Admins".into());
        assert_eq!(implicit_meta_to_string(&policy), "MAJORITY Admins");
    }
}
