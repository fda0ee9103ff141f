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

//! Compilation of textual rules into structured policies.

use std::error::Error;

use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;

use crate::protocol::policy::{
    ImplicitMetaPolicy, ImplicitMetaRule, SignaturePolicy, SignaturePolicyEnvelope,
    SignaturePolicyEnvelopeBuilder,
};
use crate::protocol::principal::{MspPrincipal, MspRole, MspRoleType};

/// Raised when a textual rule cannot be compiled
#[derive(Debug)]
pub struct RuleCompileError {
    message: String,
}

impl RuleCompileError {
    pub fn new(message: &str) -> Self {
        RuleCompileError {
            message: message.into(),
        }
    }
}

impl Error for RuleCompileError {}

impl std::fmt::Display for RuleCompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Compiles textual rules into the structured policies stored in a config group.
pub trait RuleCompiler: Send + Sync {
    /// Compiles a signature rule, such as `AND('Org1MSP.admin', 'Org2MSP.admin')`, into an
    /// envelope holding the threshold tree and the identities its leaves refer to.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule is not a valid signature rule.
    fn compile_signature_policy(
        &self,
        rule: &str,
    ) -> Result<SignaturePolicyEnvelope, RuleCompileError>;

    /// Compiles an implicit meta rule, such as `ANY Readers`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule is not a valid implicit meta rule.
    fn compile_implicit_meta_policy(
        &self,
        rule: &str,
    ) -> Result<ImplicitMetaPolicy, RuleCompileError>;
}

#[derive(Parser)]
#[grammar = "policies/policy.pest"]
struct SignatureRuleParser;

/// The default rule compiler for the policy DSL.
///
/// Signature rules are built from the gates `AND(...)`, `OR(...)` and `OUTOF(n, ...)` (keywords
/// are case-insensitive) over nested gates and quoted principals of the form `'<msp id>.<role>'`,
/// where the role is one of `member`, `admin`, `client`, `peer` or `orderer`. Every principal
/// occurrence appends one identity, in order of appearance.
///
/// Implicit meta rules are exactly `<ANY|ALL|MAJORITY> <sub policy>`.
#[derive(Debug, Default, Clone)]
pub struct DslRuleCompiler;

impl DslRuleCompiler {
    pub fn new() -> Self {
        DslRuleCompiler
    }
}

impl RuleCompiler for DslRuleCompiler {
    fn compile_signature_policy(
        &self,
        rule: &str,
    ) -> Result<SignaturePolicyEnvelope, RuleCompileError> {
        let policy = SignatureRuleParser::parse(Rule::policy, rule)
            .map_err(|err| RuleCompileError::new(&format!("unable to parse rule: {}", err)))?
            .next()
            .ok_or_else(|| RuleCompileError::new("empty rule"))?;

        let gate = policy
            .into_inner()
            .find(|pair| pair.as_rule() == Rule::gate)
            .ok_or_else(|| RuleCompileError::new("rule must be a gate"))?;

        let mut identities = vec![];
        let rule = compile_gate(gate, &mut identities)?;

        SignaturePolicyEnvelopeBuilder::new()
            .with_version(0)
            .with_rule(rule)
            .with_identities(identities)
            .build()
            .map_err(|err| RuleCompileError::new(&err.to_string()))
    }

    fn compile_implicit_meta_policy(
        &self,
        rule: &str,
    ) -> Result<ImplicitMetaPolicy, RuleCompileError> {
        let tokens = rule.split(' ').collect::<Vec<_>>();
        if tokens.len() != 2 {
            return Err(RuleCompileError::new(&format!(
                "expected two space separated tokens, but got {}",
                tokens.len()
            )));
        }

        let meta_rule = match tokens[0] {
            "ANY" => ImplicitMetaRule::Any,
            "ALL" => ImplicitMetaRule::All,
            "MAJORITY" => ImplicitMetaRule::Majority,
            other => {
                return Err(RuleCompileError::new(&format!(
                    "unknown rule type '{}', expected ALL, ANY, or MAJORITY",
                    other
                )))
            }
        };

        Ok(ImplicitMetaPolicy::new(meta_rule, tokens[1].to_string()))
    }
}

fn compile_gate(
    gate: Pair<Rule>,
    identities: &mut Vec<MspPrincipal>,
) -> Result<SignaturePolicy, RuleCompileError> {
    let gate = gate
        .into_inner()
        .next()
        .ok_or_else(|| RuleCompileError::new("gate has no body"))?;

    match gate.as_rule() {
        Rule::and_gate => {
            let rules = compile_rules(gate.into_inner(), identities)?;
            Ok(SignaturePolicy::n_out_of(rules.len(), rules))
        }
        Rule::or_gate => {
            let rules = compile_rules(gate.into_inner(), identities)?;
            Ok(SignaturePolicy::n_out_of(1, rules))
        }
        Rule::out_of_gate => {
            let mut inner = gate.into_inner();
            let threshold = inner
                .next()
                .ok_or_else(|| RuleCompileError::new("OUTOF requires a threshold"))?;
            let n = threshold.as_str().parse::<usize>().map_err(|err| {
                RuleCompileError::new(&format!(
                    "invalid threshold '{}': {}",
                    threshold.as_str(),
                    err
                ))
            })?;

            let rules = compile_rules(inner, identities)?;
            if n > rules.len() {
                return Err(RuleCompileError::new(&format!(
                    "threshold {} exceeds the number of rules ({})",
                    n,
                    rules.len()
                )));
            }

            Ok(SignaturePolicy::n_out_of(n, rules))
        }
        other => Err(RuleCompileError::new(&format!(
            "unexpected gate {:?}",
            other
        ))),
    }
}

fn compile_rules(
    pairs: Pairs<Rule>,
    identities: &mut Vec<MspPrincipal>,
) -> Result<Vec<SignaturePolicy>, RuleCompileError> {
    let mut rules = vec![];

    for pair in pairs {
        let rule = match pair.as_rule() {
            Rule::gate => compile_gate(pair, identities)?,
            Rule::principal => compile_principal(pair, identities)?,
            other => {
                return Err(RuleCompileError::new(&format!(
                    "unexpected rule {:?}",
                    other
                )))
            }
        };
        rules.push(rule);
    }

    Ok(rules)
}

fn compile_principal(
    principal: Pair<Rule>,
    identities: &mut Vec<MspPrincipal>,
) -> Result<SignaturePolicy, RuleCompileError> {
    let name = principal
        .into_inner()
        .next()
        .ok_or_else(|| RuleCompileError::new("principal has no name"))?
        .as_str();

    let (msp_id, role) = match name.rfind('.') {
        Some(split) if split > 0 => (&name[..split], &name[split + 1..]),
        _ => {
            return Err(RuleCompileError::new(&format!(
                "principal '{}' must be of the form '<msp id>.<role>'",
                name
            )))
        }
    };

    let role = role.parse::<MspRoleType>().map_err(|_| {
        RuleCompileError::new(&format!(
            "unknown role '{}' in principal '{}', expected admin, member, client, peer or \
             orderer",
            role, name
        ))
    })?;

    let principal = MspPrincipal::from_role(MspRole::new(msp_id.to_string(), role))
        .map_err(|err| RuleCompileError::new(&err.to_string()))?;

    identities.push(principal);
    Ok(SignaturePolicy::signed_by(identities.len() - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol::principal::PrincipalClassification;
    use crate::protos::FromBytes;

    fn role_of(principal: &MspPrincipal) -> MspRole {
        assert_eq!(principal.classification(), PrincipalClassification::Role);
        MspRole::from_bytes(principal.principal()).expect("Failed to decode role")
    }

    /// Verify that an `AND` rule compiles to a threshold equal to its rule count, with one
    /// identity per principal in order of appearance.
    #[test]
    fn compile_and() {
        let envelope = DslRuleCompiler::new()
            .compile_signature_policy("AND('Org1MSP.admin', 'Org2MSP.member')")
            .expect("Failed to compile rule");

        assert_eq!(envelope.version(), 0);
        assert_eq!(
            envelope.rule(),
            &SignaturePolicy::n_out_of(
                2,
                vec![SignaturePolicy::signed_by(0), SignaturePolicy::signed_by(1)]
            )
        );
        assert_eq!(
            role_of(&envelope.identities()[0]),
            MspRole::new("Org1MSP".into(), MspRoleType::Admin)
        );
        assert_eq!(
            role_of(&envelope.identities()[1]),
            MspRole::new("Org2MSP".into(), MspRoleType::Member)
        );
    }

    /// Verify nested gates, case-insensitive keywords, double quotes and MSP ids containing dots.
    ///
    /// 1. Compile an `OutOf` rule holding an `or` gate
    /// 2. Verify the tree shape and thresholds
    /// 3. Verify the identities, including a repeated principal, in order of appearance
    #[test]
    fn compile_nested() {
        let envelope = DslRuleCompiler::new()
            .compile_signature_policy(
                "OutOf(2, 'org.example.com.peer', or(\"Org2-MSP.client\", 'Org3MSP.orderer'), \
                 'org.example.com.peer')",
            )
            .expect("Failed to compile rule");

        assert_eq!(
            envelope.rule(),
            &SignaturePolicy::n_out_of(
                2,
                vec![
                    SignaturePolicy::signed_by(0),
                    SignaturePolicy::n_out_of(
                        1,
                        vec![SignaturePolicy::signed_by(1), SignaturePolicy::signed_by(2)]
                    ),
                    SignaturePolicy::signed_by(3),
                ]
            )
        );

        let roles = envelope
            .identities()
            .iter()
            .map(role_of)
            .collect::<Vec<_>>();
        assert_eq!(
            roles,
            vec![
                MspRole::new("org.example.com".into(), MspRoleType::Peer),
                MspRole::new("Org2-MSP".into(), MspRoleType::Client),
                MspRole::new("Org3MSP".into(), MspRoleType::Orderer),
                MspRole::new("org.example.com".into(), MspRoleType::Peer),
            ]
        );
    }

    /// Verify that malformed signature rules are rejected.
    #[test]
    fn invalid_signature_rules() {
        let compiler = DslRuleCompiler::new();

        for rule in &[
            "",
            "'Org1MSP.admin'",
            "AND()",
            "AND('Org1MSP.admin'",
            "AND('Org1MSP.admin') trailing",
            "XOR('Org1MSP.admin')",
            "OUTOF('Org1MSP.admin')",
            "OUTOF(3, 'Org1MSP.admin', 'Org2MSP.admin')",
            "AND('Org1MSP.auditor')",
            "AND('Org1MSP')",
            "AND('.admin')",
            "AND('Org1 MSP.admin')",
        ] {
            assert!(
                compiler.compile_signature_policy(rule).is_err(),
                "rule {:?} should not compile",
                rule
            );
        }
    }

    /// Verify that implicit meta rules compile for each quantifier.
    #[test]
    fn compile_implicit_meta() {
        let compiler = DslRuleCompiler::new();

        assert_eq!(
            compiler
                .compile_implicit_meta_policy("ANY Readers")
                .expect("Failed to compile rule"),
            ImplicitMetaPolicy::new(ImplicitMetaRule::Any, "Readers".into())
        );
        assert_eq!(
            compiler
                .compile_implicit_meta_policy("ALL Writers")
                .expect("Failed to compile rule"),
            ImplicitMetaPolicy::new(ImplicitMetaRule::All, "Writers".into())
        );
        assert_eq!(
            compiler
                .compile_implicit_meta_policy("MAJORITY Admins")
                .expect("Failed to compile rule"),
            ImplicitMetaPolicy::new(ImplicitMetaRule::Majority, "Admins".into())
        );
    }

    /// Verify that implicit meta rules with the wrong token count or an unknown quantifier are
    /// rejected.
    #[test]
    fn invalid_implicit_meta_rules() {
        let compiler = DslRuleCompiler::new();

        for rule in &["ANY", "ANY Readers Writers", "SOME Readers", "any Readers", ""] {
            assert!(
                compiler.compile_implicit_meta_policy(rule).is_err(),
                "rule {:?} should not compile",
                rule
            );
        }
    }
}
