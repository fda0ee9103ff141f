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

use std::error::Error;

use crate::protos::ProtoConversionError;

use super::compiler::RuleCompileError;

/// Errors raised while reading or editing the policies of a config group
#[derive(Debug)]
pub enum PolicyError {
    /// A group or policy named by the caller is absent from the configuration
    NotFound(String),
    /// A textual rule failed to compile
    InvalidRule {
        context: String,
        source: RuleCompileError,
    },
    /// A policy, principal or signature policy type outside the supported set
    UnknownKind(String),
    /// The request would break a required or protected policy; nothing was changed
    InvariantViolation(String),
    /// A stored policy could not be encoded or decoded
    Codec(ProtoConversionError),
}

impl Error for PolicyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PolicyError::InvalidRule { source, .. } => Some(source),
            PolicyError::Codec(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for PolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            PolicyError::NotFound(ref msg) => f.write_str(msg),
            PolicyError::InvalidRule {
                ref context,
                ref source,
            } => write!(f, "{}: {}", context, source),
            PolicyError::UnknownKind(ref msg) => f.write_str(msg),
            PolicyError::InvariantViolation(ref msg) => f.write_str(msg),
            PolicyError::Codec(ref err) => write!(f, "unable to convert policy: {}", err),
        }
    }
}

impl From<ProtoConversionError> for PolicyError {
    fn from(err: ProtoConversionError) -> Self {
        match err {
            ProtoConversionError::InvalidTypeError(msg) => PolicyError::UnknownKind(msg),
            err => PolicyError::Codec(err),
        }
    }
}
