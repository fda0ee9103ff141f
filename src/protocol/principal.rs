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

//! MSP identity principals

use std::convert::TryFrom;
use std::str::FromStr;

use protobuf::{Message, ProtobufEnum};

use crate::protos::{
    msp_principal::{MSPPrincipal, MSPPrincipal_Classification, MSPRole, MSPRole_MSPRoleType},
    FromBytes, FromNative, FromProto, IntoBytes, IntoNative, IntoProto, ProtoConversionError,
};

/// The kind of identity a [`MspPrincipal`](struct.MspPrincipal.html) describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalClassification {
    Role,
    OrganizationUnit,
    Identity,
    Anonymity,
    Combined,
}

impl TryFrom<i32> for PrincipalClassification {
    type Error = ProtoConversionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Role),
            1 => Ok(Self::OrganizationUnit),
            2 => Ok(Self::Identity),
            3 => Ok(Self::Anonymity),
            4 => Ok(Self::Combined),
            _ => Err(ProtoConversionError::InvalidTypeError(format!(
                "unknown principal classification {}",
                value
            ))),
        }
    }
}

impl From<PrincipalClassification> for MSPPrincipal_Classification {
    fn from(classification: PrincipalClassification) -> Self {
        match classification {
            PrincipalClassification::Role => Self::ROLE,
            PrincipalClassification::OrganizationUnit => Self::ORGANIZATION_UNIT,
            PrincipalClassification::Identity => Self::IDENTITY,
            PrincipalClassification::Anonymity => Self::ANONYMITY,
            PrincipalClassification::Combined => Self::COMBINED,
        }
    }
}

/// A cryptographic identity descriptor.
///
/// The principal payload is opaque; its layout depends on the classification. For
/// `PrincipalClassification::Role` it is an encoded [`MspRole`](struct.MspRole.html).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MspPrincipal {
    classification: PrincipalClassification,
    principal: Vec<u8>,
}

impl MspPrincipal {
    pub fn new(classification: PrincipalClassification, principal: Vec<u8>) -> Self {
        MspPrincipal {
            classification,
            principal,
        }
    }

    /// Creates a `Role` principal from the given role.
    ///
    /// # Errors
    ///
    /// Returns an error if the role cannot be encoded.
    pub fn from_role(role: MspRole) -> Result<Self, ProtoConversionError> {
        Ok(MspPrincipal {
            classification: PrincipalClassification::Role,
            principal: role.into_bytes()?,
        })
    }

    pub fn classification(&self) -> PrincipalClassification {
        self.classification
    }

    pub fn principal(&self) -> &[u8] {
        &self.principal
    }
}

impl FromBytes<MspPrincipal> for MspPrincipal {
    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtoConversionError> {
        Message::parse_from_bytes(bytes)
            .map_err(|_| {
                ProtoConversionError::SerializationError(
                    "Unable to get MspPrincipal from bytes".to_string(),
                )
            })
            .and_then(Self::from_proto)
    }
}

impl FromNative<MspPrincipal> for MSPPrincipal {
    fn from_native(principal: MspPrincipal) -> Result<Self, ProtoConversionError> {
        let mut principal_proto = MSPPrincipal::new();
        principal_proto.set_principal_classification(
            MSPPrincipal_Classification::from(principal.classification).value(),
        );
        principal_proto.set_principal(principal.principal);

        Ok(principal_proto)
    }
}

impl FromProto<MSPPrincipal> for MspPrincipal {
    fn from_proto(principal: MSPPrincipal) -> Result<Self, ProtoConversionError> {
        Ok(MspPrincipal {
            classification: PrincipalClassification::try_from(principal.principal_classification)?,
            principal: principal.principal,
        })
    }
}

impl IntoBytes for MspPrincipal {
    fn into_bytes(self) -> Result<Vec<u8>, ProtoConversionError> {
        self.into_proto()?.write_to_bytes().map_err(|_| {
            ProtoConversionError::SerializationError(
                "Unable to get bytes from MspPrincipal".to_string(),
            )
        })
    }
}

impl IntoNative<MspPrincipal> for MSPPrincipal {}
impl IntoProto<MSPPrincipal> for MspPrincipal {}

/// The role a member of an MSP holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MspRoleType {
    Member,
    Admin,
    Client,
    Peer,
    Orderer,
}

impl MspRoleType {
    /// The lower-case name used for the role in policy rules.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
            Self::Client => "client",
            Self::Peer => "peer",
            Self::Orderer => "orderer",
        }
    }
}

impl FromStr for MspRoleType {
    type Err = ProtoConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            "client" => Ok(Self::Client),
            "peer" => Ok(Self::Peer),
            "orderer" => Ok(Self::Orderer),
            _ => Err(ProtoConversionError::InvalidTypeError(format!(
                "unknown MSP role '{}'",
                s
            ))),
        }
    }
}

impl TryFrom<i32> for MspRoleType {
    type Error = ProtoConversionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Member),
            1 => Ok(Self::Admin),
            2 => Ok(Self::Client),
            3 => Ok(Self::Peer),
            4 => Ok(Self::Orderer),
            _ => Err(ProtoConversionError::InvalidTypeError(format!(
                "unknown MSP role type {}",
                value
            ))),
        }
    }
}

impl From<MspRoleType> for MSPRole_MSPRoleType {
    fn from(role: MspRoleType) -> Self {
        match role {
            MspRoleType::Member => Self::MEMBER,
            MspRoleType::Admin => Self::ADMIN,
            MspRoleType::Client => Self::CLIENT,
            MspRoleType::Peer => Self::PEER,
            MspRoleType::Orderer => Self::ORDERER,
        }
    }
}

/// A role held within a given MSP, e.g. the admins of `Org1MSP`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MspRole {
    msp_identifier: String,
    role: MspRoleType,
}

impl MspRole {
    pub fn new(msp_identifier: String, role: MspRoleType) -> Self {
        MspRole {
            msp_identifier,
            role,
        }
    }

    pub fn msp_identifier(&self) -> &str {
        &self.msp_identifier
    }

    pub fn role(&self) -> MspRoleType {
        self.role
    }
}

impl FromBytes<MspRole> for MspRole {
    fn from_bytes(bytes: &[u8]) -> Result<Self, ProtoConversionError> {
        Message::parse_from_bytes(bytes)
            .map_err(|_| {
                ProtoConversionError::SerializationError(
                    "Unable to get MspRole from bytes".to_string(),
                )
            })
            .and_then(Self::from_proto)
    }
}

impl FromNative<MspRole> for MSPRole {
    fn from_native(role: MspRole) -> Result<Self, ProtoConversionError> {
        let mut role_proto = MSPRole::new();
        role_proto.set_msp_identifier(role.msp_identifier);
        role_proto.set_role(MSPRole_MSPRoleType::from(role.role).value());

        Ok(role_proto)
    }
}

impl FromProto<MSPRole> for MspRole {
    fn from_proto(role: MSPRole) -> Result<Self, ProtoConversionError> {
        Ok(MspRole {
            msp_identifier: role.msp_identifier,
            role: MspRoleType::try_from(role.role)?,
        })
    }
}

impl IntoBytes for MspRole {
    fn into_bytes(self) -> Result<Vec<u8>, ProtoConversionError> {
        self.into_proto()?.write_to_bytes().map_err(|_| {
            ProtoConversionError::SerializationError("Unable to get bytes from MspRole".to_string())
        })
    }
}

impl IntoNative<MspRole> for MSPRole {}
impl IntoProto<MSPRole> for MspRole {}
