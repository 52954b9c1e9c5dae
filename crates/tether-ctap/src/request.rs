//! Outgoing authenticator request encoding.
//!
//! A request on the wire is one command byte followed by an optional
//! canonical map of small integer parameter keys. Requests are built
//! once and never mutated after encoding.

use crate::cbor::Value;

/// CTAP2 command bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Ctap2Command {
    /// Register a new credential
    MakeCredential = 0x01,
    /// Produce an assertion over an existing credential
    GetAssertion = 0x02,
    /// Query authenticator capabilities
    GetInfo = 0x04,
    /// PIN/UV auth protocol subcommands
    ClientPin = 0x06,
    /// Continue a multi-credential assertion
    GetNextAssertion = 0x08,
}

/// An encoded-once authenticator request.
#[derive(Debug, Clone)]
pub struct Ctap2Request {
    /// Command selector
    pub command: Ctap2Command,
    /// Parameter map, absent for parameterless commands
    pub params: Option<Value>,
}

impl Ctap2Request {
    /// Serialize as command byte plus canonical parameter map.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![self.command as u8];
        if let Some(params) = &self.params {
            out.extend_from_slice(&params.encode());
        }
        out
    }
}

fn alg_value(alg: i64) -> Value {
    if alg >= 0 {
        Value::Unsigned(alg as u64)
    } else {
        Value::Negative((-1 - alg) as u64)
    }
}

/// Parameters for an `authenticatorMakeCredential` request.
#[derive(Debug, Clone)]
pub struct MakeCredentialRequest {
    /// SHA-256 of the client data JSON
    pub client_data_hash: Vec<u8>,
    /// Relying party identifier
    pub rp_id: String,
    /// Relying party display name
    pub rp_name: String,
    /// User handle
    pub user_id: Vec<u8>,
    /// User account name
    pub user_name: String,
    /// User display name
    pub user_display_name: String,
    /// COSE algorithm identifiers, in preference order
    pub algorithms: Vec<i64>,
    /// Request a discoverable credential
    pub resident_key: bool,
    /// Require user verification
    pub user_verification: bool,
}

impl MakeCredentialRequest {
    /// Build the wire request.
    #[must_use]
    pub fn into_request(self) -> Ctap2Request {
        let params = vec![
            (Value::Unsigned(1), Value::Bytes(self.client_data_hash)),
            (
                Value::Unsigned(2),
                Value::Map(vec![
                    (Value::text("id"), Value::Text(self.rp_id)),
                    (Value::text("name"), Value::Text(self.rp_name)),
                ]),
            ),
            (
                Value::Unsigned(3),
                Value::Map(vec![
                    (Value::text("id"), Value::Bytes(self.user_id)),
                    (Value::text("name"), Value::Text(self.user_name)),
                    (
                        Value::text("displayName"),
                        Value::Text(self.user_display_name),
                    ),
                ]),
            ),
            (
                Value::Unsigned(4),
                Value::Array(
                    self.algorithms
                        .into_iter()
                        .map(|alg| {
                            Value::Map(vec![
                                (Value::text("alg"), alg_value(alg)),
                                (Value::text("type"), Value::text("public-key")),
                            ])
                        })
                        .collect(),
                ),
            ),
            (
                Value::Unsigned(7),
                Value::Map(vec![
                    (Value::text("rk"), Value::Bool(self.resident_key)),
                    (Value::text("uv"), Value::Bool(self.user_verification)),
                ]),
            ),
        ];
        Ctap2Request {
            command: Ctap2Command::MakeCredential,
            params: Some(Value::Map(params)),
        }
    }
}

/// Parameters for an `authenticatorGetAssertion` request.
#[derive(Debug, Clone)]
pub struct GetAssertionRequest {
    /// Relying party identifier
    pub rp_id: String,
    /// SHA-256 of the client data JSON
    pub client_data_hash: Vec<u8>,
    /// Acceptable credential ids; empty means any discoverable one
    pub allow_list: Vec<Vec<u8>>,
    /// Require user presence
    pub user_presence: bool,
    /// Require user verification
    pub user_verification: bool,
}

impl GetAssertionRequest {
    /// Build the wire request.
    #[must_use]
    pub fn into_request(self) -> Ctap2Request {
        let mut params = vec![
            (Value::Unsigned(1), Value::Text(self.rp_id)),
            (Value::Unsigned(2), Value::Bytes(self.client_data_hash)),
        ];
        if !self.allow_list.is_empty() {
            params.push((
                Value::Unsigned(3),
                Value::Array(
                    self.allow_list
                        .into_iter()
                        .map(|id| {
                            Value::Map(vec![
                                (Value::text("id"), Value::Bytes(id)),
                                (Value::text("type"), Value::text("public-key")),
                            ])
                        })
                        .collect(),
                ),
            ));
        }
        params.push((
            Value::Unsigned(5),
            Value::Map(vec![
                (Value::text("up"), Value::Bool(self.user_presence)),
                (Value::text("uv"), Value::Bool(self.user_verification)),
            ]),
        ));
        Ctap2Request {
            command: Ctap2Command::GetAssertion,
            params: Some(Value::Map(params)),
        }
    }
}

/// Parameters for an `authenticatorClientPIN` request.
#[derive(Debug, Clone)]
pub struct ClientPinRequest {
    /// PIN/UV auth protocol version
    pub protocol: u64,
    /// Subcommand selector
    pub sub_command: u64,
}

impl ClientPinRequest {
    /// Build the wire request.
    #[must_use]
    pub fn into_request(self) -> Ctap2Request {
        Ctap2Request {
            command: Ctap2Command::ClientPin,
            params: Some(Value::Map(vec![
                (Value::Unsigned(1), Value::Unsigned(self.protocol)),
                (Value::Unsigned(2), Value::Unsigned(self.sub_command)),
            ])),
        }
    }
}

/// Parameterless `authenticatorGetInfo` request.
#[must_use]
pub fn get_info_request() -> Ctap2Request {
    Ctap2Request {
        command: Ctap2Command::GetInfo,
        params: None,
    }
}

/// Parameterless `authenticatorGetNextAssertion` request.
#[must_use]
pub fn get_next_assertion_request() -> Ctap2Request {
    Ctap2Request {
        command: Ctap2Command::GetNextAssertion,
        params: None,
    }
}
