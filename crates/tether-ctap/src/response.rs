//! Authenticator response decoding.
//!
//! Every response decoder runs a two-step pipeline: a canonical parse
//! over [`Value`] that returns `None` on anything unexpected, then a
//! manual [`RawReader`] walk over the same bytes. The fallback is
//! deliberately forgiving about fields it does not need, but a required
//! field missing after the full walk is the one hard failure in this
//! crate — returning a partially filled response would let a broken
//! peer masquerade as a successful ceremony.

use crate::cbor::Value;
use crate::error::CtapError;
use crate::raw_reader::RawReader;

/// Decoded `authenticatorMakeCredential` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeCredentialResponse {
    /// Credential id pulled out of the attested credential data, when
    /// the authenticator set the attestation flag
    pub credential_id: Option<Vec<u8>>,
    /// Re-encoded WebAuthn attestation object
    pub attestation_object: Vec<u8>,
}

/// Decoded `authenticatorGetAssertion` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAssertionResponse {
    /// Credential the assertion was produced over
    pub credential_id: Vec<u8>,
    /// Raw authenticator data
    pub authenticator_data: Vec<u8>,
    /// Assertion signature
    pub signature: Vec<u8>,
    /// User handle, present for discoverable credentials
    pub user_handle: Option<Vec<u8>>,
}

/// Authenticator capability options from `authenticatorGetInfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetInfoOptions {
    /// Bound platform authenticator
    pub platform_device: bool,
    /// Discoverable credentials supported
    pub resident_key: bool,
    /// Client PIN set state, absent when unsupported
    pub client_pin: Option<bool>,
    /// User presence supported (defaults true when absent)
    pub user_presence: bool,
    /// User verification state, absent when unsupported
    pub user_verification: Option<bool>,
}

/// Decoded `authenticatorGetInfo` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetInfoResponse {
    /// Supported CTAP versions
    pub versions: Vec<String>,
    /// Supported extensions
    pub extensions: Vec<String>,
    /// Authenticator AAGUID
    pub aaguid: Vec<u8>,
    /// Capability options
    pub options: GetInfoOptions,
    /// Maximum message size, when reported
    pub max_msg_size: Option<u64>,
    /// Supported PIN/UV auth protocol versions
    pub pin_uv_auth_protocols: Vec<u64>,
    /// Supported transports, when reported
    pub transports: Option<Vec<String>>,
}

/// Decode a MakeCredential response body.
///
/// # Errors
///
/// [`CtapError::MissingField`] when both paths fail to produce the
/// format or authenticator data, plus reader errors from a truncated
/// fallback walk.
pub fn decode_make_credential(bytes: &[u8]) -> Result<MakeCredentialResponse, CtapError> {
    if let Some(response) = try_decode_make(bytes) {
        return Ok(response);
    }
    fallback_decode_make(bytes)
}

fn try_decode_make(bytes: &[u8]) -> Option<MakeCredentialResponse> {
    let map = Value::decode(bytes).ok()?;
    map.as_map()?;

    let format = map.map_get_int(1)?.as_text()?;
    let auth_data = map.map_get_int(2)?.as_bytes()?;
    let att_stmt = map
        .map_get_int(3)
        .cloned()
        .unwrap_or(Value::Map(Vec::new()));

    Some(MakeCredentialResponse {
        credential_id: extract_credential_id(auth_data),
        attestation_object: build_attestation_object(format, auth_data, att_stmt),
    })
}

fn fallback_decode_make(bytes: &[u8]) -> Result<MakeCredentialResponse, CtapError> {
    let mut reader = RawReader::new(bytes);

    let map_header = reader.read_u8()?;
    let entry_count = map_header & 0x1f;

    let mut format: Option<&str> = None;
    let mut auth_data: Option<&[u8]> = None;

    for _ in 0..entry_count {
        match reader.read_u8()? {
            0x01 => format = Some(reader.read_text_string()?),
            0x02 => auth_data = Some(reader.read_byte_string()?),
            _ => reader.skip_next()?,
        }
    }

    let format = format.ok_or(CtapError::MissingField("fmt"))?;
    let auth_data = auth_data.ok_or(CtapError::MissingField("authData"))?;

    Ok(MakeCredentialResponse {
        credential_id: extract_credential_id(auth_data),
        attestation_object: build_attestation_object(format, auth_data, Value::Map(Vec::new())),
    })
}

/// Decode a GetAssertion response body.
///
/// # Errors
///
/// [`CtapError::MissingField`] when credential id, authenticator data
/// or signature are absent after the fallback walk.
pub fn decode_get_assertion(bytes: &[u8]) -> Result<GetAssertionResponse, CtapError> {
    if let Some(response) = try_decode_get(bytes) {
        return Ok(response);
    }
    fallback_decode_get(bytes)
}

fn try_decode_get(bytes: &[u8]) -> Option<GetAssertionResponse> {
    let map = Value::decode(bytes).ok()?;
    map.as_map()?;

    let credential_id = map.map_get_int(1)?.map_get_text("id")?.as_bytes()?.to_vec();
    let authenticator_data = map.map_get_int(2)?.as_bytes()?.to_vec();
    let signature = map.map_get_int(3)?.as_bytes()?.to_vec();
    let user_handle = map
        .map_get_int(4)
        .and_then(|user| user.map_get_text("id"))
        .and_then(Value::as_bytes)
        .map(<[u8]>::to_vec);

    Some(GetAssertionResponse {
        credential_id,
        authenticator_data,
        signature,
        user_handle,
    })
}

fn fallback_decode_get(bytes: &[u8]) -> Result<GetAssertionResponse, CtapError> {
    let mut reader = RawReader::new(bytes);

    let map_header = reader.read_u8()?;
    let entry_count = map_header & 0x0f;

    let mut credential_id: Option<&[u8]> = None;
    let mut authenticator_data: Option<&[u8]> = None;
    let mut signature: Option<&[u8]> = None;
    let mut user_handle: Option<&[u8]> = None;

    for _ in 0..entry_count {
        match reader.read_u8()? {
            0x01 => {
                let sub_count = reader.read_u8()? & 0x0f;
                for _ in 0..sub_count {
                    match reader.read_text_string()? {
                        "id" => credential_id = Some(reader.read_byte_string()?),
                        _ => reader.skip_next()?,
                    }
                }
            }
            0x02 => authenticator_data = Some(reader.read_byte_string()?),
            0x03 => signature = Some(reader.read_byte_string()?),
            0x04 => {
                let sub_count = reader.read_u8()? & 0x0f;
                for _ in 0..sub_count {
                    match reader.read_text_string()? {
                        "id" => user_handle = Some(reader.read_byte_string()?),
                        _ => reader.skip_next()?,
                    }
                }
            }
            _ => reader.skip_next()?,
        }
    }

    Ok(GetAssertionResponse {
        credential_id: credential_id
            .ok_or(CtapError::MissingField("credentialId"))?
            .to_vec(),
        authenticator_data: authenticator_data
            .ok_or(CtapError::MissingField("authData"))?
            .to_vec(),
        signature: signature.ok_or(CtapError::MissingField("signature"))?.to_vec(),
        user_handle: user_handle.map(<[u8]>::to_vec),
    })
}

/// Decode a GetInfo response body; canonical path only.
#[must_use]
pub fn decode_get_info(bytes: &[u8]) -> Option<GetInfoResponse> {
    let map = Value::decode(bytes).ok()?;
    map.as_map()?;

    let aaguid = map.map_get_int(3)?.as_bytes()?.to_vec();

    let options_map = map.map_get_int(4);
    let option = |name: &str| options_map.and_then(|o| o.map_get_text(name)).and_then(Value::as_bool);
    let options = GetInfoOptions {
        platform_device: option("plat") == Some(true),
        resident_key: option("rk") == Some(true),
        client_pin: option("clientPin"),
        user_presence: option("up") != Some(false),
        user_verification: option("uv"),
    };

    Some(GetInfoResponse {
        versions: text_array(map.map_get_int(1)),
        extensions: text_array(map.map_get_int(2)),
        aaguid,
        options,
        max_msg_size: map.map_get_int(5).and_then(Value::as_unsigned),
        pin_uv_auth_protocols: map
            .map_get_int(6)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_unsigned).collect())
            .unwrap_or_default(),
        transports: map
            .map_get_int(9)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(|v| v.as_text().map(str::to_owned)).collect()),
    })
}

/// Pull the credential id out of raw authenticator data.
///
/// Layout: 32-byte RP-ID hash, 1 flag byte, 4-byte signature counter,
/// then (only when flag bit 0x40 is set) a 16-byte AAGUID, a 2-byte
/// big-endian credential-id length, and the id itself.
#[must_use]
pub fn extract_credential_id(auth_data: &[u8]) -> Option<Vec<u8>> {
    if auth_data.len() < 37 {
        return None;
    }

    let flags = auth_data[32];
    if flags & 0x40 == 0 {
        return None;
    }

    // rpIdHash(32) + flags(1) + counter(4) + aaguid(16)
    let offset = 53;
    let length_bytes = auth_data.get(offset..offset + 2)?;
    let length = usize::from(u16::from_be_bytes([length_bytes[0], length_bytes[1]]));
    let start = offset + 2;

    auth_data.get(start..start + length).map(<[u8]>::to_vec)
}

fn build_attestation_object(format: &str, auth_data: &[u8], att_stmt: Value) -> Vec<u8> {
    Value::Map(vec![
        (Value::text("fmt"), Value::text(format)),
        (Value::text("attStmt"), att_stmt),
        (Value::text("authData"), Value::bytes(auth_data)),
    ])
    .encode()
}

fn text_array(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_text().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Authenticator data with the attested-credential flag and the
    /// given credential id embedded.
    fn auth_data_with_credential(credential_id: &[u8]) -> Vec<u8> {
        let mut data = vec![0x11; 32]; // rpIdHash
        data.push(0x45); // UP | UV | AT
        data.extend_from_slice(&[0, 0, 0, 7]); // counter
        data.extend_from_slice(&[0x22; 16]); // aaguid
        data.extend_from_slice(&(credential_id.len() as u16).to_be_bytes());
        data.extend_from_slice(credential_id);
        data
    }

    fn canonical_assertion(credential_id: &[u8]) -> Vec<u8> {
        Value::Map(vec![
            (
                Value::Unsigned(1),
                Value::Map(vec![
                    (Value::text("id"), Value::bytes(credential_id)),
                    (Value::text("type"), Value::text("public-key")),
                ]),
            ),
            (
                Value::Unsigned(2),
                Value::Bytes(auth_data_with_credential(credential_id)),
            ),
            (Value::Unsigned(3), Value::bytes(&[0x30, 0x44])),
            (
                Value::Unsigned(4),
                Value::Map(vec![(Value::text("id"), Value::bytes(&[0x99]))]),
            ),
        ])
        .encode()
    }

    #[test]
    fn test_canonical_assertion_recovers_credential_id() {
        let decoded = decode_get_assertion(&canonical_assertion(&[0xde, 0xad])).unwrap();
        assert_eq!(decoded.credential_id, vec![0xde, 0xad]);
        assert_eq!(decoded.signature, vec![0x30, 0x44]);
        assert_eq!(decoded.user_handle, Some(vec![0x99]));
    }

    #[test]
    fn test_assertion_trailing_garbage_takes_fallback() {
        // Canonical decode rejects trailing bytes; the fallback only
        // consumes the entries it counts, so the response still decodes
        let mut bytes = canonical_assertion(&[0xde, 0xad]);
        bytes.push(0xff);
        let decoded = decode_get_assertion(&bytes).unwrap();
        assert_eq!(decoded.credential_id, vec![0xde, 0xad]);
    }

    #[test]
    fn test_fallback_missing_signature_is_hard_error() {
        // Map with credential and authData but no signature (key 3)
        let mut bytes = Value::Map(vec![
            (
                Value::Unsigned(1),
                Value::Map(vec![(Value::text("id"), Value::bytes(&[0xde, 0xad]))]),
            ),
            (
                Value::Unsigned(2),
                Value::Bytes(auth_data_with_credential(&[0xde, 0xad])),
            ),
        ])
        .encode();
        bytes.push(0xff); // force the fallback path

        assert_eq!(
            decode_get_assertion(&bytes),
            Err(CtapError::MissingField("signature"))
        );
    }

    #[test]
    fn test_make_credential_canonical() {
        let auth_data = auth_data_with_credential(&[0xaa, 0xbb, 0xcc]);
        let bytes = Value::Map(vec![
            (Value::Unsigned(1), Value::text("packed")),
            (Value::Unsigned(2), Value::Bytes(auth_data.clone())),
            (
                Value::Unsigned(3),
                Value::Map(vec![(Value::text("alg"), Value::Negative(6))]),
            ),
        ])
        .encode();

        let decoded = decode_make_credential(&bytes).unwrap();
        assert_eq!(decoded.credential_id, Some(vec![0xaa, 0xbb, 0xcc]));

        let attestation = Value::decode(&decoded.attestation_object).unwrap();
        assert_eq!(
            attestation.map_get_text("fmt").and_then(Value::as_text),
            Some("packed")
        );
        assert_eq!(
            attestation.map_get_text("authData").and_then(Value::as_bytes),
            Some(&auth_data[..])
        );
        assert!(attestation.map_get_text("attStmt").is_some());
    }

    #[test]
    fn test_make_credential_fallback_empty_att_stmt() {
        let auth_data = auth_data_with_credential(&[0x01]);
        let mut bytes = Value::Map(vec![
            (Value::Unsigned(1), Value::text("none")),
            (Value::Unsigned(2), Value::Bytes(auth_data)),
        ])
        .encode();
        bytes.push(0x00); // trailing byte forces the fallback

        let decoded = decode_make_credential(&bytes).unwrap();
        let attestation = Value::decode(&decoded.attestation_object).unwrap();
        assert_eq!(
            attestation.map_get_text("attStmt"),
            Some(&Value::Map(Vec::new()))
        );
    }

    #[test]
    fn test_make_credential_fallback_missing_fmt() {
        let mut bytes = Value::Map(vec![(
            Value::Unsigned(2),
            Value::Bytes(auth_data_with_credential(&[1])),
        )])
        .encode();
        bytes.push(0x00);

        assert_eq!(
            decode_make_credential(&bytes),
            Err(CtapError::MissingField("fmt"))
        );
    }

    #[test]
    fn test_extract_credential_id_bounds() {
        assert_eq!(extract_credential_id(&[0u8; 36]), None); // too short

        let mut no_flag = auth_data_with_credential(&[1, 2]);
        no_flag[32] = 0x01; // AT bit clear
        assert_eq!(extract_credential_id(&no_flag), None);

        let mut overrun = auth_data_with_credential(&[1, 2]);
        let len = overrun.len();
        overrun[len - 4..len - 2].copy_from_slice(&100u16.to_be_bytes());
        assert_eq!(extract_credential_id(&overrun), None);

        assert_eq!(
            extract_credential_id(&auth_data_with_credential(&[0xde, 0xad])),
            Some(vec![0xde, 0xad])
        );
    }

    #[test]
    fn test_get_info_decode() {
        let bytes = Value::Map(vec![
            (
                Value::Unsigned(1),
                Value::Array(vec![Value::text("FIDO_2_0"), Value::text("FIDO_2_1")]),
            ),
            (Value::Unsigned(2), Value::Array(vec![Value::text("prf")])),
            (Value::Unsigned(3), Value::Bytes(vec![0x33; 16])),
            (
                Value::Unsigned(4),
                Value::Map(vec![
                    (Value::text("rk"), Value::Bool(true)),
                    (Value::text("uv"), Value::Bool(true)),
                ]),
            ),
            (Value::Unsigned(5), Value::Unsigned(1200)),
            (
                Value::Unsigned(6),
                Value::Array(vec![Value::Unsigned(1), Value::Unsigned(2)]),
            ),
            (
                Value::Unsigned(9),
                Value::Array(vec![Value::text("internal"), Value::text("hybrid")]),
            ),
        ])
        .encode();

        let info = decode_get_info(&bytes).unwrap();
        assert_eq!(info.versions, vec!["FIDO_2_0", "FIDO_2_1"]);
        assert_eq!(info.extensions, vec!["prf"]);
        assert_eq!(info.aaguid, vec![0x33; 16]);
        assert!(info.options.resident_key);
        assert!(info.options.user_presence); // absent defaults true
        assert_eq!(info.options.user_verification, Some(true));
        assert_eq!(info.max_msg_size, Some(1200));
        assert_eq!(info.pin_uv_auth_protocols, vec![1, 2]);
        assert_eq!(
            info.transports,
            Some(vec!["internal".to_owned(), "hybrid".to_owned()])
        );
    }

    #[test]
    fn test_get_info_requires_aaguid() {
        let bytes = Value::Map(vec![(
            Value::Unsigned(1),
            Value::Array(vec![Value::text("FIDO_2_0")]),
        )])
        .encode();
        assert!(decode_get_info(&bytes).is_none());
    }
}
