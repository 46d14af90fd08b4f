use std::fmt;
use std::ops::Range;

use log::debug;
use serde::Serialize;

use crate::err::{DeserializationError, ProvisioningError, Result};
use crate::utils::ByteCursor;

/// WSP PDU type of a push message.
pub const PUSH_PDU_TYPE: u8 = 0x06;
/// Well known content type `application/vnd.wap.connectivity-wbxml`.
pub const CONNECTIVITY_CONTENT_TYPE: u8 = 0xB6;
/// Content type parameter carrying the security scheme.
pub const SEC_PARAMETER: u8 = 0x91;
/// Content type parameter carrying the MAC.
pub const MAC_PARAMETER: u8 = 0x92;
/// Value length marker announcing a `uintvar` length.
pub const LENGTH_QUOTE: u8 = 0x1F;

/// How the sender of a push message proves its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SecurityScheme {
    /// Keyed with the subscriber's IMSI.
    NetwPin,
    /// Keyed with a PIN shared with the user.
    UserPin,
    /// Keyed with the IMSI followed by the user PIN.
    UserNetwPin,
    /// The user PIN carries its own MAC.
    UserPinMac,
    #[default]
    None,
    Unknown(u8),
}

impl SecurityScheme {
    pub fn from_wire(value: u8) -> Self {
        match value {
            0 => SecurityScheme::NetwPin,
            1 => SecurityScheme::UserPin,
            2 => SecurityScheme::UserNetwPin,
            3 => SecurityScheme::UserPinMac,
            0xFF => SecurityScheme::None,
            other => SecurityScheme::Unknown(other),
        }
    }

    /// Authenticating this scheme needs a PIN from the user.
    pub fn pin_required(self) -> bool {
        matches!(
            self,
            SecurityScheme::UserPin | SecurityScheme::UserNetwPin | SecurityScheme::UserPinMac
        )
    }

    /// Authenticating this scheme needs the subscriber's IMSI.
    pub fn imsi_required(self) -> bool {
        matches!(self, SecurityScheme::NetwPin | SecurityScheme::UserNetwPin)
    }
}

impl fmt::Display for SecurityScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityScheme::NetwPin => f.write_str("NETWPIN"),
            SecurityScheme::UserPin => f.write_str("USERPIN"),
            SecurityScheme::UserNetwPin => f.write_str("USERNETWPIN"),
            SecurityScheme::UserPinMac => f.write_str("USERPINMAC"),
            SecurityScheme::None => f.write_str("NONE"),
            SecurityScheme::Unknown(value) => write!(f, "UNKNOWN({:#04x})", value),
        }
    }
}

impl Serialize for SecurityScheme {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A parsed WAP push message carrying a provisioning document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WapPush {
    message: Vec<u8>,
    security: SecurityScheme,
    mac: Option<String>,
    body: Range<usize>,
}

impl WapPush {
    /// Parse the envelope of `raw`, keeping a copy of the whole message.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(raw);

        cursor.advance(1, "transaction id")?;
        cursor.expect_u8(PUSH_PDU_TYPE, "push pdu type")?;

        let header_len = cursor.uintvar("header length")?;
        debug!("push header length: {}", header_len);

        let mut security = SecurityScheme::None;
        let mut mac = None;

        // A one byte header is the bare content type.
        let mut value_len = if header_len > 1 {
            content_type_length(&mut cursor)?.saturating_sub(1)
        } else {
            0
        };
        cursor.expect_u8(CONNECTIVITY_CONTENT_TYPE, "content type")?;

        if value_len > 0 && next_field(&cursor)? == SEC_PARAMETER {
            if value_len < 2 {
                return Err(ProvisioningError::corrupt(
                    "security parameter does not fit its content type",
                ));
            }
            cursor.advance(1, "sec parameter")?;
            security = SecurityScheme::from_wire(cursor.u8_named("sec value")?.wrapping_sub(128));
            value_len -= 2;
            debug!("push security scheme: {}", security);
        }

        if value_len > 0 && next_field(&cursor)? == MAC_PARAMETER {
            cursor.advance(1, "mac parameter")?;
            let value = cursor.c_str("mac value")?;
            debug!("push mac: {}", value);
            mac = Some(value.to_owned());
        }

        let body = cursor.pos()..raw.len();
        debug!("push body: {} bytes at offset {}", cursor.remaining(), cursor.pos());

        Ok(WapPush {
            message: raw.to_vec(),
            security,
            mac,
            body,
        })
    }

    pub fn security(&self) -> SecurityScheme {
        self.security
    }

    pub fn mac(&self) -> Option<&str> {
        self.mac.as_deref()
    }

    /// The embedded (usually WBXML encoded) provisioning document.
    pub fn body(&self) -> &[u8] {
        &self.message[self.body.clone()]
    }

    /// The whole message, envelope included.
    pub fn message(&self) -> &[u8] {
        &self.message
    }
}

/// Length of the content type value: either a quoted `uintvar` or a short length.
fn content_type_length(cursor: &mut ByteCursor<'_>) -> Result<u32> {
    let first = cursor.u8_named("content type length")?;
    if first == LENGTH_QUOTE {
        Ok(cursor.uintvar("content type length")?)
    } else {
        Ok(u32::from(first & 0x7F))
    }
}

/// Peek at the next content type parameter, which the value length promised.
fn next_field(cursor: &ByteCursor<'_>) -> Result<u8> {
    cursor.peek_u8().ok_or_else(|| {
        DeserializationError::Truncated {
            what: "content type parameter",
            offset: cursor.pos() as u64,
            need: 1,
            have: 0,
        }
        .into()
    })
}

/// Parse the envelope of a push message.
pub fn parse_envelope(raw: &[u8]) -> Result<WapPush> {
    WapPush::parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_sec_and_mac() {
        let mut raw = vec![0x01, 0x06, 0x0B, 0x1F, 0x0A, 0xB6, 0x91, 0x80, 0x92];
        raw.extend_from_slice(b"AABBCC\0");
        raw.extend_from_slice(b"<body/>");

        let push = parse_envelope(&raw).unwrap();
        assert_eq!(push.security(), SecurityScheme::NetwPin);
        assert_eq!(push.mac(), Some("AABBCC"));
        assert_eq!(push.body(), b"<body/>");
        assert_eq!(push.message(), raw.as_slice());
    }

    #[test]
    fn test_short_header_has_no_security() {
        let raw = [0x01, 0x06, 0x01, 0xB6, 0xAA, 0xBB];
        let push = parse_envelope(&raw).unwrap();
        assert_eq!(push.security(), SecurityScheme::None);
        assert_eq!(push.mac(), None);
        assert_eq!(push.body(), &[0xAA, 0xBB]);

        assert!(parse_envelope(&[0x01, 0x06, 0x01, 0xAA]).unwrap_err().is_corrupt());
    }

    #[test]
    fn test_short_value_length() {
        let raw = [0x01, 0x06, 0x04, 0x83, 0xB6, 0x91, 0x81, 0xCC];
        let push = parse_envelope(&raw).unwrap();
        assert_eq!(push.security(), SecurityScheme::UserPin);
        assert_eq!(push.mac(), None);
        assert_eq!(push.body(), &[0xCC]);
    }

    #[test]
    fn test_sec_parameter_must_fit() {
        let raw = [0x01, 0x06, 0x03, 0x02, 0xB6, 0x91, 0x81];
        assert!(parse_envelope(&raw).unwrap_err().is_corrupt());
    }

    #[test]
    fn test_rejects_wrong_pdu_and_content_type() {
        assert!(parse_envelope(&[0x01, 0x07, 0x00]).unwrap_err().is_corrupt());
        assert!(
            parse_envelope(&[0x01, 0x06, 0x03, 0x02, 0xB5, 0x00])
                .unwrap_err()
                .is_corrupt()
        );
    }

    #[test]
    fn test_truncated_messages_are_corrupt() {
        for raw in [
            &[][..],
            &[0x01][..],
            &[0x01, 0x06][..],
            &[0x01, 0x06, 0x85][..],
            &[0x01, 0x06, 0x05, 0x1F][..],
            &[0x01, 0x06, 0x05, 0x04, 0xB6, 0x91][..],
            &[0x01, 0x06, 0x05, 0x04, 0xB6][..],
        ] {
            assert!(parse_envelope(raw).unwrap_err().is_corrupt(), "{:?}", raw);
        }
    }

    #[test]
    fn test_unterminated_mac_is_corrupt() {
        let raw = [0x01, 0x06, 0x05, 0x04, 0xB6, 0x92, b'A', b'B'];
        assert!(parse_envelope(&raw).unwrap_err().is_corrupt());
    }

    #[test]
    fn test_scheme_names() {
        assert_eq!(SecurityScheme::from_wire(0x03).to_string(), "USERPINMAC");
        assert_eq!(SecurityScheme::from_wire(0xFF).to_string(), "NONE");
        assert_eq!(SecurityScheme::from_wire(0x05).to_string(), "UNKNOWN(0x05)");
        assert!(SecurityScheme::UserNetwPin.pin_required());
        assert!(SecurityScheme::UserNetwPin.imsi_required());
        assert!(!SecurityScheme::NetwPin.pin_required());
        assert!(!SecurityScheme::None.imsi_required());
    }
}
