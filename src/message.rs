//! End to end processing of a provisioning message.

use log::{debug, info};

use crate::characteristic::{Characteristic, parse_document};
use crate::context::{Analysis, ProvisioningContext};
use crate::err::{ProvisioningError, Result};
use crate::push::{SecurityScheme, WapPush, authenticate, parse_envelope};

/// Turns the WBXML body of a push message into textual markup.
pub trait WbxmlDecoder {
    fn decode(&self, wbxml: &[u8]) -> Result<Vec<u8>>;
}

impl<F> WbxmlDecoder for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>>,
{
    fn decode(&self, wbxml: &[u8]) -> Result<Vec<u8>> {
        self(wbxml)
    }
}

/// Decoder for bodies that already carry textual markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainXml;

impl WbxmlDecoder for PlainXml {
    fn decode(&self, wbxml: &[u8]) -> Result<Vec<u8>> {
        let start = wbxml
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(wbxml.len());

        if wbxml.get(start) != Some(&b'<') {
            return Err(ProvisioningError::Wbxml {
                message: "body is not textual markup".to_owned(),
            });
        }
        Ok(wbxml.to_vec())
    }
}

/// Credentials and switches used when processing a push message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSettings {
    imsi: Option<String>,
    pin: Option<String>,
    verify_mac: bool,
}

impl Default for MessageSettings {
    fn default() -> Self {
        MessageSettings {
            imsi: None,
            pin: None,
            verify_mac: true,
        }
    }
}

impl MessageSettings {
    pub fn new() -> Self {
        MessageSettings::default()
    }

    /// IMSI of the subscriber, as a digit string.
    pub fn imsi(mut self, imsi: impl Into<String>) -> Self {
        self.imsi = Some(imsi.into());
        self
    }

    /// PIN entered by the user.
    pub fn pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = Some(pin.into());
        self
    }

    /// When unset, the sender of the message is not authenticated.
    pub fn verify_mac(mut self, verify_mac: bool) -> Self {
        self.verify_mac = verify_mac;
        self
    }

    pub fn get_imsi(&self) -> Option<&str> {
        self.imsi.as_deref()
    }

    pub fn get_pin(&self) -> Option<&str> {
        self.pin.as_deref()
    }

    pub fn should_verify_mac(&self) -> bool {
        self.verify_mac
    }
}

/// A fully processed provisioning message.
#[derive(Debug, Clone)]
pub struct ProvisioningMessage {
    security: SecurityScheme,
    tree: Characteristic,
    context: ProvisioningContext,
    analysis: Analysis,
}

impl ProvisioningMessage {
    /// Process a raw push message: envelope, authentication, body decoding, document, model.
    pub fn from_push(
        raw: &[u8],
        decoder: &impl WbxmlDecoder,
        settings: &MessageSettings,
    ) -> Result<Self> {
        let envelope: WapPush = parse_envelope(raw)?;

        if settings.should_verify_mac() {
            authenticate(&envelope, settings.get_imsi(), settings.get_pin())?;
        } else {
            info!("skipping authentication of {} message", envelope.security());
        }

        let markup = decoder.decode(envelope.body())?;
        debug!("decoded body into {} bytes of markup", markup.len());

        let mut message = Self::from_document(&markup)?;
        message.security = envelope.security();
        Ok(message)
    }

    /// Process a bare provisioning document.
    pub fn from_document(markup: &[u8]) -> Result<Self> {
        let tree = parse_document(markup)?;
        let context = ProvisioningContext::new(&tree)?;
        let analysis = context.analyse();

        Ok(ProvisioningMessage {
            security: SecurityScheme::None,
            tree,
            context,
            analysis,
        })
    }

    /// Security scheme of the envelope, `None` for bare documents.
    pub fn security(&self) -> SecurityScheme {
        self.security
    }

    pub fn tree(&self) -> &Characteristic {
        &self.tree
    }

    pub fn context(&self) -> &ProvisioningContext {
        &self.context
    }

    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProvisionedSet;
    use pretty_assertions::assert_eq;

    const DOCUMENT: &str = r#"<wap-provisioningdoc version="1.0">
        <characteristic type="NAPDEF">
            <parm name="NAPID" value="n1"/>
            <parm name="NAME" value="Internet"/>
            <parm name="NAP-ADDRESS" value="internet.example"/>
            <parm name="BEARER" value="GSM-GPRS"/>
        </characteristic>
    </wap-provisioningdoc>"#;

    fn wrap(scheme: u8, body: &[u8]) -> Vec<u8> {
        let mut raw = vec![0x01, 0x06, 0x04, 0x03, 0xB6, 0x91, scheme.wrapping_add(128)];
        raw.extend_from_slice(body);
        raw
    }

    #[test]
    fn test_settings_builder() {
        let settings = MessageSettings::new().imsi("1234").pin("0000").verify_mac(false);
        assert_eq!(settings.get_imsi(), Some("1234"));
        assert_eq!(settings.get_pin(), Some("0000"));
        assert!(!settings.should_verify_mac());
        assert!(MessageSettings::default().should_verify_mac());
    }

    #[test]
    fn test_unauthenticated_push() {
        let raw = wrap(0xFF, DOCUMENT.as_bytes());
        let message = ProvisioningMessage::from_push(&raw, &PlainXml, &MessageSettings::new()).unwrap();

        assert_eq!(message.security(), SecurityScheme::None);
        assert_eq!(message.context().napdefs().len(), 1);
        assert_eq!(
            message.analysis().provisioned,
            ProvisionedSet::CONNECTION_PROFILE
        );
    }

    #[test]
    fn test_authentication_can_be_skipped() {
        let raw = wrap(0x01, DOCUMENT.as_bytes());

        let err = ProvisioningMessage::from_push(&raw, &PlainXml, &MessageSettings::new())
            .unwrap_err();
        assert!(err.is_denied());

        let settings = MessageSettings::new().verify_mac(false);
        let message = ProvisioningMessage::from_push(&raw, &PlainXml, &settings).unwrap();
        assert_eq!(message.security(), SecurityScheme::UserPin);
    }

    #[test]
    fn test_closure_decoder() {
        let raw = wrap(0xFF, &[0x03, 0x0B, 0x6A]);
        let decoder = |_: &[u8]| -> Result<Vec<u8>> { Ok(DOCUMENT.as_bytes().to_vec()) };

        let message = ProvisioningMessage::from_push(&raw, &decoder, &MessageSettings::new()).unwrap();
        assert_eq!(message.tree().children().len(), 1);
    }

    #[test]
    fn test_plain_decoder_rejects_binary() {
        let raw = wrap(0xFF, &[0x03, 0x0B, 0x6A]);
        let err = ProvisioningMessage::from_push(&raw, &PlainXml, &MessageSettings::new())
            .unwrap_err();
        assert!(matches!(err, ProvisioningError::Wbxml { .. }));
    }
}
