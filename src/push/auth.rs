use hmac::{Hmac, Mac};
use log::{debug, info, warn};
use sha1::Sha1;

use super::envelope::{SecurityScheme, WapPush};
use super::imsi::encode_imsi;
use crate::err::{ProvisioningError, Result};

type HmacSha1 = Hmac<Sha1>;

/// Check that `envelope` was produced by someone knowing the secret its scheme asks for.
///
/// The MAC always covers the body of the message, never the envelope.
pub fn authenticate(envelope: &WapPush, imsi: Option<&str>, pin: Option<&str>) -> Result<()> {
    let security = envelope.security();
    let outcome = verify(envelope, imsi, pin);

    match &outcome {
        Ok(()) => info!("push message accepted ({})", security),
        Err(e) => warn!("push message rejected ({}): {}", security, e),
    }

    outcome
}

fn verify(envelope: &WapPush, imsi: Option<&str>, pin: Option<&str>) -> Result<()> {
    match envelope.security() {
        SecurityScheme::None => Ok(()),
        SecurityScheme::NetwPin => {
            let imsi = required(imsi, "IMSI required by NETWPIN")?;
            compare_mac(envelope, &encode_imsi(imsi)?)
        }
        SecurityScheme::UserPin => {
            let pin = required(pin, "PIN required by USERPIN")?;
            compare_mac(envelope, pin.as_bytes())
        }
        SecurityScheme::UserNetwPin => {
            let imsi = required(imsi, "IMSI required by USERNETWPIN")?;
            let pin = required(pin, "PIN required by USERNETWPIN")?;

            let mut key = encode_imsi(imsi)?;
            key.extend_from_slice(pin.as_bytes());
            compare_mac(envelope, &key)
        }
        SecurityScheme::UserPinMac => check_pin_mac(envelope, pin),
        SecurityScheme::Unknown(_) => Err(ProvisioningError::denied("unknown security scheme")),
    }
}

fn required<'a>(value: Option<&'a str>, reason: &'static str) -> Result<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ProvisioningError::denied(reason))
}

fn hmac_sha1(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha1::new_from_slice(key)
        .map_err(|_| ProvisioningError::denied("key rejected by HMAC-SHA1"))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Compare the hex encoded digest of the body with the MAC sent in the envelope.
fn compare_mac(envelope: &WapPush, key: &[u8]) -> Result<()> {
    let expected = envelope
        .mac()
        .ok_or(ProvisioningError::denied("message carries no MAC"))?;

    let computed = hex::encode_upper(hmac_sha1(key, envelope.body())?);
    debug!("computed MAC {}, received MAC {}", computed, expected);

    if computed != expected {
        return Err(ProvisioningError::denied("MAC mismatch"));
    }
    Ok(())
}

/// The first half of the PIN is the key, the second half holds one decimal digit per
/// digest byte.
fn check_pin_mac(envelope: &WapPush, pin: Option<&str>) -> Result<()> {
    let pin = pin
        .ok_or(ProvisioningError::denied("PIN required by USERPINMAC"))?
        .as_bytes();

    if pin.len() % 2 != 0 || pin.len() < 10 {
        return Err(ProvisioningError::denied(
            "USERPINMAC needs a PIN of even length of at least 10",
        ));
    }

    let (key, check) = pin.split_at(pin.len() / 2);
    let digest = hmac_sha1(key, envelope.body())?;
    if digest.len() < key.len() {
        return Err(ProvisioningError::denied("USERPINMAC PIN is longer than the digest"));
    }

    if check
        .iter()
        .zip(&digest)
        .any(|(&digit, &byte)| digit != b'0' + byte % 10)
    {
        return Err(ProvisioningError::denied("PIN does not match the message"));
    }
    Ok(())
}
