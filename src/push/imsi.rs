use crate::err::{ProvisioningError, Result};

/// Longest IMSI accepted, in digits.
pub const MAX_IMSI_DIGITS: usize = 15;

/// Encode an IMSI the way a SIM stores it (GSM 11.11): a parity nibble, the digits,
/// `F` padding for even lengths, nibbles swapped in every byte.
pub fn encode_imsi(imsi: &str) -> Result<Vec<u8>> {
    if imsi.len() > MAX_IMSI_DIGITS {
        return Err(ProvisioningError::denied("IMSI is longer than 15 digits"));
    }
    if !imsi.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProvisioningError::denied("IMSI contains non-digit characters"));
    }

    let padded = if imsi.len() % 2 == 0 {
        format!("1{}F", imsi)
    } else {
        format!("9{}", imsi)
    };

    let bytes = hex::decode(padded).map_err(|_| ProvisioningError::denied("IMSI is not encodable"))?;
    Ok(bytes.into_iter().map(|b| b.rotate_left(4)).collect())
}
