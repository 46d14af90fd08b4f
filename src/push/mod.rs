//! WAP push envelope of a provisioning message and the authentication of its sender.

mod auth;
mod envelope;
mod imsi;

pub use self::auth::authenticate;
pub use self::envelope::{
    CONNECTIVITY_CONTENT_TYPE, LENGTH_QUOTE, MAC_PARAMETER, PUSH_PDU_TYPE, SEC_PARAMETER,
    SecurityScheme, WapPush, parse_envelope,
};
pub use self::imsi::{MAX_IMSI_DIGITS, encode_imsi};
