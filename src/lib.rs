#![deny(unused_must_use)]
#![forbid(unsafe_code)]
// Don't allow dbg! prints in release.
#![cfg_attr(not(debug_assertions), deny(clippy::dbg_macro))]

#[macro_use]
mod macros;

pub mod characteristic;
pub mod context;
pub mod err;
pub mod message;
pub mod push;

mod utils;

pub use characteristic::{
    AppId, Characteristic, CharacteristicType, ParamValue, Parameter, ParameterType,
    parse_document,
};
pub use context::{Analysis, ProvisionedSet, ProvisioningContext, build_model};
pub use err::{ProvisioningError, Result};
pub use message::{MessageSettings, PlainXml, ProvisioningMessage, WbxmlDecoder};
pub use push::{SecurityScheme, WapPush, authenticate, parse_envelope};

// For tests, we only initialize logging once.
#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}
