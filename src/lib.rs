//! An SMS-to-SMS forwarder core: a 3GPP TS 23.040 PDU codec, a synchronous AT modem dialogue
//! layer, and a polling forwarding state machine that dedupes, reassembles, and relays incoming
//! messages while dispatching `++`-prefixed runtime commands sent from the configured
//! destination.
//!
//! The teacher this crate grew out of (`huawei-modem`) wired its AT layer into a `tokio`/`futures`
//! reactor for applications juggling several concurrent callers. A forwarder has exactly one
//! caller driving exactly one modem, so that reactor is gone; `dialogue::Dialogue` talks to a
//! `transport::ModemChannel` with plain blocking calls instead.
#[macro_use] extern crate log;
extern crate env_logger;
extern crate failure;
#[macro_use] extern crate failure_derive;
#[macro_use] extern crate nom;
extern crate encoding;
#[macro_use] extern crate derive_is_enum_variant;
extern crate num;
#[macro_use] extern crate num_derive;
extern crate chrono;

pub use crate::errors::{HuaweiError, HuaweiResult};

macro_rules! check_offset {
    ($b:ident, $offset:ident, $reason:expr) => {
        if $b.get($offset).is_none() {
            return Err(HuaweiError::InvalidPdu(concat!("Offset check failed for: ", $reason)));
        }
    }
}

pub mod error_codes;
pub mod errors;
pub mod gsm_encoding;
pub mod at;
pub mod pdu;
pub mod parse;
pub mod util;
pub mod transport;
pub mod options;
pub mod notify;
pub mod dialogue;
pub mod flow;
