//! Error handling.
use std::io;
use crate::pdu::MessageEncoding;
use crate::at;
use failure::Fail;

/// Error `enum` for errors raised by this library.
///
/// Exhaustive matching is NOT guaranteed by the library API (!).
#[derive(Fail, Debug)]
pub enum HuaweiError {
    /// An error from the modem itself (a result code other than `OK`).
    #[fail(display = "Error from modem: {}", _0)]
    AtError(#[cause] at::AtResultCode),
    /// An I/O error talking to the transport (serial port, pipe, socket...).
    #[fail(display = "An I/O error occurred: {}", _0)]
    IoError(#[cause] io::Error),
    /// A write to the transport completed short of the full buffer.
    #[fail(display = "Short write: wrote {} of {} bytes", wrote, expected)]
    ShortWrite { wrote: usize, expected: usize },
    /// No response was read from the modem before the dialogue timeout elapsed.
    #[fail(display = "Timed out waiting for a response from the modem")]
    Timeout,
    /// An error parsing data from the modem.
    #[fail(display = "There was an error parsing data.")]
    ParseError(::nom::ErrorKind),
    /// An indication that an `InformationResponse` of some form from the modem was expected, but
    /// never provided.
    #[fail(display = "Expected a {} response", _0)]
    ExpectedResponse(String),
    /// A type mismatch occured when parsing data from the modem.
    #[fail(display = "Type mismatch when parsing reply")]
    TypeMismatch,
    /// A value provided by the modem was out of range.
    #[fail(display = "Value out of range: {}", _0)]
    ValueOutOfRange(at::AtValue),
    /// An error occured assembling or parsing a PDU.
    #[fail(display = "Invalid PDU: {}", _0)]
    InvalidPdu(&'static str),
    /// A dialogue-layer response was malformed: missing its terminator, or otherwise not a valid
    /// AT response stream. Distinct from `InvalidPdu`, which covers PDU-structure violations
    /// specifically.
    #[fail(display = "Protocol error: {}", _0)]
    ProtocolError(String),
    /// A PDU buffer ran out of bytes before a structure it contained could be fully decoded.
    #[fail(display = "PDU truncated while decoding: {}", _0)]
    DecodeTruncation(&'static str),
    /// Data coding scheme, message type, or character outside what this crate's codec supports.
    #[fail(display = "Data of unknown encoding {:?}: {:?}", _0, _1)]
    UnsupportedEncoding(MessageEncoding, Vec<u8>),
    /// A feature of the protocol that this crate deliberately does not implement.
    #[fail(display = "Unsupported: {}", _0)]
    Unsupported(&'static str),
    /// An unrecoverable condition: the cache capacity was misconfigured, or similar programmer
    /// error that should never be reachable via the public API.
    #[fail(display = "Fatal error: {}", _0)]
    Fatal(&'static str),
    /// This shouldn't be shown, and is designed to stop you matching on this `enum` exhaustively.
    /// If you do that, yo' code gonna break!
    #[fail(display = "[this should never be shown]")]
    #[doc(hidden)]
    __Nonexhaustive
}
impl From<io::Error> for HuaweiError {
    fn from(e: io::Error) -> HuaweiError {
        HuaweiError::IoError(e)
    }
}
impl From<::nom::ErrorKind> for HuaweiError {
    fn from(e: ::nom::ErrorKind) -> HuaweiError {
        HuaweiError::ParseError(e)
    }
}
/// Bog-standard result type alias.
pub type HuaweiResult<T> = Result<T, HuaweiError>;
