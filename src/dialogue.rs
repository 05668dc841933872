//! The AT dialogue layer: synchronous request/response over a `ModemChannel`.
//!
//! The teacher's `future`/`codec` modules implement this as an async `tokio`-`Framed` reactor
//! (a request queue, a URC channel, oneshot replies) because the library as published targets
//! applications that want non-blocking modem access from several places at once. The forwarder
//! core has exactly one caller talking to exactly one modem in lock-step, so that whole reactor
//! collapses into a plain blocking call: write a framed command, read a response buffer, parse it.
//! There is no URC channel because there is nobody to hand an unsolicited response to; anything
//! outside the issued command's `expected()` set is logged at `trace` and dropped.
use std::time::{Duration, Instant};

use crate::at::{AtCommand, AtResponse, AtResponsePacket, AtResultCode, AtValue};
use crate::errors::{HuaweiError, HuaweiResult};
use crate::error_codes::CmsError;
use crate::parse;
use crate::pdu::{self, DeliverPdu, OutgoingPduPart};
use crate::transport::ModemChannel;
use crate::util;
use num::FromPrimitive;

/// Size of the buffer a single command/response exchange is gathered into, matching the
/// original's fixed 4 KiB read buffer.
const RESPONSE_BUF_SIZE: usize = 4096;
/// Default per-exchange dialogue timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns a `ModemChannel` and drives request/response AT exchanges over it.
pub struct Dialogue<C> {
    channel: C,
    timeout: Duration,
}
impl<C: ModemChannel> Dialogue<C> {
    pub fn new(channel: C) -> Self {
        Dialogue { channel, timeout: DEFAULT_TIMEOUT }
    }
    pub fn with_timeout(channel: C, timeout: Duration) -> Self {
        Dialogue { channel, timeout }
    }
    pub fn into_inner(self) -> C {
        self.channel
    }

    /// Read one command's response into a bounded buffer: keep pulling from the channel until
    /// either the buffer fills or a line-terminated terminal token (`OK`, `ERROR`, `+CMS ERROR`,
    /// `+CME ERROR`) appears, or the overall timeout elapses.
    fn read_response_buffer(&mut self) -> HuaweiResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(RESPONSE_BUF_SIZE);
        let mut chunk = [0u8; 256];
        let deadline = Instant::now() + self.timeout;
        loop {
            if buf.len() >= RESPONSE_BUF_SIZE {
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let slice = (deadline - now).min(Duration::from_millis(200));
            let n = self.channel.read_with_timeout(&mut chunk, slice)?;
            if n == 0 {
                if has_terminal_line(&buf) {
                    break;
                }
                continue;
            }
            let room = RESPONSE_BUF_SIZE - buf.len();
            buf.extend_from_slice(&chunk[..n.min(room)]);
            if has_terminal_line(&buf) {
                break;
            }
        }
        Ok(buf)
    }

    /// Write `cmd` framed as `\r\n<command>\r\n`, gather the response, and parse it into an
    /// `AtResponsePacket`, filtering `InformationResponse`s down to `cmd.expected()` exactly as
    /// the teacher's reactor loop separated request replies from URCs.
    fn send(&mut self, cmd: AtCommand) -> HuaweiResult<AtResponsePacket> {
        let framed = format!("\r\n{}\r\n", cmd);
        self.channel.write_all(framed.as_bytes())?;
        let buf = self.read_response_buffer()?;
        let lines = parse_responses(&buf)?;
        let expected = cmd.expected();
        let mut responses = vec![];
        let mut status = None;
        for resp in lines {
            match resp {
                AtResponse::InformationResponse { param, response } => {
                    if expected.contains(&param) {
                        responses.push(AtResponse::InformationResponse { param, response });
                    } else {
                        trace!("dropping unsolicited response +{}: {:?}", param, response);
                    }
                }
                AtResponse::ResultCode(code) => status = Some(code),
                other => responses.push(other),
            }
        }
        let status = status.ok_or(HuaweiError::ExpectedResponse("a terminal result code".into()))?;
        Ok(AtResponsePacket { responses, status })
    }

    /// `AT` — verify the modem is alive.
    pub fn ping(&mut self) -> HuaweiResult<()> {
        self.send(AtCommand::Basic { command: "".into(), number: None })?.assert_ok()
    }
    /// `ATE0` / `ATE1` — echo off/on.
    pub fn set_echo(&mut self, on: bool) -> HuaweiResult<()> {
        self.send(AtCommand::Basic { command: "E".into(), number: Some(if on { 1 } else { 0 }) })?.assert_ok()
    }
    /// `AT+CMGF=0` — PDU mode.
    pub fn set_pdu_mode(&mut self) -> HuaweiResult<()> {
        self.send(AtCommand::Equals { param: "+CMGF".into(), value: AtValue::Integer(0) })?.assert_ok()
    }
    /// `AT+CSCS="UCS2"` — UCS-2 character set, used for reading/writing contact names.
    pub fn set_charset_ucs2(&mut self) -> HuaweiResult<()> {
        self.send(AtCommand::Equals { param: "+CSCS".into(), value: AtValue::String("UCS2".into()) })?.assert_ok()
    }
    /// `AT+COPS?` — the operator name, quoted in the third comma-separated field
    /// (`+COPS: <mode>,<format>,"<name>"`).
    pub fn operator_info(&mut self) -> HuaweiResult<String> {
        let pkt = self.send(AtCommand::Read { param: "+COPS".into() })?;
        let arr = pkt.extract_named_response("+COPS")?.get_array()?;
        let name = arr.get(2).ok_or(HuaweiError::TypeMismatch)?.get_string()?;
        Ok(name.clone())
    }
    /// `AT+CPMS?` — message count, the second comma-separated field
    /// (`+CPMS: "SM",<count>,<total>,...`).
    pub fn message_count(&mut self) -> HuaweiResult<u32> {
        let pkt = self.send(AtCommand::Read { param: "+CPMS".into() })?;
        let arr = pkt.extract_named_response("+CPMS")?.get_array()?;
        let count = arr.get(1).ok_or(HuaweiError::TypeMismatch)?.get_integer()?;
        Ok(*count)
    }
    /// `AT+CMGR=<index>` — read and decode one message, 1-based (see SPEC_FULL.md's resolution
    /// of the original's 0-based/1-based ambiguity).
    pub fn read_message(&mut self, index: u32) -> HuaweiResult<DeliverPdu> {
        let pkt = self.send(AtCommand::Equals { param: "+CMGR".into(), value: AtValue::Integer(index) })?;
        pkt.assert_ok()?;
        for resp in &pkt.responses {
            if let AtResponse::Unknown(hex) = resp {
                let hex = hex.trim();
                if !hex.is_empty() {
                    return pdu::decode_pdu(hex);
                }
            }
        }
        Err(HuaweiError::ExpectedResponse("a +CMGR PDU body line".into()))
    }
    /// `AT+CMGL=4` — list and decode every stored message, returning `(index, message)` pairs.
    pub fn list_messages(&mut self) -> HuaweiResult<Vec<(u32, DeliverPdu)>> {
        let pkt = self.send(AtCommand::Equals { param: "+CMGL".into(), value: AtValue::Integer(4) })?;
        pkt.assert_ok()?;
        let mut ret = vec![];
        let mut cur_index = None;
        for resp in &pkt.responses {
            match resp {
                AtResponse::InformationResponse { param, response } if param == "+CMGL" => {
                    let arr = response.get_array()?;
                    let idx = arr.get(0).ok_or(HuaweiError::TypeMismatch)?.get_integer()?;
                    cur_index = Some(*idx);
                }
                AtResponse::Unknown(hex) => {
                    let hex = hex.trim();
                    if !hex.is_empty() {
                        let idx = cur_index.take().ok_or(HuaweiError::TypeMismatch)?;
                        ret.push((idx, pdu::decode_pdu(hex)?));
                    }
                }
                _ => {}
            }
        }
        Ok(ret)
    }
    /// `AT+CMGD=<index>` — delete one message.
    pub fn delete_message(&mut self, index: u32) -> HuaweiResult<()> {
        self.send(AtCommand::Equals { param: "+CMGD".into(), value: AtValue::Integer(index) })?.assert_ok()
    }
    /// `AT+CMGD=1,4` — delete every message on the SIM.
    pub fn delete_all_messages(&mut self) -> HuaweiResult<()> {
        self.send(AtCommand::Equals {
            param: "+CMGD".into(),
            value: AtValue::Array(vec![AtValue::Integer(1), AtValue::Integer(4)]),
        })?.assert_ok()
    }
    /// `AT+CMGS=<len>`; body; `\x1A` — submit one PDU part. Per spec, the `>` prompt is not
    /// waited for: the PDU hex and the SUB byte are written immediately, and only the final
    /// response is scanned for an error token. This tolerates modems that emit the prompt at
    /// varying timing (or not at all, when text is queued faster than the UART can echo it).
    pub fn send_pdu(&mut self, part: &OutgoingPduPart) -> HuaweiResult<()> {
        let header = format!("\r\nAT+CMGS={}\r\n", part.tpdu_len);
        self.channel.write_all(header.as_bytes())?;
        let mut body = part.hex.clone().into_bytes();
        body.push(0x1A);
        self.channel.write_all(&body)?;
        let buf = self.read_response_buffer()?;
        let text = String::from_utf8_lossy(&buf);
        let mut pos = 0;
        while let Some((line, next)) = util::read_line(&text, pos) {
            let line = line.trim();
            if line.starts_with("+CMS ERROR") {
                return Err(parse_cms_error_line(line));
            }
            if line == "ERROR" {
                return Err(HuaweiError::AtError(AtResultCode::Error));
            }
            pos = next;
        }
        Ok(())
    }
    /// `AT+CPBR=<index>` — read one SIM phonebook entry, returning `(phone, name)`. Grounded on
    /// `ata_read_contact`'s raw-line `copy_quoted` extraction rather than the typed `AtValue`
    /// array grammar, since some modems report the phonebook type field in a shape the generic
    /// grammar doesn't bother modelling.
    pub fn read_contact(&mut self, index: u32) -> HuaweiResult<(String, String)> {
        let cmd = format!("\r\nAT+CPBR={}\r\n", index);
        self.channel.write_all(cmd.as_bytes())?;
        let buf = self.read_response_buffer()?;
        let text = String::from_utf8_lossy(&buf);
        let mut pos = 0;
        while let Some((line, next)) = util::read_line(&text, pos) {
            let trimmed = line.trim();
            if trimmed.starts_with("+CPBR:") {
                let (phone, consumed) = util::copy_quoted(trimmed)
                    .ok_or(HuaweiError::ExpectedResponse("+CPBR phone field".into()))?;
                let (name, _) = util::copy_quoted(&trimmed[consumed..])
                    .ok_or(HuaweiError::ExpectedResponse("+CPBR name field".into()))?;
                return Ok((phone, name));
            }
            pos = next;
        }
        Err(HuaweiError::ExpectedResponse("a +CPBR line".into()))
    }
}

/// Scan for a standalone terminal-result-code line at the end of what's been read so far: `OK`,
/// `ERROR`, or a `+CMS ERROR`/`+CME ERROR` line. Anything short of that means the modem hasn't
/// finished responding yet.
fn has_terminal_line(buf: &[u8]) -> bool {
    let text = String::from_utf8_lossy(buf);
    let mut pos = 0;
    while let Some((line, next)) = util::read_line(&text, pos) {
        let line = line.trim();
        if line == "OK" || line == "ERROR" || line.starts_with("+CMS ERROR") || line.starts_with("+CME ERROR") {
            return true;
        }
        pos = next;
    }
    false
}

fn parse_responses(buf: &[u8]) -> HuaweiResult<Vec<AtResponse>> {
    use nom::IResult;
    match parse::responses(buf) {
        IResult::Done(_, data) => Ok(data),
        IResult::Error(_) => Err(HuaweiError::ProtocolError("malformed AT response".into())),
        IResult::Incomplete(_) => Err(HuaweiError::ProtocolError("truncated AT response".into())),
    }
}

fn parse_cms_error_line(line: &str) -> HuaweiError {
    let code = line.trim_start_matches("+CMS ERROR:").trim();
    match code.parse::<u32>() {
        Ok(n) => match CmsError::from_u32(n) {
            Some(e) => HuaweiError::AtError(AtResultCode::CmsError(e)),
            None => HuaweiError::AtError(AtResultCode::CmsErrorUnknown(n)),
        },
        Err(_) => HuaweiError::AtError(AtResultCode::CmsErrorString(code.to_string())),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transport::fake::FakeChannel;

    fn dialogue(chan: FakeChannel) -> Dialogue<FakeChannel> {
        Dialogue::with_timeout(chan, Duration::from_millis(50))
    }

    #[test]
    fn ping_succeeds_on_ok() {
        let mut chan = FakeChannel::new();
        chan.push_response("\r\nOK\r\n");
        let mut d = dialogue(chan);
        d.ping().unwrap();
        assert!(d.into_inner().written_str().contains("AT"));
    }

    #[test]
    fn message_count_extracts_second_field() {
        let mut chan = FakeChannel::new();
        chan.push_response("\r\n+CPMS: \"SM\",3,10,\"SM\",3,10,\"SM\",3,10\r\nOK\r\n");
        let mut d = dialogue(chan);
        assert_eq!(d.message_count().unwrap(), 3);
    }

    #[test]
    fn operator_info_extracts_quoted_name() {
        let mut chan = FakeChannel::new();
        chan.push_response("\r\n+COPS: 0,0,\"Bee Line GSM\"\r\nOK\r\n");
        let mut d = dialogue(chan);
        assert_eq!(d.operator_info().unwrap(), "Bee Line GSM");
    }

    #[test]
    fn read_contact_extracts_phone_then_name() {
        let mut chan = FakeChannel::new();
        chan.push_response("\r\n+CPBR: 1,\"79219800469\",145,\"PRIMARY NUMBER\"\r\nOK\r\n");
        let mut d = dialogue(chan);
        let (phone, name) = d.read_contact(1).unwrap();
        assert_eq!(phone, "79219800469");
        assert_eq!(name, "PRIMARY NUMBER");
    }

    #[test]
    fn send_pdu_surfaces_cms_error() {
        let mut chan = FakeChannel::new();
        chan.push_response("\r\n+CMS ERROR: 38\r\n");
        let mut d = dialogue(chan);
        let part = crate::pdu::create_pdu_multipart("79219800469", "hi").unwrap();
        let err = d.send_pdu(&part[0]).unwrap_err();
        match err {
            HuaweiError::AtError(AtResultCode::CmsError(_)) => {}
            other => panic!("expected a CMS error, got {:?}", other),
        }
    }

    #[test]
    fn send_pdu_ignores_prompt_before_error_check() {
        let mut chan = FakeChannel::new();
        chan.push_response("\r\n>\r\nOK\r\n");
        let mut d = dialogue(chan);
        let part = crate::pdu::create_pdu_multipart("79219800469", "hi").unwrap();
        d.send_pdu(&part[0]).unwrap();
    }
}
