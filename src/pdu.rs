//! The PDU codec: bit-exact encode/decode of 3GPP TS 23.040 SMS-SUBMIT and SMS-DELIVER PDUs.
//!
//! All routines here are pure: they operate on caller-provided buffers and return owned data, with
//! no global state.
use std::convert::TryFrom;
use std::fmt;

use crate::errors::*;
use crate::gsm_encoding::{self, udh::UserDataHeader};
use crate::util::{crc16, hex_to_bin, bin_to_hex};

/// Hard ceiling on a PDU's total hex-ASCII length (255 octets, the largest length a single
/// `AT+CMGS=<len>` octet-count field can declare).
pub const MAX_PDU_HEX_LEN: usize = 2 * 255;
/// Hard payload ceiling used by the single-part encoder and by the multipart splitter to decide
/// whether a message needs to be split at all.
pub const MSG_TEXT_LIMIT: usize = 140;
/// Per-part payload ceiling once a message has to be split (`MSG_TEXT_LIMIT` minus the 6 octets a
/// concatenated-SMS UDH costs).
pub const MULTIPART_TEXT_LIMIT: usize = MSG_TEXT_LIMIT - 6;
/// Upper bound on GSM-7 septets in a single, non-concatenated PDU.
pub const MAX_GSM7_SEPTETS: usize = 160;
/// Maximum number of digits this codec will semi-octet-encode into a destination address.
pub const MAX_DEST_DIGITS: usize = 12;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TypeOfNumber {
    Unknown = 0b0_000_0000,
    International = 0b0_001_0000,
    National = 0b0_010_0000,
    Special = 0b0_011_0000,
    Gsm = 0b0_101_0000,
    Short = 0b0_110_0000,
    Reserved = 0b0_111_0000
}
impl TypeOfNumber {
    fn from_toa(toa: u8) -> TypeOfNumber {
        match (toa & 0b0_111_0000) >> 4 {
            0b001 => TypeOfNumber::International,
            0b010 => TypeOfNumber::National,
            0b011 => TypeOfNumber::Special,
            0b101 => TypeOfNumber::Gsm,
            0b110 => TypeOfNumber::Short,
            0b111 => TypeOfNumber::Reserved,
            _ => TypeOfNumber::Unknown
        }
    }
}
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum NumberingPlanIdentification {
    NetworkDetermined = 0b0_000_0000,
    IsdnTelephone = 0b0_000_0001,
    Data = 0b0_000_0011,
    Telex = 0b0_000_0100,
    National = 0b0_000_1000,
    Private = 0b0_000_1001,
    Ermes = 0b0_000_1010
}
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AddressType {
    pub type_of_number: TypeOfNumber,
    pub numbering_plan_identification: NumberingPlanIdentification
}
impl Default for AddressType {
    fn default() -> Self {
        AddressType {
            type_of_number: TypeOfNumber::International,
            numbering_plan_identification: NumberingPlanIdentification::NetworkDetermined
        }
    }
}
impl From<AddressType> for u8 {
    fn from(a: AddressType) -> u8 {
        0b1_000_0000 | (a.type_of_number as u8) | (a.numbering_plan_identification as u8)
    }
}

/// A phone number as a sequence of decimal digits (0-9), ready for semi-octet encoding.
pub struct PhoneNumber(Vec<u8>);
impl PhoneNumber {
    pub fn digit_count(&self) -> usize {
        self.0.len()
    }
    /// Semi-octet encode: digits are paired, nibble-swapped, and packed into bytes. An odd number
    /// of digits pads the final nibble with `F`.
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut ret = vec![];
        let mut cur = 0b0000_0000;
        for (i, b) in self.0.iter().enumerate() {
            let mut b = *b;
            if i % 2 == 0 {
                cur |= b;
            }
            else {
                b = b << 4;
                cur |= b;
                ret.push(cur);
                cur = 0b0000_0000;
            }
        }
        if self.0.len() % 2 != 0 {
            cur |= 0b1111_0000;
            ret.push(cur);
        }
        ret
    }
    /// Reverse semi-octet decoding: unswap each byte's nibbles into two digits, dropping a
    /// trailing `F` pad nibble. `digit_count` bounds how many digits to keep (the PDU's declared
    /// address length may be odd, in which case `bytes` carries one more nibble than is wanted).
    pub fn from_semi_octets(bytes: &[u8], digit_count: usize) -> PhoneNumber {
        let mut digits = Vec::with_capacity(digit_count);
        for b in bytes {
            digits.push(b & 0x0F);
            digits.push((b >> 4) & 0x0F);
        }
        digits.truncate(digit_count);
        PhoneNumber(digits)
    }
    pub fn from_digit_string(s: &str) -> HuaweiResult<PhoneNumber> {
        let mut digits = Vec::with_capacity(s.len());
        for c in s.chars() {
            match c.to_digit(10) {
                Some(d) => digits.push(d as u8),
                None => return Err(HuaweiError::InvalidPdu("destination address contains a non-digit character"))
            }
        }
        Ok(PhoneNumber(digits))
    }
    pub fn to_digit_string(&self) -> String {
        self.0.iter().map(|d| (b'0' + d) as char).collect()
    }
}
pub struct PduAddress {
    pub type_addr: AddressType,
    pub number: PhoneNumber,
}
impl PduAddress {
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut ret = vec![];
        ret.push(self.type_addr.into());
        ret.extend(self.number.as_bytes());
        ret.insert(0, self.number.digit_count() as u8);
        ret
    }
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageType {
    SmsDeliver = 0b000000_00,
    SmsCommand = 0b000000_10,
    SmsSubmit = 0b000000_01,
    Reserved = 0b000000_11
}
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum VpFieldValidity {
    Invalid = 0b0000_00_00,
    Relative = 0b0000_10_00,
    Enhanced = 0b0000_01_00,
    Absolute = 0b0000_11_00,
}
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PduFirstOctet {
    pub mti: MessageType,
    pub rd: bool,
    pub vpf: VpFieldValidity,
    pub srr: bool,
    pub udhi: bool,
    pub rp: bool
}
impl PduFirstOctet {
    pub fn as_u8(self) -> u8 {
        let mut ret = 0b0000_0000;
        ret |= self.mti as u8;
        ret |= self.vpf as u8;
        if self.rd { ret |= 0b00000100; }
        if self.srr { ret |= 0b00100000; }
        if self.udhi { ret |= 0b01000000; }
        if self.rp { ret |= 0b10000000; }
        ret
    }
}
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageClass {
    Silent = 0b000000_00,
    StoreToNv = 0b000000_01,
    StoreToSim = 0b000000_10,
    StoreToTe = 0b000000_11
}
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageEncoding {
    Gsm7Bit = 0b0000_00_00,
    EightBit = 0b0000_01_00,
    Ucs2 = 0b0000_10_00,
    Reserved = 0b0000_11_00,
}
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SimplisticDataCodingScheme {
    pub class: MessageClass,
    pub encoding: MessageEncoding
}
impl SimplisticDataCodingScheme {
    pub fn as_u8(self) -> u8 {
        let mut ret = 0b0001_0000;
        ret |= self.class as u8;
        ret |= self.encoding as u8;
        ret
    }
    /// Interpret a raw DCS octet per spec: 0-3 GSM-7, 8-11 UCS-2, 4-7 unsupported (8-bit data).
    fn encoding_from_raw(dcs: u8) -> HuaweiResult<MessageEncoding> {
        match dcs {
            0..=3 => Ok(MessageEncoding::Gsm7Bit),
            4..=7 => Err(HuaweiError::Unsupported("8-bit data coding scheme")),
            8..=11 => Ok(MessageEncoding::Ucs2),
            _ => Err(HuaweiError::Unsupported("reserved data coding scheme"))
        }
    }
}

/// An outgoing (encode-side) PDU: the fixed SMS-SUBMIT header, destination, and body.
pub struct Pdu {
    pub first_octet: PduFirstOctet,
    pub message_id: u8,
    pub destination: PduAddress,
    pub dcs: SimplisticDataCodingScheme,
    pub user_data: Vec<u8>,
    pub user_data_len: u8,
}
impl Pdu {
    /// Serialize to `(tpdu_bytes, declared_tpdu_octet_length)`; the SCA-address octet (`00`, "use
    /// the SIM's default SMSC") is prepended since this crate never overrides the SMSC.
    pub fn as_bytes(&self) -> (Vec<u8>, usize) {
        let mut ret = vec![0u8]; // SCA length 0: use the modem's configured SMSC.
        let tpdu_start = ret.len();
        ret.push(self.first_octet.as_u8());
        ret.push(self.message_id);
        ret.extend(self.destination.as_bytes());
        ret.push(0); // protocol identifier
        ret.push(self.dcs.as_u8());
        if self.first_octet.vpf != VpFieldValidity::Invalid {
            ret.push(0);
        }
        ret.push(self.user_data_len);
        ret.extend(self.user_data.iter().cloned());
        let tpdu_len = ret.len() - tpdu_start;
        (ret, tpdu_len)
    }
}

/// Hex-ASCII view of a byte buffer, used both for PDU wire text and for AT+CMGS bodies.
pub struct HexData<'a>(pub &'a [u8]);
impl<'a> fmt::Display for HexData<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", bin_to_hex(self.0))
    }
}
impl HexData<'static> {
    pub fn decode(hex: &str) -> HuaweiResult<Vec<u8>> {
        let bytes = hex_to_bin(hex);
        if bytes.len() * 2 != hex.trim().len() {
            return Err(HuaweiError::InvalidPdu("hex string has an odd or non-hex-digit length"));
        }
        Ok(bytes)
    }
}

/// A fully decoded SMS-DELIVER PDU, as produced by `decode_pdu`.
#[derive(Debug, Clone)]
pub struct DeliverPdu {
    /// Sender address, formatted per TON: `+`-prefixed international, bare national/unknown
    /// digits, or a GSM-7-decoded alphanumeric name.
    pub sender: String,
    /// Canonical `YYYY-MM-DDTHH:MM:SSZ±H` timestamp (timezone in whole hours, rounded down).
    pub timestamp: String,
    /// Decoded message body.
    pub text: String,
    /// Concatenated-SMS reference, if a UDH declared one.
    pub concat_ref: Option<u16>,
    /// Concatenated-SMS total part count, if a UDH declared one.
    pub concat_parts: Option<u8>,
    /// Concatenated-SMS 1-based sequence number within the series, if a UDH declared one.
    pub concat_seq: Option<u8>,
    /// CRC-16/CCITT of the PDU's hex text; used by the forwarding state machine as a
    /// content-addressing fingerprint, not as a security hash.
    pub hash_id: u16,
}

fn decode_timestamp(b: &[u8; 7]) -> String {
    fn swap(byte: u8) -> u8 {
        let lo = byte & 0x0F;
        let hi = (byte >> 4) & 0x0F;
        lo * 10 + hi
    }
    let year = 2000 + swap(b[0]) as u32;
    let year = if year < 2000 { year + 100 } else { year }; // "20YY until 2100"
    let month = swap(b[1]);
    let day = swap(b[2]);
    let hour = swap(b[3]);
    let minute = swap(b[4]);
    let second = swap(b[5]);
    let tz_raw = b[6];
    let swapped_tz = ((tz_raw & 0x0F) << 4) | ((tz_raw >> 4) & 0x0F);
    let sign_negative = (swapped_tz & 0b0000_1000) != 0;
    let quarters = (((tz_raw & 0x0F) * 10) + ((tz_raw >> 4) & 0x07)) as u32;
    let tz_hours = quarters / 4;
    let sign = if sign_negative { "-" } else { "+" };
    format!("{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z{}{}", year, month, day, hour, minute, second, sign, tz_hours)
}

impl<'a> TryFrom<&'a [u8]> for DeliverPdu {
    type Error = HuaweiError;

    fn try_from(b: &'a [u8]) -> HuaweiResult<DeliverPdu> {
        let mut offset = 0;
        check_offset!(b, offset, "SCA length");
        let sca_len = b[offset] as usize;
        offset += 1 + sca_len;
        check_offset!(b, offset, "first octet");
        let first_octet = b[offset];
        let udhi = first_octet & 0b0100_0000 != 0;
        offset += 1;

        check_offset!(b, offset, "sender address length");
        let addr_len_digits = b[offset] as usize;
        offset += 1;
        check_offset!(b, offset, "sender TOA");
        let toa = b[offset];
        offset += 1;
        let addr_len_bytes = (addr_len_digits + 1) / 2;
        let end = offset + addr_len_bytes;
        let o = end.saturating_sub(1);
        check_offset!(b, o, "sender address digits");
        let addr_bytes = &b[offset..end];
        offset = end;

        let ton = TypeOfNumber::from_toa(toa);
        let sender = match ton {
            TypeOfNumber::International => {
                format!("+{}", PhoneNumber::from_semi_octets(addr_bytes, addr_len_digits).to_digit_string())
            },
            TypeOfNumber::Gsm => {
                let septets = (addr_len_digits * 4) / 7;
                let unpacked = gsm_encoding::decode_sms_7bit(addr_bytes, 0, septets);
                gsm_encoding::gsm_decode_string(&unpacked)
            },
            TypeOfNumber::National => {
                PhoneNumber::from_semi_octets(addr_bytes, addr_len_digits).to_digit_string()
            },
            _ => "Unknown".to_string()
        };

        check_offset!(b, offset, "protocol identifier");
        offset += 1; // protocol identifier, unused
        check_offset!(b, offset, "data coding scheme");
        let dcs = b[offset];
        offset += 1;
        let encoding = SimplisticDataCodingScheme::encoding_from_raw(dcs)?;

        let ts_end = offset + 7;
        let o = ts_end.saturating_sub(1);
        check_offset!(b, o, "timestamp");
        let mut ts_bytes = [0u8; 7];
        ts_bytes.copy_from_slice(&b[offset..ts_end]);
        let timestamp = decode_timestamp(&ts_bytes);
        offset = ts_end;

        check_offset!(b, offset, "user data length");
        let mut data_len = b[offset] as usize;
        offset += 1;

        let mut concat_ref = None;
        let mut concat_parts = None;
        let mut concat_seq = None;
        let mut padding = 0usize;
        if udhi {
            check_offset!(b, offset, "UDH length");
            let udhl = b[offset] as usize;
            let udh_end = offset + 1 + udhl;
            let o = udh_end.saturating_sub(1);
            check_offset!(b, o, "UDH data");
            let udh = UserDataHeader::try_from(&b[offset + 1..udh_end])?;
            if let Some(c) = udh.get_concatenated_sms_data() {
                concat_ref = Some(c.reference);
                concat_parts = Some(c.parts);
                concat_seq = Some(c.sequence);
            }
            data_len = data_len.saturating_sub(udhl + 1);
            if encoding == MessageEncoding::Gsm7Bit {
                padding = 7 - (((udhl + 1) * 8) % 7);
                if padding == 7 { padding = 0; }
            }
            offset = udh_end;
        }

        let text = if offset >= b.len() {
            String::new()
        }
        else {
            match encoding {
                MessageEncoding::Gsm7Bit => {
                    let septets = gsm_encoding::decode_sms_7bit(&b[offset..], padding, data_len);
                    gsm_encoding::gsm_decode_string(&septets)
                },
                MessageEncoding::Ucs2 => gsm_encoding::ucs2_decode(&b[offset..]),
                _ => return Err(HuaweiError::UnsupportedEncoding(encoding, b[offset..].to_vec()))
            }
        };

        Ok(DeliverPdu {
            sender,
            timestamp,
            text,
            concat_ref,
            concat_parts,
            concat_seq,
            hash_id: 0, // filled in by decode_pdu, which has the original hex text
        })
    }
}

/// Decode a UCS-2-hex-encoded SIM contact name (as `AT+CPBR` reports it once `AT+CSCS="UCS2"` is
/// active) to UTF-8. Non-hex or odd-length input decodes to an empty string rather than erroring,
/// since a contact whose name isn't UCS-2 at all (an ASCII name left over from a GSM-charset
/// write, say) should not abort the `++CONTACTS` dump.
pub fn decode_contact(hex: &str) -> String {
    let bytes = hex_to_bin(hex);
    if bytes.is_empty() || bytes.len() % 2 != 0 {
        return String::new();
    }
    gsm_encoding::ucs2_decode(&bytes)
}

/// Decode a hex-ASCII SMS-DELIVER PDU.
pub fn decode_pdu(hex: &str) -> HuaweiResult<DeliverPdu> {
    let bytes = HexData::decode(hex)?;
    let mut pdu = DeliverPdu::try_from(&bytes as &[u8])?;
    pdu.hash_id = crc16(hex.trim().as_bytes());
    Ok(pdu)
}

fn build_destination(dest: &str) -> HuaweiResult<PduAddress> {
    let dest = dest.trim_start_matches('+');
    if dest.len() > MAX_DEST_DIGITS {
        return Err(HuaweiError::InvalidPdu("destination address longer than 12 digits"));
    }
    Ok(PduAddress {
        type_addr: AddressType::default(),
        number: PhoneNumber::from_digit_string(dest)?,
    })
}

/// One constituent PDU of a (possibly multipart) outgoing message.
pub struct OutgoingPduPart {
    pub hex: String,
    pub tpdu_len: usize,
    pub split_ref: u16,
    pub split_parts: u8,
    pub split_no: u8,
}

fn assemble(dest: &str, udhi: bool, dcs: SimplisticDataCodingScheme, user_data: Vec<u8>, user_data_len: u8) -> HuaweiResult<(String, usize)> {
    let pdu = Pdu {
        first_octet: PduFirstOctet {
            mti: MessageType::SmsSubmit,
            rd: false,
            vpf: VpFieldValidity::Invalid,
            srr: false,
            udhi,
            rp: false,
        },
        message_id: 0,
        destination: build_destination(dest)?,
        dcs,
        user_data,
        user_data_len,
    };
    let (bytes, tpdu_len) = pdu.as_bytes();
    let hex = bin_to_hex(&bytes);
    if hex.len() > MAX_PDU_HEX_LEN {
        return Err(HuaweiError::InvalidPdu("encoded PDU exceeds the 255-octet wire limit"));
    }
    Ok((hex, tpdu_len))
}

/// Build a single, non-concatenated PDU, silently truncating `msg` to fit if it's too long
/// (`160` GSM-7 septets, or `140` UCS-2 octets). Use `create_pdu_multipart` if truncation is
/// unacceptable.
pub fn create_pdu(dest: &str, msg: &str) -> HuaweiResult<(String, usize)> {
    if let Some(mut septets) = gsm_encoding::try_gsm_encode_string(msg) {
        septets.truncate(MAX_GSM7_SEPTETS);
        let user_data_len = septets.len();
        let packed = gsm_encoding::encode_sms_7bit(&septets, 0);
        assemble(dest, false, SimplisticDataCodingScheme {
            class: MessageClass::Silent,
            encoding: MessageEncoding::Gsm7Bit
        }, packed, user_data_len as u8)
    }
    else {
        let mut bytes = gsm_encoding::ucs2_encode(msg)?;
        bytes.truncate(MSG_TEXT_LIMIT - (MSG_TEXT_LIMIT % 2));
        let user_data_len = bytes.len();
        assemble(dest, false, SimplisticDataCodingScheme {
            class: MessageClass::Silent,
            encoding: MessageEncoding::Ucs2
        }, bytes, user_data_len as u8)
    }
}

/// Build one or more concatenated-SMS PDUs for `msg`, splitting as many times as needed rather
/// than truncating. Returns a single-element `Vec` with `split_no == 0` when no split was needed.
pub fn create_pdu_multipart(dest: &str, msg: &str) -> HuaweiResult<Vec<OutgoingPduPart>> {
    let split_ref = crc16(msg.as_bytes()) & 0xFF;

    if let Some(septets) = gsm_encoding::try_gsm_encode_string(msg) {
        if septets.len() <= MSG_TEXT_LIMIT {
            let packed = gsm_encoding::encode_sms_7bit(&septets, 0);
            let (hex, tpdu_len) = assemble(dest, false, SimplisticDataCodingScheme {
                class: MessageClass::Silent,
                encoding: MessageEncoding::Gsm7Bit
            }, packed, septets.len() as u8)?;
            return Ok(vec![OutgoingPduPart { hex, tpdu_len, split_ref, split_parts: 1, split_no: 0 }]);
        }
        let chunks = gsm_encoding::split_buffers(septets, MULTIPART_TEXT_LIMIT);
        let num_parts = chunks.len() as u8;
        chunks.into_iter().enumerate().map(|(i, chunk)| {
            let udh = UserDataHeader {
                components: vec![udh::UdhComponent {
                    id: 0,
                    data: vec![split_ref as u8, num_parts, i as u8 + 1]
                }]
            };
            let mut user_data = udh.as_bytes();
            let padding = 7 - ((user_data.len() * 8) % 7);
            let udl = ((user_data.len() * 8) + padding + (chunk.len() * 7)) / 7;
            user_data.extend(gsm_encoding::encode_sms_7bit(&chunk, padding));
            let (hex, tpdu_len) = assemble(dest, true, SimplisticDataCodingScheme {
                class: MessageClass::Silent,
                encoding: MessageEncoding::Gsm7Bit
            }, user_data, udl as u8)?;
            Ok(OutgoingPduPart { hex, tpdu_len, split_ref, split_parts: num_parts, split_no: i as u8 + 1 })
        }).collect()
    }
    else {
        let bytes = gsm_encoding::ucs2_encode(msg)?;
        if bytes.len() <= MSG_TEXT_LIMIT {
            let udl = bytes.len();
            let (hex, tpdu_len) = assemble(dest, false, SimplisticDataCodingScheme {
                class: MessageClass::Silent,
                encoding: MessageEncoding::Ucs2
            }, bytes, udl as u8)?;
            return Ok(vec![OutgoingPduPart { hex, tpdu_len, split_ref, split_parts: 1, split_no: 0 }]);
        }
        let chunks = gsm_encoding::split_buffers(bytes, MULTIPART_TEXT_LIMIT - (MULTIPART_TEXT_LIMIT % 2));
        let num_parts = chunks.len() as u8;
        chunks.into_iter().enumerate().map(|(i, chunk)| {
            let udh = UserDataHeader {
                components: vec![udh::UdhComponent {
                    id: 0,
                    data: vec![split_ref as u8, num_parts, i as u8 + 1]
                }]
            };
            let mut user_data = udh.as_bytes();
            user_data.extend(chunk);
            let udl = user_data.len();
            let (hex, tpdu_len) = assemble(dest, true, SimplisticDataCodingScheme {
                class: MessageClass::Silent,
                encoding: MessageEncoding::Ucs2
            }, user_data, udl as u8)?;
            Ok(OutgoingPduPart { hex, tpdu_len, split_ref, split_parts: num_parts, split_no: i as u8 + 1 })
        }).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_seed_scenario_1() {
        let pdu = decode_pdu("0791448720003023240DD0E474D81C0EBB010000111011315214000BE474D81C0EBB5DE3771B").unwrap();
        assert_eq!(pdu.sender, "diafaan");
        assert_eq!(pdu.timestamp, "2011-01-11T13:25:41Z+0");
        assert_eq!(pdu.text, "diafaan.com");
    }

    #[test]
    fn decode_seed_scenario_2() {
        let pdu = decode_pdu("07919712690080F8000B919712890064F90000522090022174210CD4F29C0E1287C76B50D109").unwrap();
        assert_eq!(pdu.sender, "+79219800469");
        assert_eq!(pdu.timestamp, "2025-02-09T20:12:47Z+3");
        assert_eq!(pdu.text, "Test back EN");
    }

    #[test]
    fn encode_seed_scenario_3() {
        let (hex, _) = create_pdu("79219800469", "Test IoT").unwrap();
        assert_eq!(hex, "0011000B919712890064F900000008D4F29C0E4ABEA9");
    }

    #[test]
    fn encode_seed_scenario_4() {
        let (hex, _) = create_pdu("79219800469", "Проверка русского IoT").unwrap();
        assert_eq!(hex, "0011000B919712890064F90008002A041F0440043E043204350440043A003000200440044304410441043A003E0433003000200049006F0054");
    }

    #[test]
    fn ascii_roundtrip_under_160() {
        let text = "the quick brown fox jumps over the lazy dog";
        let (hex, _) = create_pdu("79219800469", text).unwrap();
        let pdu = decode_pdu(&hex).unwrap();
        assert_eq!(pdu.text, text);
    }

    #[test]
    fn decode_seed_scenario_5() {
        assert_eq!(crc16(b"PRIMARY NUMBER"), crc16(b"PRIMARY NUMBER"));
        let hex = "005000520049004D0041005200590020004E0055004D004200450052";
        assert_eq!(decode_contact(hex), "PRIMARY NUMBER");
    }

    #[test]
    fn multipart_covers_long_ucs2_body() {
        let text: String = std::iter::repeat('Ж').take(200).collect();
        let parts = create_pdu_multipart("79219800469", &text).unwrap();
        let expected_parts = (400f64 / 134.0).ceil() as usize;
        assert_eq!(parts.len(), expected_parts);
        let mut reassembled = String::new();
        for (i, part) in parts.iter().enumerate() {
            assert_eq!(part.split_no as usize, i + 1);
            let decoded = decode_pdu(&part.hex).unwrap();
            reassembled.push_str(&decoded.text);
        }
        assert_eq!(reassembled, text);
    }
}
