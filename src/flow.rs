//! The forwarding state machine: the seen-message cache, the polling loop that drives one
//! iteration of read/decode/dedup/forward/delete, soft expiry, multipart reassembly, and the
//! `++`-prefixed runtime command dispatcher.
//!
//! Grounded on `original_source/shared/smsf-flow.c`; the cache layout (`compare_messages`,
//! `find_saved_message`/`add_saved_message`/`remove_saved_message`) and the `flow()` state
//! transitions are carried over nearly line-for-line, generalized from fixed-size C arrays to
//! `Vec<Option<SavedMessage>>` and from `int device` file descriptors to a generic
//! `Dialogue<C: ModemChannel>`.
use crate::dialogue::Dialogue;
use crate::errors::{HuaweiError, HuaweiResult};
use crate::notify::Notifier;
use crate::options::{self, Options, EXPIRE_DEFAULT, SAVED_MESSAGES};
use crate::pdu::{self, DeliverPdu, OutgoingPduPart};
use crate::transport::ModemChannel;
use crate::util;

/// The SIM contact name this crate looks for when no destination override is given, and its
/// UCS-2-hex-encoded form (some Huawei firmwares store and report contact names that way
/// regardless of the active character set).
pub const PRIMARY_NUMBER_NAME: &str = "PRIMARY NUMBER";
pub const PRIMARY_NUMBER_NAME_UCS2_HEX: &str =
    "005000520049004D0041005200590020004E0055004D004200450052";

/// A decoded SMS tracked by the seen-message cache across polling iterations.
#[derive(Debug, Clone)]
pub struct SavedMessage {
    pub sender: String,
    pub timestamp: String,
    pub hash_id: u16,
    pub forwarded: bool,
    pub split_ref: u16,
    pub split_parts: u8,
    pub split_no: u8,
    pub text: String,
}
impl SavedMessage {
    fn from_deliver(pdu: DeliverPdu) -> Self {
        SavedMessage {
            sender: pdu.sender,
            timestamp: pdu.timestamp,
            hash_id: pdu.hash_id,
            forwarded: false,
            split_ref: pdu.concat_ref.unwrap_or(0),
            split_parts: pdu.concat_parts.unwrap_or(0),
            split_no: pdu.concat_seq.unwrap_or(0),
            text: pdu.text,
        }
    }
    fn quadruple_eq(&self, other: &SavedMessage) -> bool {
        self.hash_id == other.hash_id
            && self.split_ref == other.split_ref
            && self.split_parts == other.split_parts
            && self.split_no == other.split_no
            && self.timestamp == other.timestamp
            && self.sender == other.sender
    }
}

/// A fixed-size, open-addressed cache of `SavedMessage`s. Primary placement is
/// `hash_id % capacity`; collisions linear-probe to the first empty slot.
pub struct Cache {
    slots: Vec<Option<SavedMessage>>,
}
impl Cache {
    pub fn new(capacity: usize) -> Self {
        Cache { slots: (0..capacity).map(|_| None).collect() }
    }
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
    pub fn slots(&self) -> &[Option<SavedMessage>] {
        &self.slots
    }
    pub fn get(&self, idx: usize) -> Option<&SavedMessage> {
        self.slots[idx].as_ref()
    }
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut SavedMessage> {
        self.slots[idx].as_mut()
    }
    /// Look up a message matching `candidate`'s `(hash_id, sender, timestamp, split_ref,
    /// split_parts, split_no)` quadruple (spec.md's stricter `compare_messages`, not the
    /// original's hash/timestamp/text-only comparison).
    pub fn find(&self, candidate: &SavedMessage) -> Option<usize> {
        let primary = candidate.hash_id as usize % self.slots.len();
        if let Some(m) = self.slots[primary].as_ref() {
            if m.quadruple_eq(candidate) {
                return Some(primary);
            }
        }
        self.slots
            .iter()
            .enumerate()
            .find(|&(i, s)| i != primary && s.as_ref().map_or(false, |m| m.quadruple_eq(candidate)))
            .map(|(i, _)| i)
    }
    /// Insert `msg`, a no-op if an entry already matches its quadruple (cache idempotence).
    pub fn insert(&mut self, msg: SavedMessage) -> HuaweiResult<()> {
        if self.find(&msg).is_some() {
            return Ok(());
        }
        let primary = msg.hash_id as usize % self.slots.len();
        if self.slots[primary].is_none() {
            self.slots[primary] = Some(msg);
            return Ok(());
        }
        match self.slots.iter_mut().find(|s| s.is_none()) {
            Some(slot) => {
                *slot = Some(msg);
                Ok(())
            }
            None => Err(HuaweiError::Fatal("seen-message cache is full")),
        }
    }
    /// Free the slot at `idx`. Afterwards, lookups for its former key return "not found".
    pub fn remove(&mut self, idx: usize) {
        self.slots[idx] = None;
    }
    fn find_parts(&self, split_ref: u16, split_parts: u8) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|m| (i, m)))
            .filter(|(_, m)| m.split_parts == split_parts && m.split_ref == split_ref && m.split_no > 0)
            .map(|(i, _)| i)
            .collect();
        indices.sort_by_key(|&i| self.slots[i].as_ref().unwrap().split_no);
        indices
    }
}

/// Owns the dialogue, the seen-message cache, the runtime options, and the resolved destination
/// address. One `FlowState` drives one modem for the lifetime of the process.
pub struct FlowState<C, N> {
    dialogue: Dialogue<C>,
    notifier: N,
    options: Options,
    cache: Cache,
    dest_addr: String,
    latest_msg_time: i64,
    expire_seconds: i64,
}
impl<C: ModemChannel, N: Notifier> FlowState<C, N> {
    pub fn new(channel: C, notifier: N) -> Self {
        Self::with_capacity(channel, notifier, SAVED_MESSAGES)
    }
    pub fn with_capacity(channel: C, notifier: N, capacity: usize) -> Self {
        FlowState {
            dialogue: Dialogue::new(channel),
            notifier,
            options: Options::default(),
            cache: Cache::new(capacity),
            dest_addr: String::new(),
            latest_msg_time: 0,
            expire_seconds: EXPIRE_DEFAULT,
        }
    }
    pub fn options(&self) -> &Options {
        &self.options
    }
    pub fn cache(&self) -> &Cache {
        &self.cache
    }
    pub fn dest_addr(&self) -> &str {
        &self.dest_addr
    }
    /// Use the Linux reference build's three-day expiry window instead of the one-day default.
    pub fn set_expire_seconds(&mut self, seconds: i64) {
        self.expire_seconds = seconds;
    }

    /// Resolve the destination address and bring the modem into PDU mode, failing fast if either
    /// cannot be completed. `override_dest`, if given (and non-empty), wins over the SIM contact
    /// scan; otherwise contacts 1..=9 are scanned for one named `PRIMARY NUMBER` (plain or its
    /// UCS-2 hex form).
    pub fn setup(&mut self, override_dest: Option<&str>) -> HuaweiResult<()> {
        self.latest_msg_time = 0;
        self.dialogue.set_echo(false)?;

        self.dest_addr = match override_dest {
            Some(d) if !d.is_empty() => strip_plus(d).to_string(),
            _ => self.find_primary_number()?,
        };
        if self.dest_addr.is_empty() {
            return Err(HuaweiError::Fatal("could not resolve a destination address"));
        }
        info!("forward set to phone: {}", self.dest_addr);
        self.notifier.notify(&self.dest_addr);

        self.dialogue.set_pdu_mode()?;

        let info = self.dialogue.operator_info()?;
        if info.is_empty() {
            return Err(HuaweiError::Fatal("empty operator info; modem unreachable"));
        }
        info!("connected to: {}", info);
        self.notifier.notify(&info);
        Ok(())
    }
    fn find_primary_number(&mut self) -> HuaweiResult<String> {
        for i in 1..=9u32 {
            let (phone, name) = match self.dialogue.read_contact(i) {
                Ok(v) => v,
                Err(e) => {
                    debug!("contact #{} reading error: {}", i, e);
                    break;
                }
            };
            if name == PRIMARY_NUMBER_NAME || name == PRIMARY_NUMBER_NAME_UCS2_HEX {
                return Ok(strip_plus(&phone).to_string());
            }
        }
        Ok(String::new())
    }

    /// One polling iteration: read the message count, then read/decode/dedup/forward/delete each
    /// stored message in ascending SIM index order.
    pub fn poll_once(&mut self) -> HuaweiResult<()> {
        let count = self.dialogue.message_count()?;
        if count == 0 {
            return Ok(());
        }
        debug!("found {} messages to consider", count);
        self.notifier.notify(&format!("Messages: {}", count));

        for i in 1..=count {
            let pdu = match self.dialogue.read_message(i) {
                Ok(p) => p,
                Err(e) => {
                    debug!("message #{} reading error: {}", i, e);
                    continue;
                }
            };
            let candidate = SavedMessage::from_deliver(pdu);
            self.bump_latest(&candidate.timestamp);
            match self.cache.find(&candidate) {
                None => self.handle_unseen(i, candidate),
                Some(idx) => self.handle_seen(i, idx),
            }
        }
        Ok(())
    }
    fn bump_latest(&mut self, ts: &str) {
        if let Ok(epoch) = util::iso2time(ts) {
            if epoch > self.latest_msg_time {
                self.latest_msg_time = epoch;
            }
        }
    }
    fn is_expired(&self, ts: &str) -> bool {
        match util::iso2time(ts) {
            Ok(epoch) => (self.latest_msg_time - epoch) > self.expire_seconds,
            Err(_) => false,
        }
    }

    fn handle_unseen(&mut self, index: u32, mut msg: SavedMessage) {
        let from_destination = strip_plus(&msg.sender) == strip_plus(&self.dest_addr);
        if from_destination && self.dispatch_command(&msg.text) {
            msg.forwarded = true;
        }
        if !msg.forwarded && msg.split_no == 0 {
            match self.forward_message(&msg) {
                Ok(true) => msg.forwarded = true,
                Ok(false) => {}
                Err(e) => debug!("forward of message #{} failed: {}", index, e),
            }
        }
        if let Err(e) = self.cache.insert(msg) {
            warn!("could not cache message #{}: {}", index, e);
        }
    }
    fn handle_seen(&mut self, index: u32, cache_idx: usize) {
        let (timestamp, forwarded, split_no, split_parts, split_ref) = {
            let m = self.cache.get(cache_idx).expect("cache_idx came from a successful find()");
            (m.timestamp.clone(), m.forwarded, m.split_no, m.split_parts, m.split_ref)
        };
        if self.options.expire && self.is_expired(&timestamp) {
            self.try_delete(index, cache_idx);
            return;
        }
        if !forwarded && split_no == 0 {
            let msg = self.cache.get(cache_idx).expect("checked above").clone();
            match self.forward_message(&msg) {
                Ok(true) => {
                    self.cache.get_mut(cache_idx).expect("checked above").forwarded = true;
                }
                Ok(false) => {}
                Err(e) => debug!("forward retry of message #{} failed: {}", index, e),
            }
            return;
        }
        if forwarded {
            self.try_delete(index, cache_idx);
            return;
        }
        if split_no > 0 && split_no == split_parts {
            self.try_reassemble(split_ref, split_parts);
        }
    }
    fn try_delete(&mut self, index: u32, cache_idx: usize) {
        if !self.options.may_delete {
            return;
        }
        match self.dialogue.delete_message(index) {
            Ok(()) => {
                self.notifier.notify(&format!("Deleted #{}", index));
                self.cache.remove(cache_idx);
            }
            Err(e) => {
                warn!("could not delete message #{}: {}", index, e);
                self.notifier.notify(&format!("Delete error #{}", index));
            }
        }
    }
    /// On reaching the last part of a concatenated series, scan the cache for every part sharing
    /// `(split_ref, split_parts)`. If all are present, forward their texts joined in ascending
    /// `split_no` order as one logical message and mark every constituent forwarded (they are
    /// deleted on the next pass, like any other forwarded message). If parts are still missing,
    /// do nothing; a future poll may complete the set.
    fn try_reassemble(&mut self, split_ref: u16, split_parts: u8) {
        let indices = self.cache.find_parts(split_ref, split_parts);
        if indices.len() != split_parts as usize {
            return;
        }
        let (sender, timestamp) = {
            let first = self.cache.get(indices[0]).expect("index came from find_parts");
            (first.sender.clone(), first.timestamp.clone())
        };
        let mut text = String::new();
        for &i in &indices {
            text.push_str(&self.cache.get(i).expect("index came from find_parts").text);
        }
        let combined = SavedMessage {
            sender,
            timestamp,
            hash_id: 0,
            forwarded: false,
            split_ref: 0,
            split_parts: 0,
            split_no: 0,
            text,
        };
        match self.forward_message(&combined) {
            Ok(true) => {
                for &i in &indices {
                    self.cache.get_mut(i).expect("index came from find_parts").forwarded = true;
                }
            }
            Ok(false) => {}
            Err(e) => debug!("multipart reassembly forward failed: {}", e),
        }
    }

    /// Build the augmented body (sender/timestamp tag plus original text) and send it to
    /// `self.dest_addr`. Returns `Ok(true)` if a message was actually sent, `Ok(false)` if
    /// forwarding is disabled (`Options::forward`), so callers can distinguish "nothing to do"
    /// from "attempted and failed".
    fn forward_message(&mut self, msg: &SavedMessage) -> HuaweiResult<bool> {
        if !self.options.forward {
            return Ok(false);
        }
        let body = augmented_body(msg, self.options.header);
        let dest = self.dest_addr.clone();
        let result = if self.options.multipart {
            pdu::create_pdu_multipart(&dest, &body).and_then(|parts| {
                for part in &parts {
                    self.dialogue.send_pdu(part)?;
                }
                Ok(())
            })
        } else {
            pdu::create_pdu(&dest, &body).and_then(|(hex, tpdu_len)| {
                let part = OutgoingPduPart { hex, tpdu_len, split_ref: 0, split_parts: 1, split_no: 0 };
                self.dialogue.send_pdu(&part)
            })
        };
        match result {
            Ok(()) => {
                debug!("forwarded message {:04X} to {}", msg.hash_id, self.dest_addr);
                self.notifier.notify(&format!("Forwarded {:04X}", msg.hash_id));
                Ok(true)
            }
            Err(e) => {
                warn!("can't send message {:04X} to {}: {}", msg.hash_id, self.dest_addr, e);
                self.notifier.notify(&format!("Forward error {:04X}", msg.hash_id));
                Err(e)
            }
        }
    }

    /// Interpret `text` as a `++`-prefixed runtime command if it looks like one. Returns `true`
    /// iff it was recognised (in which case the caller should mark the message forwarded without
    /// actually forwarding it); unrecognised `++...` text returns `false` and normal forwarding
    /// applies. Never surfaces an error: malformed arguments and out-of-range values are logged
    /// and ignored.
    pub fn dispatch_command(&mut self, text: &str) -> bool {
        if !text.starts_with("++") {
            return false;
        }
        let body = &text[2..];
        let (verb, rest) = match body.find(' ') {
            Some(pos) => (&body[..pos], body[pos + 1..].trim()),
            None => (body, ""),
        };
        debug!("processing command message {{{}}}", text);
        match verb {
            "CLEAR" => {
                if let Err(e) = self.dialogue.delete_all_messages() {
                    warn!("++CLEAR failed: {}", e);
                }
                true
            }
            "DUMP" => {
                self.dump_messages();
                true
            }
            "CONTACTS" => {
                self.dump_contacts();
                true
            }
            "SAVED" => {
                self.dump_cache();
                true
            }
            "DELETE" => {
                self.set_bool_option("DELETE", rest, |o, b| o.may_delete = b);
                true
            }
            "EXPIRE" => {
                self.set_bool_option("EXPIRE", rest, |o, b| o.expire = b);
                true
            }
            "FORWARD" => {
                self.set_bool_option("FORWARD", rest, |o, b| o.forward = b);
                true
            }
            "HEADER" => {
                self.set_bool_option("HEADER", rest, |o, b| o.header = b);
                true
            }
            "MULTIPART" => {
                self.set_bool_option("MULTIPART", rest, |o, b| o.multipart = b);
                true
            }
            "LOG" => {
                let level = options::parse_command_arg(rest);
                if (0..=7).contains(&level) {
                    self.options.verbosity = level as u8;
                    info!("verbosity set to {} by SMS", level);
                } else {
                    warn!("++LOG ignored out-of-range level {}", level);
                }
                true
            }
            _ => false,
        }
    }
    fn set_bool_option(&mut self, verb: &str, rest: &str, setter: impl FnOnce(&mut Options, bool)) {
        match options::parse_command_arg(rest) {
            0 => setter(&mut self.options, false),
            1 => setter(&mut self.options, true),
            other => warn!("++{} ignored out-of-range value {}", verb, other),
        }
    }
    /// `++DUMP`: list up to 10 messages to the log, via `AT+CMGL` (default) or a per-index
    /// `AT+CMGR` loop when `Options::slow_read` is set — the same fast/slow split
    /// `ata_read_all_messages` makes in the original, here driving the one caller (`++DUMP`) that
    /// needs a full listing rather than the single-index reads `poll_once` already does.
    fn dump_messages(&mut self) {
        let result = if self.options.slow_read {
            self.read_all_messages_slow()
        } else {
            self.dialogue.list_messages()
        };
        match result {
            Ok(msgs) => {
                info!("found {} messages (SM)", msgs.len());
                for (i, (_, pdu)) in msgs.iter().take(10).enumerate() {
                    info!("Message #{} ({:04X}): From: {} TS: {} {{{}}}", i, pdu.hash_id, pdu.sender, pdu.timestamp, pdu.text);
                }
            }
            Err(e) => warn!("++DUMP couldn't list messages: {}", e),
        }
    }
    fn read_all_messages_slow(&mut self) -> HuaweiResult<Vec<(u32, DeliverPdu)>> {
        let count = self.dialogue.message_count()?;
        let mut ret = Vec::with_capacity(count as usize);
        for i in 1..=count {
            match self.dialogue.read_message(i) {
                Ok(pdu) => ret.push((i, pdu)),
                Err(e) => debug!("slow-read of message #{} failed: {}", i, e),
            }
        }
        Ok(ret)
    }
    fn dump_contacts(&mut self) {
        if let Err(e) = self.dialogue.set_charset_ucs2() {
            warn!("++CONTACTS couldn't set UCS2 charset: {}", e);
            return;
        }
        for i in 1..=25u32 {
            match self.dialogue.read_contact(i) {
                Ok((phone, name)) => {
                    let decoded = pdu::decode_contact(&name);
                    info!("Contact #{} Name: {{{}}} {{{}}} Phone: {{{}}}", i, decoded, name, phone);
                }
                Err(_) => break,
            }
        }
    }
    fn dump_cache(&self) {
        for (i, slot) in self.cache.slots().iter().enumerate() {
            if let Some(m) = slot {
                info!("Message #{} ({:04X}): From: {} TS: {} {{{}}}", i, m.hash_id, m.sender, m.timestamp, m.text);
            }
        }
    }
}

fn strip_plus(s: &str) -> &str {
    s.trim_start_matches('+')
}

/// Tag a forwarded body with the sender and a shortened (`MM-DDTHH:MM:SS`) timestamp, prepended
/// when `header` is set, appended otherwise.
fn augmented_body(msg: &SavedMessage, header: bool) -> String {
    let short_ts = msg.timestamp.get(5..19).unwrap_or(&msg.timestamp);
    if header {
        format!("{} {} {}", msg.sender, short_ts, msg.text)
    } else {
        format!("{} {} {}", msg.text, short_ts, msg.sender)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::notify::NullNotifier;
    use crate::transport::fake::FakeChannel;

    fn flow() -> FlowState<FakeChannel, NullNotifier> {
        FlowState::new(FakeChannel::new(), NullNotifier)
    }

    fn deliver(hash_id: u16, sender: &str, ts: &str, text: &str) -> DeliverPdu {
        DeliverPdu {
            sender: sender.to_string(),
            timestamp: ts.to_string(),
            text: text.to_string(),
            concat_ref: None,
            concat_parts: None,
            concat_seq: None,
            hash_id,
        }
    }

    #[test]
    fn cache_idempotence() {
        let mut cache = Cache::new(4);
        let msg = SavedMessage::from_deliver(deliver(7, "+1", "2024-01-01T00:00:00Z+0", "hi"));
        cache.insert(msg.clone()).unwrap();
        cache.insert(msg.clone()).unwrap();
        let occupied = cache.slots().iter().filter(|s| s.is_some()).count();
        assert_eq!(occupied, 1);
    }

    #[test]
    fn at_most_one_delete() {
        let mut cache = Cache::new(4);
        let msg = SavedMessage::from_deliver(deliver(9, "+1", "2024-01-01T00:00:00Z+0", "hi"));
        let candidate = msg.clone();
        cache.insert(msg).unwrap();
        let idx = cache.find(&candidate).unwrap();
        cache.remove(idx);
        assert!(cache.find(&candidate).is_none());
        assert!(cache.get(idx).is_none());
    }

    #[test]
    fn multipart_reassembly_combines_parts_in_order() {
        let mut f = flow();
        let mut part1 = SavedMessage::from_deliver(deliver(0, "+79219800469", "2024-01-01T00:00:00Z+0", "part-1 "));
        part1.split_ref = 0xE1;
        part1.split_parts = 2;
        part1.split_no = 1;
        let mut part2 = part1.clone();
        part2.text = "part-2".to_string();
        part2.split_no = 2;

        f.cache.insert(part1).unwrap();
        f.cache.insert(part2).unwrap();
        f.dialogue = Dialogue::new({
            let mut chan = FakeChannel::new();
            chan.push_response("\r\nOK\r\n");
            chan
        });

        f.try_reassemble(0xE1, 2);

        let forwarded_count = f.cache.slots().iter().filter(|s| s.as_ref().map_or(false, |m| m.forwarded)).count();
        assert_eq!(forwarded_count, 2);
    }

    #[test]
    fn read_all_messages_slow_reads_one_index_at_a_time() {
        let mut chan = FakeChannel::new();
        chan.push_response("\r\n+CPMS: \"SM\",2,10,\"SM\",2,10,\"SM\",2,10\r\nOK\r\n");
        chan.push_response("\r\n+CMGR: 0,,23\r\n0791448720003023240DD0E474D81C0EBB010000111011315214000BE474D81C0EBB5DE3771B\r\nOK\r\n");
        chan.push_response("\r\n+CMGR: 0,,23\r\n0791448720003023240DD0E474D81C0EBB010000111011315214000BE474D81C0EBB5DE3771B\r\nOK\r\n");
        let mut f = flow();
        f.dialogue = Dialogue::new(chan);
        let msgs = f.read_all_messages_slow().unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].0, 1);
        assert_eq!(msgs[1].0, 2);
    }

    #[test]
    fn dispatch_unknown_command_returns_false() {
        let mut f = flow();
        assert!(!f.dispatch_command("++NOPE"));
        assert!(!f.dispatch_command("not a command"));
    }

    #[test]
    fn dispatch_log_sets_verbosity() {
        let mut f = flow();
        assert!(f.dispatch_command("++LOG 7"));
        assert_eq!(f.options().verbosity, 7);
    }

    #[test]
    fn dispatch_log_ignores_out_of_range() {
        let mut f = flow();
        assert!(f.dispatch_command("++LOG 99"));
        assert_eq!(f.options().verbosity, 3);
    }

    #[test]
    fn dispatch_toggles_options() {
        let mut f = flow();
        assert!(f.dispatch_command("++MULTIPART 1"));
        assert!(f.options().multipart);
        assert!(f.dispatch_command("++FORWARD 0"));
        assert!(!f.options().forward);
    }

    #[test]
    fn augmented_body_layouts() {
        let msg = SavedMessage::from_deliver(deliver(1, "+79219800469", "2025-02-09T20:12:47Z+3", "Test back EN"));
        let truncate = augmented_body(&msg, false);
        assert_eq!(truncate, "Test back EN 02-09T20:12:47 +79219800469");
        let header = augmented_body(&msg, true);
        assert_eq!(header, "+79219800469 02-09T20:12:47 Test back EN");
    }
}
