//! Reads hex-ASCII SMS-DELIVER PDUs from stdin, one per line, and prints what `smsf::pdu` decodes
//! out of each.
use smsf::pdu::decode_pdu;
use std::io::prelude::*;

fn main() {
    println!("Input PDUs");
    let stdin = ::std::io::stdin();
    let lock = stdin.lock();
    for ln in lock.lines() {
        let ln = ln.unwrap();
        if ln.trim().is_empty() {
            continue;
        }
        match decode_pdu(&ln) {
            Ok(pdu) => {
                println!("PDU: {:?}", pdu);
                println!("Sender: {}", pdu.sender);
                println!("Timestamp: {}", pdu.timestamp);
                println!("Message: {:?}", pdu.text);
            }
            Err(e) => println!("Couldn't decode {{{}}}: {}", ln, e),
        }
    }
}
