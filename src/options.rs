//! The runtime options record (`struct smsf_options` in the original C), plus the single-writer
//! mutation path used by `flow::dispatch_command`.
//!
//! This is plain data with no interior mutability: the core is single-driver (see `flow`), so the
//! borrow checker's aliasing rules already give the "coarse write barrier" the original design
//! called for. A command-dispatch step holds `&mut Options` for the duration of its mutation and
//! nothing else can observe a half-applied write.

/// Default size of the forwarding state machine's seen-message cache.
pub const SAVED_MESSAGES: usize = 32;
/// Default soft-expiry window, in seconds (one day, per spec.md; the Linux reference build uses
/// three days instead — see `EXPIRE_LINUX` and `flow::FlowState::set_expire_seconds`).
pub const EXPIRE_DEFAULT: i64 = 24 * 3600;
/// The Linux reference build's expiry window (three days), kept as a named alternative to the
/// one-day default for hosts that want to match it.
pub const EXPIRE_LINUX: i64 = 3 * 24 * 3600;

/// Process-wide runtime configuration, mutated only by `flow::dispatch_command`'s `++...`
/// command handling and otherwise read-only for the lifetime of a `flow::FlowState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Log verbosity, 0-7 (mirrors syslog severity levels); consulted by a host's own logging
    /// setup, not by this crate's `log` call sites (see SPEC_FULL.md §4.6).
    pub verbosity: u8,
    /// Mirror log output to syslog; a host concern, stored here purely so `++LOG`-style control
    /// messages have somewhere to land.
    pub syslog: bool,
    /// Prefer per-index `AT+CMGR` reads over a single `AT+CMGL` listing.
    pub slow_read: bool,
    /// Whether `flow::FlowState::poll_once` is permitted to issue `AT+CMGD` deletions.
    pub may_delete: bool,
    /// Whether forwarding is enabled at all.
    pub forward: bool,
    /// Forward long messages as concatenated SMS rather than silently truncating them.
    pub multipart: bool,
    /// Prepend (rather than append) the sender/timestamp tag on forwarded bodies.
    pub header: bool,
    /// Whether soft expiry (`EXPIRE`) is enforced.
    pub expire: bool,
    /// Informational version counter, bumped by nothing in this crate today; kept for parity
    /// with the original record and for hosts embedding a build/version identifier.
    pub version: u16,
}
impl Default for Options {
    fn default() -> Self {
        Options {
            verbosity: 3,
            syslog: false,
            slow_read: false,
            may_delete: true,
            forward: true,
            multipart: false,
            header: false,
            expire: true,
            version: 1,
        }
    }
}
/// Parse a `++VERB <arg>` command-message argument the way the original `atoi`-based parsing
/// does: a non-numeric or missing tail is treated as zero, never as an error.
pub(crate) fn parse_command_arg(tail: &str) -> i64 {
    tail.trim().parse().unwrap_or(0)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let o = Options::default();
        assert!(o.forward);
        assert!(o.may_delete);
        assert!(o.expire);
        assert!(!o.multipart);
        assert!(!o.header);
    }

    #[test]
    fn command_arg_permissive() {
        assert_eq!(parse_command_arg("7"), 7);
        assert_eq!(parse_command_arg("garbage"), 0);
        assert_eq!(parse_command_arg(""), 0);
        assert_eq!(parse_command_arg(" 2 "), 2);
    }
}
