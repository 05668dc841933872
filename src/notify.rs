//! Notification sink, replacing the original `notify_func_t` variadic function-pointer callback
//! with a one-method trait. Callers format their own text; a `Notifier` only ever display it.
//! Notifications are fire-and-forget: nothing in `flow` treats a failed/absent notification as an
//! error.

/// Something that can be told about significant events, for display purposes only.
pub trait Notifier {
    fn notify(&self, text: &str);
}

/// A `Notifier` that discards everything. Used by tests and by hosts that don't want a display.
pub struct NullNotifier;
impl Notifier for NullNotifier {
    fn notify(&self, _text: &str) {}
}

impl<F: Fn(&str)> Notifier for F {
    fn notify(&self, text: &str) {
        self(text)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn null_notifier_discards() {
        NullNotifier.notify("whatever");
    }

    #[test]
    fn closure_notifier_records() {
        let seen = RefCell::new(Vec::new());
        let notifier = |text: &str| seen.borrow_mut().push(text.to_string());
        notifier.notify("hello");
        assert_eq!(seen.borrow().as_slice(), &["hello".to_string()]);
    }
}
