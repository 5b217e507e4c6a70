//! Sink for recoverable diagnostics.
//!
//! Compatibility fallbacks (mislabelled tables, contradictory color markers, junk between
//! segments) never fail a decode. They are reported here and logged at `warn` level.

use tracing::warn;

pub trait WarningListener {
    fn warning_occurred(&mut self, message: &str);
}

/// Discards warnings; they still reach the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullWarningListener;

impl WarningListener for NullWarningListener {
    fn warning_occurred(&mut self, _message: &str) {}
}

impl WarningListener for Vec<String> {
    fn warning_occurred(&mut self, message: &str) {
        self.push(message.to_owned());
    }
}

impl<L: WarningListener + ?Sized> WarningListener for &mut L {
    fn warning_occurred(&mut self, message: &str) {
        (**self).warning_occurred(message)
    }
}

/// Adapts a closure.
pub struct WarningFn<F>(pub F);

impl<F: FnMut(&str)> WarningListener for WarningFn<F> {
    fn warning_occurred(&mut self, message: &str) {
        (self.0)(message)
    }
}

pub fn emit(listener: &mut dyn WarningListener, message: impl AsRef<str>) {
    let message = message.as_ref();
    warn!("{message}");
    listener.warning_occurred(message);
}
