use tracing::debug;

use super::errors::Error;

/// The diagnostic sink. Every report bumps the error count; nothing here
/// stops analysis.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<Error>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn report(&mut self, error: Error) {
        debug!(
            kind = error.get_error_name(),
            file = %error.get_position().1,
            offset = error.get_position().0,
            "{}",
            error.message()
        );
        self.errors.push(error);
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn take(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.errors)
    }
}
