//! Selection between concurrency-checked and unchecked statement shapes.
//!
//! The comparison of tokens happens inside the store through the equality
//! predicate bound into the checked shapes. This module only decides, per
//! row, whether that predicate applies and which token gets bound.

/// Caller policy for one update or delete call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConcurrencyCheck {
    requested: bool,
}

impl ConcurrencyCheck {
    pub fn new(requested: bool) -> Self {
        Self { requested }
    }

    pub fn enabled() -> Self {
        Self::new(true)
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Whether the caller asked for token checking on this call.
    pub fn is_requested(&self) -> bool {
        self.requested
    }

    /// Token to bind for a row, or `None` when the row takes the unchecked shape.
    ///
    /// A row is checked only when checking was requested and it supplies a
    /// previous-version token. Rows without a token bypass the check.
    pub fn token_for<'t>(&self, previous_uuid: Option<&'t str>) -> Option<&'t str> {
        if self.requested {
            previous_uuid
        } else {
            None
        }
    }
}
