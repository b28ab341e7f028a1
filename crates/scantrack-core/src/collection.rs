//! Versioned receipt collection slot
//!
//! Fetches against the Store Service may be superseded before they resolve
//! (e.g., the user changes the time-range selector while a response is in
//! flight). The slot hands out an epoch token per fetch; only the response
//! carrying the newest token is installed, and stale responses are silently
//! discarded rather than overwriting a newer result. The value is always
//! replaced wholesale, never patched field by field.

use crate::models::Receipt;

/// Token identifying one fetch. Issued by [`Versioned::begin`]; invalidated
/// the moment a newer fetch begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchToken(u64);

/// An epoch-guarded slot for a wholesale-replaced value.
#[derive(Debug, Default)]
pub struct Versioned<T> {
    epoch: u64,
    value: Option<T>,
}

impl<T> Versioned<T> {
    pub fn new() -> Self {
        Self {
            epoch: 0,
            value: None,
        }
    }

    /// Start a fetch: bumps the epoch, invalidating every earlier token.
    pub fn begin(&mut self) -> FetchToken {
        self.epoch += 1;
        FetchToken(self.epoch)
    }

    /// Install a fetched value if its token is still current. Returns
    /// whether the value was accepted; a stale response is dropped without
    /// an error.
    pub fn accept(&mut self, token: FetchToken, value: T) -> bool {
        if token.0 == self.epoch {
            self.value = Some(value);
            true
        } else {
            tracing::debug!(
                stale = token.0,
                current = self.epoch,
                "Discarding stale fetch response"
            );
            false
        }
    }

    /// The latest accepted value, if any fetch has completed.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Drop the held value without changing the epoch. In-flight fetches
    /// stay valid; the next render simply has nothing to show.
    pub fn clear(&mut self) {
        self.value = None;
    }
}

/// The receipt collection backing one view.
pub type ReceiptCollection = Versioned<Vec<Receipt>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_current_fetch() {
        let mut slot: Versioned<i32> = Versioned::new();
        let token = slot.begin();
        assert!(slot.accept(token, 1));
        assert_eq!(slot.get(), Some(&1));
    }

    #[test]
    fn test_discards_stale_response() {
        let mut slot: Versioned<&str> = Versioned::new();
        let first = slot.begin();
        let second = slot.begin();

        // The newer fetch resolves first
        assert!(slot.accept(second, "new"));
        // The superseded fetch resolves late and must not overwrite
        assert!(!slot.accept(first, "old"));
        assert_eq!(slot.get(), Some(&"new"));
    }

    #[test]
    fn test_stale_token_cannot_fill_an_empty_slot() {
        let mut slot: Versioned<i32> = Versioned::new();
        let first = slot.begin();
        let _second = slot.begin();

        assert!(!slot.accept(first, 1));
        assert_eq!(slot.get(), None);
    }

    #[test]
    fn test_clear_keeps_inflight_token_valid() {
        let mut slot: Versioned<i32> = Versioned::new();
        let token = slot.begin();
        slot.clear();
        assert!(slot.accept(token, 7));
        assert_eq!(slot.get(), Some(&7));
    }
}
