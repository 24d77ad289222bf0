//! Render-as-you-fetch holder for one remote resource.
//!
//! Every fetch gets a sequence number. Only the newest one is allowed to land; older
//! responses still complete on the wire but are dropped here.

use tracing::{debug, warn};

use crate::error::TodoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Seq(u64);

#[derive(Debug, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Failed,
    Stale,
}

#[derive(Debug)]
enum Slot<T> {
    Loading,
    Ready(T),
    Failed(String),
}

#[derive(Debug)]
pub struct Resource<T> {
    slot: Slot<T>,
    issued: u64,
    in_flight: Option<Seq>,
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Self {
            slot: Slot::Loading,
            issued: 0,
            in_flight: None,
        }
    }
}

impl<T> Resource<T> {
    /// Issue a new request token. Any earlier token becomes stale.
    pub fn begin(&mut self) -> Seq {
        self.issued += 1;
        let seq = Seq(self.issued);
        self.in_flight = Some(seq);
        seq
    }

    pub fn resolve(&mut self, seq: Seq, result: Result<T, TodoError>) -> Resolution {
        if self.in_flight != Some(seq) {
            debug!(?seq, latest = self.issued, "discarding stale response");
            return Resolution::Stale;
        }

        self.in_flight = None;
        match result {
            Ok(data) => {
                self.slot = Slot::Ready(data);
                Resolution::Applied
            }
            Err(e) => {
                warn!(error = %e, "fetch failed");
                self.slot = Slot::Failed(e.to_string());
                Resolution::Failed
            }
        }
    }

    /// A refetch is in flight.
    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Nothing has loaded yet; the only state where a blocking spinner is shown.
    pub fn is_first_load(&self) -> bool {
        matches!(self.slot, Slot::Loading)
    }

    /// Previously loaded data is visible while a newer request is in flight.
    pub fn is_stale(&self) -> bool {
        self.is_pending() && matches!(self.slot, Slot::Ready(_))
    }

    pub fn data(&self) -> Option<&T> {
        match &self.slot {
            Slot::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.slot {
            Slot::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_load_then_ready() {
        let mut resource = Resource::<Vec<u32>>::default();
        assert!(resource.is_first_load());

        let seq = resource.begin();
        assert!(resource.is_pending());
        assert!(!resource.is_stale());

        assert_eq!(resource.resolve(seq, Ok(vec![1, 2])), Resolution::Applied);
        assert!(!resource.is_pending());
        assert_eq!(resource.data(), Some(&vec![1, 2]));
    }

    #[test]
    fn test_refetch_keeps_previous_data_visible() {
        let mut resource = Resource::default();
        let seq = resource.begin();
        resource.resolve(seq, Ok("old"));

        resource.begin();
        assert!(resource.is_stale());
        assert!(!resource.is_first_load());
        assert_eq!(resource.data(), Some(&"old"));
    }

    #[test]
    fn test_last_issued_wins() {
        let mut resource = Resource::default();
        let older = resource.begin();
        let newer = resource.begin();

        assert_eq!(resource.resolve(newer, Ok("newer")), Resolution::Applied);
        assert_eq!(resource.resolve(older, Ok("older")), Resolution::Stale);
        assert_eq!(resource.data(), Some(&"newer"));
    }

    #[test]
    fn test_stale_response_does_not_clear_pending() {
        let mut resource = Resource::default();
        let older = resource.begin();
        let _newer = resource.begin();

        assert_eq!(resource.resolve(older, Ok(1)), Resolution::Stale);
        assert!(resource.is_pending());
        assert!(resource.data().is_none());
    }

    #[test]
    fn test_failure_is_recorded() {
        let mut resource = Resource::<u32>::default();
        let seq = resource.begin();
        let outcome = resource.resolve(
            seq,
            Err(TodoError::Api {
                status: 500,
                message: "boom".into(),
            }),
        );

        assert_eq!(outcome, Resolution::Failed);
        assert!(resource.error().unwrap().contains("boom"));
        assert!(resource.data().is_none());
    }
}
