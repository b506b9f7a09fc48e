use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::models::{Booking, BookingRequest, SessionId};
use crate::validation::{ValidationError, validate_client_name, validate_email};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("Class {0} not found")]
    SessionNotFound(SessionId),
    #[error("{email} has already booked class {session_id}")]
    DuplicateBooking { session_id: SessionId, email: String },
    #[error("No slots available for class {0}")]
    SessionFull(SessionId),
}

/// Records bookings per class. Each class has its own lock, so the
/// duplicate and capacity checks and the append happen as one step.
///
/// `book` holds at most one lock at a time. Anything that needs several
/// locks at once takes them in ascending session id order.
#[derive(Debug)]
pub struct BookingLedger {
    catalog: Arc<Catalog>,
    sessions: BTreeMap<SessionId, Mutex<Vec<Booking>>>,
    next_id: AtomicU64,
}

// Lists are only appended to after every check has passed, so a poisoned
// lock still guards a consistent list.
fn lock(slot: &Mutex<Vec<Booking>>) -> MutexGuard<'_, Vec<Booking>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BookingLedger {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let sessions = catalog
            .sessions()
            .iter()
            .map(|s| {
                let reserve = usize::try_from(s.capacity).unwrap_or_default();
                (s.id, Mutex::new(Vec::with_capacity(reserve)))
            })
            .collect();

        Self {
            catalog,
            sessions,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn book(&self, request: &BookingRequest) -> Result<Booking, BookingError> {
        let email = validate_email(&request.email)?;
        let client_name = request
            .client_name
            .as_deref()
            .map(validate_client_name)
            .transpose()?;

        let session_id = request.session_id;
        let session = self
            .catalog
            .get(session_id)
            .ok_or(BookingError::SessionNotFound(session_id))?;
        let slot = self
            .sessions
            .get(&session_id)
            .ok_or(BookingError::SessionNotFound(session_id))?;

        let mut bookings = lock(slot);
        if bookings.iter().any(|b| b.email.eq_ignore_ascii_case(&email)) {
            return Err(BookingError::DuplicateBooking { session_id, email });
        }
        if bookings.len() >= usize::try_from(session.capacity).unwrap_or(usize::MAX) {
            return Err(BookingError::SessionFull(session_id));
        }

        let booking = Booking {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            session_id,
            class_name: session.name,
            client_name,
            email,
            booked_at: Utc::now(),
        };
        bookings.push(booking.clone());
        Ok(booking)
    }

    pub fn booked_count(&self, session_id: SessionId) -> Option<usize> {
        self.sessions.get(&session_id).map(|slot| lock(slot).len())
    }

    /// Booked count of every session, read while holding all session locks,
    /// so the counts belong to a single moment.
    pub fn snapshot_counts(&self) -> HashMap<SessionId, usize> {
        let guards: Vec<_> = self
            .sessions
            .iter()
            .map(|(id, slot)| (*id, lock(slot)))
            .collect();
        guards
            .iter()
            .map(|(id, bookings)| (*id, bookings.len()))
            .collect()
    }

    /// All bookings ordered by id, optionally only those made with `email`.
    pub fn list_bookings(&self, email: Option<&str>) -> Result<Vec<Booking>, BookingError> {
        let email = email.map(validate_email).transpose()?;

        let mut result: Vec<Booking> = self
            .sessions
            .values()
            .flat_map(|slot| {
                lock(slot)
                    .iter()
                    .filter(|b| email.as_deref().is_none_or(|e| b.email.eq_ignore_ascii_case(e)))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        result.sort_by_key(|b| b.id);
        Ok(result)
    }

    pub fn len(&self) -> usize {
        self.sessions.values().map(|slot| lock(slot).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::sync::atomic::AtomicBool;
    use std::thread;

    use chrono::NaiveDateTime;

    use super::*;
    use crate::catalog::SessionSeed;
    use crate::models::ClassName;

    fn ledger_with_capacity(capacity: u32) -> BookingLedger {
        let seed = SessionSeed {
            id: 1,
            name: ClassName::Hiit,
            instructor: "Coach".to_string(),
            local_start: NaiveDateTime::parse_from_str("2025-08-22 18:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            capacity,
        };
        let catalog = Catalog::new(chrono_tz::Asia::Kolkata, vec![seed]).unwrap();
        BookingLedger::new(Arc::new(catalog))
    }

    fn two_class_ledger(capacity: u32) -> BookingLedger {
        let seeds = [1, 2]
            .into_iter()
            .map(|id| SessionSeed {
                id,
                name: ClassName::Yoga,
                instructor: "Coach".to_string(),
                local_start: NaiveDateTime::parse_from_str(
                    "2025-08-22 08:00:00",
                    "%Y-%m-%d %H:%M:%S",
                )
                .unwrap(),
                capacity,
            })
            .collect();
        let catalog = Catalog::new(chrono_tz::UTC, seeds).unwrap();
        BookingLedger::new(Arc::new(catalog))
    }

    fn default_ledger() -> BookingLedger {
        let catalog = Catalog::with_default_classes(chrono_tz::Asia::Kolkata).unwrap();
        BookingLedger::new(Arc::new(catalog))
    }

    #[test]
    fn test_book_success() {
        let ledger = default_ledger();
        let request = BookingRequest::new(2, " jane@example.com ").with_client_name("Jane");

        let booking = ledger.book(&request).unwrap();
        assert_eq!(booking.id, 1);
        assert_eq!(booking.session_id, 2);
        assert_eq!(booking.class_name, ClassName::Zumba);
        assert_eq!(booking.email, "jane@example.com");
        assert_eq!(booking.client_name.as_deref(), Some("Jane"));
        assert_eq!(ledger.booked_count(2), Some(1));
        assert_eq!(ledger.booked_count(1), Some(0));
    }

    #[test]
    fn test_duplicate_booking() {
        let ledger = default_ledger();
        ledger.book(&BookingRequest::new(1, "jane@example.com")).unwrap();

        let err = ledger
            .book(&BookingRequest::new(1, "JANE@example.com"))
            .unwrap_err();
        assert!(matches!(err, BookingError::DuplicateBooking { session_id: 1, .. }));
        assert_eq!(ledger.booked_count(1), Some(1));

        // Same client may still book a different class.
        assert!(ledger.book(&BookingRequest::new(3, "jane@example.com")).is_ok());
    }

    #[test]
    fn test_invalid_email_creates_nothing() {
        let ledger = default_ledger();
        let err = ledger.book(&BookingRequest::new(1, "not-an-email")).unwrap_err();
        assert_eq!(
            err,
            BookingError::Invalid(ValidationError::InvalidEmail("not-an-email".to_string()))
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_invalid_client_name() {
        let ledger = default_ledger();
        let request = BookingRequest::new(1, "jane@example.com").with_client_name("J");
        assert_eq!(
            ledger.book(&request).unwrap_err(),
            BookingError::Invalid(ValidationError::InvalidClientName)
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_unknown_session() {
        let ledger = default_ledger();
        assert_eq!(
            ledger.book(&BookingRequest::new(99, "jane@example.com")).unwrap_err(),
            BookingError::SessionNotFound(99)
        );
        assert_eq!(ledger.booked_count(99), None);
    }

    #[test]
    fn test_session_full() {
        let ledger = ledger_with_capacity(2);
        ledger.book(&BookingRequest::new(1, "a@example.com")).unwrap();
        ledger.book(&BookingRequest::new(1, "b@example.com")).unwrap();

        assert_eq!(
            ledger.book(&BookingRequest::new(1, "c@example.com")).unwrap_err(),
            BookingError::SessionFull(1)
        );
        assert_eq!(ledger.booked_count(1), Some(2));
    }

    #[test]
    fn test_concurrent_bookings_respect_capacity() {
        let capacity = 5;
        let attempts = 32;
        let ledger = ledger_with_capacity(capacity);
        let barrier = Barrier::new(attempts);

        let results: Vec<Result<Booking, BookingError>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..attempts)
                .map(|i| {
                    let ledger = &ledger;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        ledger.book(&BookingRequest::new(1, format!("client{i}@example.com")))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        let full = results
            .iter()
            .filter(|r| matches!(r, Err(BookingError::SessionFull(1))))
            .count();
        assert_eq!(succeeded, capacity as usize);
        assert_eq!(full, attempts - capacity as usize);
        assert_eq!(ledger.booked_count(1), Some(capacity as usize));
    }

    #[test]
    fn test_last_seat_goes_to_exactly_one_client() {
        for _ in 0..50 {
            let ledger = ledger_with_capacity(1);
            let barrier = Barrier::new(2);

            let (a, b) = thread::scope(|scope| {
                let first = scope.spawn(|| {
                    barrier.wait();
                    ledger.book(&BookingRequest::new(1, "first@example.com"))
                });
                let second = scope.spawn(|| {
                    barrier.wait();
                    ledger.book(&BookingRequest::new(1, "second@example.com"))
                });
                (first.join().unwrap(), second.join().unwrap())
            });

            assert!(a.is_ok() != b.is_ok());
            let failure = if a.is_err() { a } else { b };
            assert_eq!(failure.unwrap_err(), BookingError::SessionFull(1));
        }
    }

    #[test]
    fn test_list_bookings() {
        let ledger = default_ledger();
        ledger.book(&BookingRequest::new(3, "jane@example.com")).unwrap();
        ledger.book(&BookingRequest::new(1, "john@example.com")).unwrap();
        ledger.book(&BookingRequest::new(1, "jane@example.com")).unwrap();

        let all = ledger.list_bookings(None).unwrap();
        let ids: Vec<_> = all.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let jane = ledger.list_bookings(Some("Jane@Example.com")).unwrap();
        assert_eq!(jane.len(), 2);
        assert!(jane.iter().all(|b| b.email == "jane@example.com"));

        assert!(ledger.list_bookings(Some("nobody@example.com")).unwrap().is_empty());
        assert!(ledger.list_bookings(Some("bogus")).is_err());
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_snapshot_counts() {
        let ledger = default_ledger();
        ledger.book(&BookingRequest::new(1, "a@example.com")).unwrap();
        ledger.book(&BookingRequest::new(1, "b@example.com")).unwrap();
        ledger.book(&BookingRequest::new(3, "a@example.com")).unwrap();

        let counts = ledger.snapshot_counts();
        assert_eq!(counts.len(), 3);
        assert_eq!(counts[&1], 2);
        assert_eq!(counts[&2], 0);
        assert_eq!(counts[&3], 1);
    }

    #[test]
    fn test_snapshot_never_shows_later_booking_without_earlier_one() {
        // Each client books class 1 and then class 2, so at any moment class 2
        // has at most as many bookings as class 1.
        let clients = 300;
        let ledger = two_class_ledger(clients);
        let done = AtomicBool::new(false);

        thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..clients {
                    let email = format!("c{i}@example.com");
                    ledger.book(&BookingRequest::new(1, email.as_str())).unwrap();
                    ledger.book(&BookingRequest::new(2, email.as_str())).unwrap();
                }
                done.store(true, Ordering::SeqCst);
            });

            scope.spawn(|| {
                loop {
                    let finished = done.load(Ordering::SeqCst);
                    let counts = ledger.snapshot_counts();
                    assert!(
                        counts[&2] <= counts[&1],
                        "class 2 ahead of class 1: {counts:?}"
                    );
                    if finished {
                        break;
                    }
                }
            });
        });

        let counts = ledger.snapshot_counts();
        assert_eq!(counts[&1], clients as usize);
        assert_eq!(counts[&2], clients as usize);
    }
}
