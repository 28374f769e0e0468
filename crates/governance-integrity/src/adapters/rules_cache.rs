//! Single-flight TTL cache for the verified governance rules.
//!
//! Every verification call consults this cache, so concurrent callers that
//! find it stale must share one fetch instead of each hitting the platform.
//!
//! # Cache States
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      RULES CACHE STATE MACHINE                      │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                                                                     │
//! │      ┌──────────┐  get   ┌──────────┐ success ┌──────────┐          │
//! │      │  EMPTY   │ ─────► │ FETCHING │ ──────► │  VALID   │          │
//! │      └──────────┘        └──────────┘         └──────────┘          │
//! │            ▲                │    ▲                  │               │
//! │            │       failure  │    │ get              │ ttl elapsed   │
//! │            └────────────────┘    │                  ▼               │
//! │              (prior state)       │            ┌──────────┐          │
//! │                                  └─────────── │ EXPIRED  │          │
//! │                                               └──────────┘          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Locking
//!
//! One mutex guards value, expiry and the in-flight marker; one condvar
//! signals flight completion. The fetch runs with the mutex released, so
//! `set`, `invalidate` and fresh reads proceed while a slow fetch is out.
//! A waiter that times out simply stops waiting; the flight carries on.
//!
//! `set` and `invalidate` bump a generation counter and detach the current
//! flight. A flight started under an older generation still answers its own
//! waiters but never writes its value into the cache.

use crate::domain::entities::RulesContainer;
use crate::domain::errors::VerificationError;
use crate::ports::outbound::FetchContext;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result every participant of a flight receives.
pub type FetchOutcome<T> = Result<Arc<T>, VerificationError>;

/// Cache of the authenticated governance rules.
pub type RulesContainerCache = SingleFlightCache<RulesContainer>;

/// Observable cache state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Nothing cached yet (or invalidated)
    Empty,
    /// Cached value within its TTL
    Valid,
    /// Cached value past its TTL
    Expired,
    /// A refresh is in flight
    Fetching,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStatus::Empty => write!(f, "empty"),
            CacheStatus::Valid => write!(f, "valid"),
            CacheStatus::Expired => write!(f, "expired"),
            CacheStatus::Fetching => write!(f, "fetching"),
        }
    }
}

/// One outstanding refresh. The outcome is written exactly once, under the
/// cache mutex.
struct Flight<T> {
    generation: u64,
    outcome: OnceLock<FetchOutcome<T>>,
}

struct CacheState<T> {
    value: Option<Arc<T>>,
    expires_at: Option<Instant>,
    flight: Option<Arc<Flight<T>>>,
    generation: u64,
}

impl<T> CacheState<T> {
    fn reset_generation(&mut self) {
        self.generation += 1;
        self.flight = None;
    }

    fn fresh(&self, now: Instant) -> Option<Arc<T>> {
        match (&self.value, self.expires_at) {
            (Some(value), Some(expires_at)) if now < expires_at => Some(value.clone()),
            _ => None,
        }
    }
}

enum Role<T> {
    Leader(Arc<Flight<T>>),
    Waiter(Arc<Flight<T>>),
}

/// TTL cache whose refreshes are single-flight.
pub struct SingleFlightCache<T> {
    ttl: Duration,
    state: Mutex<CacheState<T>>,
    flight_done: Condvar,
    fetches: AtomicU64,
}

impl<T> SingleFlightCache<T> {
    /// Create an empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(CacheState {
                value: None,
                expires_at: None,
                flight: None,
                generation: 0,
            }),
            flight_done: Condvar::new(),
            fetches: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached value, fetching it if absent or expired.
    ///
    /// Waits without limit for a refresh started by another caller.
    pub fn get<F>(&self, fetch: F) -> FetchOutcome<T>
    where
        F: FnOnce(&FetchContext) -> Result<T, VerificationError>,
    {
        self.get_in_context(FetchContext::default(), fetch)
    }

    /// As [`get`](Self::get), but stops waiting after `timeout`.
    ///
    /// If this caller starts the refresh, the deadline is handed to `fetch`
    /// through the [`FetchContext`] instead.
    pub fn get_with_timeout<F>(&self, timeout: Duration, fetch: F) -> FetchOutcome<T>
    where
        F: FnOnce(&FetchContext) -> Result<T, VerificationError>,
    {
        self.get_in_context(FetchContext::with_timeout(timeout), fetch)
    }

    fn get_in_context<F>(&self, context: FetchContext, fetch: F) -> FetchOutcome<T>
    where
        F: FnOnce(&FetchContext) -> Result<T, VerificationError>,
    {
        let role = {
            let mut state = self.state.lock();
            if let Some(value) = state.fresh(Instant::now()) {
                return Ok(value);
            }
            match &state.flight {
                Some(flight) => Role::Waiter(flight.clone()),
                None => {
                    let flight = Arc::new(Flight {
                        generation: state.generation,
                        outcome: OnceLock::new(),
                    });
                    state.flight = Some(flight.clone());
                    Role::Leader(flight)
                }
            }
        };

        match role {
            Role::Leader(flight) => self.lead(flight, context, fetch),
            Role::Waiter(flight) => self.wait(&flight, &context),
        }
    }

    fn lead<F>(&self, flight: Arc<Flight<T>>, context: FetchContext, fetch: F) -> FetchOutcome<T>
    where
        F: FnOnce(&FetchContext) -> Result<T, VerificationError>,
    {
        let fetch_number = self.fetches.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(fetch_number, "Refreshing governance rules");

        let guard = FlightGuard {
            cache: self,
            flight,
            completed: false,
        };
        let outcome = fetch(&context).map(Arc::new);
        guard.complete(outcome)
    }

    fn wait(&self, flight: &Flight<T>, context: &FetchContext) -> FetchOutcome<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(outcome) = flight.outcome.get() {
                return outcome.clone();
            }
            match context.deadline {
                None => self.flight_done.wait(&mut state),
                Some(deadline) => {
                    if self.flight_done.wait_until(&mut state, deadline).timed_out() {
                        if let Some(outcome) = flight.outcome.get() {
                            return outcome.clone();
                        }
                        debug!("Stopped waiting for in-flight rules fetch");
                        return Err(VerificationError::Timeout);
                    }
                }
            }
        }
    }

    /// Publish a flight's outcome and wake its waiters.
    ///
    /// A failure leaves value and expiry as they were, and so does a success
    /// from a flight that `set` or `invalidate` has since superseded.
    fn finish(&self, flight: &Arc<Flight<T>>, outcome: FetchOutcome<T>) -> FetchOutcome<T> {
        let mut state = self.state.lock();
        match &outcome {
            Ok(_) if flight.generation != state.generation => {
                debug!(
                    flight_generation = flight.generation,
                    generation = state.generation,
                    "Discarding rules fetched before cache was reset"
                );
            }
            Ok(value) => {
                state.value = Some(value.clone());
                state.expires_at = Some(Instant::now() + self.ttl);
            }
            Err(e) => warn!(error = %e, "Governance rules refresh failed"),
        }
        if state
            .flight
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, flight))
        {
            state.flight = None;
        }
        let _ = flight.outcome.set(outcome.clone());
        drop(state);

        self.flight_done.notify_all();
        outcome
    }

    /// Store a value directly and restart its TTL.
    pub fn set(&self, value: T) {
        let mut state = self.state.lock();
        state.value = Some(Arc::new(value));
        state.expires_at = Some(Instant::now() + self.ttl);
        state.reset_generation();
    }

    /// Drop the cached value. A refresh already in flight answers its own
    /// waiters but is not stored.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.value = None;
        state.expires_at = None;
        state.reset_generation();
    }

    pub fn is_valid(&self) -> bool {
        self.state.lock().fresh(Instant::now()).is_some()
    }

    pub fn status(&self) -> CacheStatus {
        let state = self.state.lock();
        if state.flight.is_some() {
            CacheStatus::Fetching
        } else if state.fresh(Instant::now()).is_some() {
            CacheStatus::Valid
        } else if state.value.is_some() {
            CacheStatus::Expired
        } else {
            CacheStatus::Empty
        }
    }

    /// Number of fetches started since creation.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

/// Completes the flight even if the fetch unwinds, so waiters never hang.
struct FlightGuard<'a, T> {
    cache: &'a SingleFlightCache<T>,
    flight: Arc<Flight<T>>,
    completed: bool,
}

impl<T> FlightGuard<'_, T> {
    fn complete(mut self, outcome: FetchOutcome<T>) -> FetchOutcome<T> {
        self.completed = true;
        self.cache.finish(&self.flight, outcome)
    }
}

impl<T> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        if !self.completed {
            warn!("Governance rules fetch aborted");
            let _ = self
                .cache
                .finish(&self.flight, Err(VerificationError::FetchAborted));
        }
    }
}
