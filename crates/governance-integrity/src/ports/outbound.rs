//! # Outbound Ports (Driven Ports / SPI)
//!
//! Transport collaborators this core depends on. HTTP, authentication and
//! retry policy all live behind these traits.

use shared_types::{ApproveRequestsDto, GovernanceRulesDto, TransportError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-fetch context handed to the rules source.
///
/// Carries the deadline of the caller that started the fetch, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchContext {
    pub deadline: Option<Instant>,
}

impl FetchContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Time left before the deadline; `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|r| r.is_zero())
    }
}

/// Source of the signed governance rules resource.
///
/// Failures are transient and surface to every caller waiting on the fetch.
pub trait GovernanceRulesSource: Send + Sync {
    fn fetch_governance_rules(
        &self,
        context: &FetchContext,
    ) -> Result<GovernanceRulesDto, TransportError>;
}

impl<S: GovernanceRulesSource + ?Sized> GovernanceRulesSource for Arc<S> {
    fn fetch_governance_rules(
        &self,
        context: &FetchContext,
    ) -> Result<GovernanceRulesDto, TransportError> {
        (**self).fetch_governance_rules(context)
    }
}

/// Sink for signed request approvals.
pub trait ApprovalSubmitter: Send + Sync {
    /// Submit one approval covering every listed request ID.
    fn submit_approval(&self, approval: &ApproveRequestsDto) -> Result<(), TransportError>;
}

impl<A: ApprovalSubmitter + ?Sized> ApprovalSubmitter for Arc<A> {
    fn submit_approval(&self, approval: &ApproveRequestsDto) -> Result<(), TransportError> {
        (**self).submit_approval(approval)
    }
}
