//! Dashboard view: the AI-generated daily plan.

use serde::Serialize;
use tracing::{error, warn};

use super::{Operation, Ticket, ViewError};
use crate::ports::PortResult;

pub const DEFAULT_PLAN_TOPICS: [&str; 3] = ["Calculus", "Organic Chemistry", "Literature Summary"];

pub const FALLBACK_PLAN: &str = "Error generating plan. Just focus on your core modules today!";

#[derive(Debug, Clone)]
pub struct PlanDispatch {
    pub ticket: Ticket,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    topics: Vec<String>,
    plan: Option<String>,
    #[serde(skip)]
    mounted: bool,
    #[serde(rename = "status")]
    operation: Operation,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self::with_topics(DEFAULT_PLAN_TOPICS.iter().map(|t| t.to_string()).collect())
    }
}

impl DashboardView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_topics(topics: Vec<String>) -> Self {
        Self {
            topics,
            plan: None,
            mounted: false,
            operation: Operation::default(),
        }
    }

    pub fn plan(&self) -> Option<&str> {
        self.plan.as_deref()
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Returns a dispatch the first time the dashboard is shown, `None` afterwards.
    pub fn mount(&mut self) -> Option<PlanDispatch> {
        if self.mounted {
            return None;
        }
        self.mounted = true;
        self.dispatch().ok()
    }

    /// Explicit user request for a fresh plan.
    pub fn regenerate(&mut self) -> Result<PlanDispatch, ViewError> {
        self.mounted = true;
        self.dispatch()
    }

    fn dispatch(&mut self) -> Result<PlanDispatch, ViewError> {
        let ticket = self.operation.begin()?;
        Ok(PlanDispatch {
            ticket,
            topics: self.topics.clone(),
        })
    }

    pub fn settle(&mut self, ticket: Ticket, result: PortResult<String>) -> bool {
        let (plan, succeeded) = match result {
            Ok(text) if !text.trim().is_empty() => (text, true),
            Ok(_) => {
                warn!("Daily plan came back empty");
                (FALLBACK_PLAN.to_string(), false)
            }
            Err(e) => {
                error!("Daily plan request failed: {}", e);
                (FALLBACK_PLAN.to_string(), false)
            }
        };

        if !self.operation.settle(ticket, succeeded) {
            warn!(ticket, "Discarding stale daily plan");
            return false;
        }
        self.plan = Some(plan);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortError;

    #[test]
    fn mount_dispatches_only_once() {
        let mut view = DashboardView::new();
        let dispatch = view.mount().unwrap();
        assert_eq!(
            dispatch.topics,
            vec!["Calculus", "Organic Chemistry", "Literature Summary"]
        );
        view.settle(dispatch.ticket, Ok("Step 1".to_string()));

        assert!(view.mount().is_none());
        assert_eq!(view.plan(), Some("Step 1"));
    }

    #[test]
    fn failure_substitutes_fallback_without_retrying() {
        let mut view = DashboardView::new();
        let dispatch = view.mount().unwrap();
        view.settle(
            dispatch.ticket,
            Err(PortError::Configuration("API key not found".to_string())),
        );

        assert_eq!(view.plan(), Some(FALLBACK_PLAN));
        assert!(view.mount().is_none());
    }

    #[test]
    fn regenerate_is_rejected_while_in_flight() {
        let mut view = DashboardView::new();
        let first = view.mount().unwrap();
        assert_eq!(view.regenerate().unwrap_err(), ViewError::Busy);

        view.settle(first.ticket, Ok("Plan A".to_string()));
        let second = view.regenerate().unwrap();
        view.settle(second.ticket, Ok("Plan B".to_string()));
        assert_eq!(view.plan(), Some("Plan B"));
    }
}
