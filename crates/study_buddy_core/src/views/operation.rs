//! Three-state tracking for one gateway-backed operation of a view.

use serde::{Serialize, Serializer};

use super::ViewError;

/// Identifies one dispatched call. Strictly increasing per operation.
pub type Ticket = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Status {
    #[default]
    Idle,
    InFlight { ticket: Ticket },
    Settled { succeeded: bool },
}

/// At most one call is in flight at a time; a second `begin` is rejected
/// rather than cancelling the first.
#[derive(Debug, Clone, Default)]
pub struct Operation {
    last_ticket: Ticket,
    status: Status,
}

impl Operation {
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.status, Status::InFlight { .. })
    }

    pub fn begin(&mut self) -> Result<Ticket, ViewError> {
        if self.is_in_flight() {
            return Err(ViewError::Busy);
        }
        self.last_ticket += 1;
        self.status = Status::InFlight {
            ticket: self.last_ticket,
        };
        Ok(self.last_ticket)
    }

    /// Returns `false` and leaves the status untouched when `ticket` is stale.
    pub fn settle(&mut self, ticket: Ticket, succeeded: bool) -> bool {
        match self.status {
            Status::InFlight { ticket: current } if current == ticket => {
                self.status = Status::Settled { succeeded };
                true
            }
            _ => false,
        }
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.status.serialize(serializer)
    }
}
