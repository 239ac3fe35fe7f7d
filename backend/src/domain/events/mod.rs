//! Event aggregate with its tickets and teams.

mod event;
mod team;
mod ticket;

pub use event::{Event, EventMode, EventValidationError, TeamSizeBounds};
pub use team::{Team, TeamValidationError};
pub use ticket::{Ticket, TicketCode, TicketStatus};
