//! Trouble-ticket table: `sid,failure_type`.

use std::collections::HashMap;
use std::fmt;

use dt_common::ServerId;
use serde::{Deserialize, Serialize};

use super::csv::read_table;
use super::{IngestError, ParseOutcome, RejectedRecord};

/// Outcome recorded on a server's trouble ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum FailureType {
    #[default]
    Unknown,
    Correctable,
    #[serde(rename = "System failure")]
    SystemFailure,
    Uncorrectable,
}

impl FailureType {
    /// Ticket codes: 1 uncorrectable, 2 correctable, 3 system failure.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => FailureType::Uncorrectable,
            2 => FailureType::Correctable,
            3 => FailureType::SystemFailure,
            _ => FailureType::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FailureType::Uncorrectable => "Uncorrectable",
            FailureType::Correctable => "Correctable",
            FailureType::SystemFailure => "System failure",
            FailureType::Unknown => "Unknown",
        }
    }

    /// Severity order for collapsing several tickets of one server.
    fn severity(&self) -> u8 {
        match self {
            FailureType::Unknown => 0,
            FailureType::Correctable => 1,
            FailureType::SystemFailure => 2,
            FailureType::Uncorrectable => 3,
        }
    }
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One parsed ticket row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub sid: ServerId,
    pub failure_type: FailureType,
}

/// Most severe ticket outcome per server.
#[derive(Debug, Clone, Default)]
pub struct TicketIndex {
    by_server: HashMap<ServerId, FailureType>,
}

impl TicketIndex {
    pub fn from_tickets(tickets: impl IntoIterator<Item = Ticket>) -> Self {
        let mut by_server: HashMap<ServerId, FailureType> = HashMap::new();
        for ticket in tickets {
            let slot = by_server.entry(ticket.sid).or_default();
            if ticket.failure_type.severity() > slot.severity() {
                *slot = ticket.failure_type;
            }
        }
        TicketIndex { by_server }
    }

    pub fn failure_type(&self, sid: &ServerId) -> FailureType {
        self.by_server.get(sid).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_server.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_server.is_empty()
    }
}

/// Parse ticket CSV content. A blank `failure_type` means `Unknown`.
pub fn parse_tickets_content(file: &str, content: &str) -> Result<ParseOutcome<Ticket>, IngestError> {
    let (header, records) = read_table(file, content)?;
    let sid = header.require("sid")?;
    let failure_type = header.require("failure_type")?;

    let mut outcome = ParseOutcome::default();
    for record in &records {
        let parsed = record.get(sid, "sid").and_then(|s| {
            let kind = match record.fields.get(failure_type).map(String::as_str) {
                None | Some("") => FailureType::Unknown,
                Some(_) => FailureType::from_code(record.get_i64(failure_type, "failure_type")?),
            };
            Ok(Ticket {
                sid: ServerId::new(s),
                failure_type: kind,
            })
        });
        match parsed {
            Ok(ticket) => outcome.records.push(ticket),
            Err(reason) => outcome.rejected.push(RejectedRecord {
                file: file.to_string(),
                line: record.line,
                reason,
            }),
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_failure_types() {
        assert_eq!(FailureType::from_code(1), FailureType::Uncorrectable);
        assert_eq!(FailureType::from_code(2), FailureType::Correctable);
        assert_eq!(FailureType::from_code(3), FailureType::SystemFailure);
        assert_eq!(FailureType::from_code(7), FailureType::Unknown);
        assert_eq!(FailureType::SystemFailure.to_string(), "System failure");
    }

    #[test]
    fn most_severe_ticket_wins() {
        let content = "sid,failure_type\nsrv1,2\nsrv1,1\nsrv1,3\nsrv2,\nsrv3,2\n";
        let outcome = parse_tickets_content("tickets.csv", content).unwrap();
        assert!(outcome.rejected.is_empty());
        let index = TicketIndex::from_tickets(outcome.records);
        assert_eq!(index.failure_type(&ServerId::new("srv1")), FailureType::Uncorrectable);
        assert_eq!(index.failure_type(&ServerId::new("srv2")), FailureType::Unknown);
        assert_eq!(index.failure_type(&ServerId::new("srv3")), FailureType::Correctable);
        assert_eq!(index.failure_type(&ServerId::new("absent")), FailureType::Unknown);
    }

    #[test]
    fn non_numeric_failure_type_is_rejected() {
        let content = "sid,failure_type\nsrv1,boom\n";
        let outcome = parse_tickets_content("tickets.csv", content).unwrap();
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].line, 2);
    }
}
