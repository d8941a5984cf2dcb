//! Per-action busy tracking.
//!
//! A control stays busy from the moment its action starts until the action
//! has finished, successfully or not. Starting the same action twice is
//! refused without touching the network.

use crate::domain::FileType;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Search,
    Load,
    Refresh,
    Upload(FileType),
    Delete(String),
    Submit,
    ReviewFile(String),
    MarkComplete,
    AdminDelete(String),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Search => write!(f, "Search"),
            Action::Load => write!(f, "Loading"),
            Action::Refresh => write!(f, "Refresh"),
            Action::Upload(file_type) => write!(f, "Upload of {}", file_type),
            Action::Delete(id) | Action::AdminDelete(id) => write!(f, "Deletion of file {}", id),
            Action::Submit => write!(f, "Submission"),
            Action::ReviewFile(id) => write!(f, "Review of file {}", id),
            Action::MarkComplete => write!(f, "Completion"),
        }
    }
}

#[derive(Debug, Default)]
pub struct InFlight {
    running: HashSet<Action>,
}

impl InFlight {
    /// Marks `action` as running. Returns `false` when it already was.
    pub fn begin(&mut self, action: &Action) -> bool {
        self.running.insert(action.clone())
    }

    pub fn finish(&mut self, action: &Action) {
        self.running.remove(action);
    }

    pub fn is_busy(&self, action: &Action) -> bool {
        self.running.contains(action)
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_begin_is_refused_until_finished() {
        let mut in_flight = InFlight::default();
        assert!(in_flight.begin(&Action::Submit));
        assert!(!in_flight.begin(&Action::Submit));
        assert!(in_flight.is_busy(&Action::Submit));

        in_flight.finish(&Action::Submit);
        assert!(in_flight.is_idle());
        assert!(in_flight.begin(&Action::Submit));
    }

    #[test]
    fn test_actions_are_tracked_independently() {
        let mut in_flight = InFlight::default();
        assert!(in_flight.begin(&Action::Upload(FileType::Media)));
        assert!(in_flight.begin(&Action::Upload(FileType::PassportApplication)));
        assert!(in_flight.begin(&Action::Delete("f1".to_string())));
        assert!(!in_flight.begin(&Action::Delete("f1".to_string())));
        assert!(in_flight.begin(&Action::Delete("f2".to_string())));
    }
}
