use serde::{Deserialize, Serialize};

use crate::types::ProcessingStep;

/// Pushed to `/api/events` subscribers as the studio moves between steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StudioEvent {
    Step { step: ProcessingStep },
    Analyzed { description: String },
    StylesSuggested { count: usize },
    Generated { history_id: String, details: usize },
    Alert { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged() {
        let json = serde_json::to_value(StudioEvent::Step { step: ProcessingStep::Analyzing }).unwrap();
        assert_eq!(json["type"], "step");
        assert_eq!(json["step"], "analyzing");
    }
}
