//! Prioritized action checklist

use serde::{Deserialize, Serialize};
use std::fmt;

use domain_audit::{Finding, Severity};

/// Longest checklist handed to the consumer
pub const MAX_CHECKLIST_ITEMS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    High,
    Medium,
    Low,
}

impl ActionPriority {
    fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Critical | Severity::High => ActionPriority::High,
            Severity::Warn => ActionPriority::Medium,
            Severity::Low | Severity::Info => ActionPriority::Low,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ActionPriority::High => "HIGH",
            ActionPriority::Medium => "MEDIUM",
            ActionPriority::Low => "LOW",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub priority: ActionPriority,
    pub action: String,
}

impl fmt::Display for ChecklistItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.priority.tag(), self.action)
    }
}

/// Flattens every finding's recommended actions.
///
/// Higher priority actions come first, findings keep their order within a
/// priority, an action already listed is not repeated and the list stops at
/// [`MAX_CHECKLIST_ITEMS`].
pub fn build_checklist(findings: &[Finding]) -> Vec<ChecklistItem> {
    let mut items: Vec<ChecklistItem> = Vec::new();

    for priority in [ActionPriority::High, ActionPriority::Medium, ActionPriority::Low] {
        let actions = findings
            .iter()
            .filter(|f| ActionPriority::for_severity(f.severity) == priority)
            .flat_map(|f| f.recommended_actions.iter());

        for action in actions {
            if items.len() == MAX_CHECKLIST_ITEMS {
                return items;
            }
            if items.iter().any(|i| &i.action == action) {
                continue;
            }
            items.push(ChecklistItem {
                priority,
                action: action.clone(),
            });
        }
    }

    items
}
