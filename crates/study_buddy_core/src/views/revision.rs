//! Revision view: an in-memory reminder list. Never touches the gateway.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::ViewError;
use crate::domain::{Priority, Reminder};

#[derive(Debug, Clone, Default, Serialize)]
pub struct RevisionView {
    reminders: Vec<Reminder>,
}

impl RevisionView {
    pub fn new() -> Self {
        Self::default()
    }

    /// The starter list shown on a fresh launch.
    pub fn with_sample_reminders() -> Self {
        let now = Utc::now();
        let sample = |topic: &str, completed: bool, priority: Priority| Reminder {
            id: Uuid::new_v4(),
            topic: topic.to_string(),
            due_date: now,
            completed,
            priority,
        };
        Self {
            reminders: vec![
                sample("Calculus: Chain Rule", false, Priority::High),
                sample("French Vocabulary: Food", true, Priority::Medium),
                sample("React Hooks basics", false, Priority::Medium),
            ],
        }
    }

    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn active(&self) -> impl Iterator<Item = &Reminder> {
        self.reminders.iter().filter(|r| !r.completed)
    }

    pub fn completed_count(&self) -> usize {
        self.reminders.iter().filter(|r| r.completed).count()
    }

    /// `round(100 * completed / total)`, or 0 for an empty list.
    pub fn completion_percent(&self) -> u32 {
        let total = self.reminders.len();
        if total == 0 {
            return 0;
        }
        let completed = self.completed_count();
        ((200 * completed + total) / (2 * total)) as u32
    }

    /// Prepends a reminder due today. Blank topics are ignored.
    pub fn add(&mut self, topic: &str) -> Option<&Reminder> {
        if topic.trim().is_empty() {
            return None;
        }
        self.reminders.insert(
            0,
            Reminder {
                id: Uuid::new_v4(),
                topic: topic.to_string(),
                due_date: Utc::now(),
                completed: false,
                priority: Priority::Medium,
            },
        );
        self.reminders.first()
    }

    pub fn toggle(&mut self, id: Uuid) -> Result<&Reminder, ViewError> {
        let reminder = self
            .reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ViewError::NotFound(id))?;
        reminder.completed = !reminder.completed;
        Ok(&*reminder)
    }
}
