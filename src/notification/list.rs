use std::collections::VecDeque;

use super::types::BusinessNotification;

pub const DEFAULT_CAPACITY: usize = 10;

/// Outcome of [`NotificationList::push`].
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    Inserted { evicted: Option<BusinessNotification> },
    Duplicate,
}

/// Newest-first list holding at most `capacity` notifications.
#[derive(Debug, Clone)]
pub struct NotificationList {
    entries: VecDeque<BusinessNotification>,
    capacity: usize,
}

impl Default for NotificationList {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl NotificationList {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// Prepend `notification`, evicting the oldest entry on overflow. An id
    /// already held is rejected as a duplicate and the list is left untouched.
    pub fn push(&mut self, notification: BusinessNotification) -> PushOutcome {
        if self.contains(&notification.id) {
            return PushOutcome::Duplicate;
        }

        self.entries.push_front(notification);
        let evicted = if self.entries.len() > self.capacity {
            self.entries.pop_back()
        } else {
            None
        };
        PushOutcome::Inserted { evicted }
    }

    /// Flip `is_read` for the matching entry. Returns false when no entry
    /// matches or it was already read.
    pub fn mark_as_read(&mut self, id: &str) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) if !entry.is_read => {
                entry.is_read = true;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.is_read).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BusinessNotification> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<BusinessNotification> {
        self.entries.iter().cloned().collect()
    }
}
