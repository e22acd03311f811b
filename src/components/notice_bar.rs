//! Notice Bar Component
//!
//! Visible notifications for failures of detached calls (a create fired
//! from the input, an optimistic toggle, a delete). Keeps the latest
//! `capacity` notices; older ones are evicted.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeLevel::Warning => write!(f, "warning"),
            NoticeLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub at: DateTime<Local>,
    pub level: NoticeLevel,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.at.format("%H:%M:%S"), self.level, self.message)
    }
}

struct NoticeState {
    notices: VecDeque<Notice>,
    capacity: usize,
}

/// Shared handle; clones post to the same bar
#[derive(Clone)]
pub struct NoticeBar(Rc<RefCell<NoticeState>>);

impl NoticeBar {
    pub fn new(capacity: usize) -> Self {
        Self(Rc::new(RefCell::new(NoticeState {
            notices: VecDeque::with_capacity(capacity.min(16)),
            capacity: capacity.max(1),
        })))
    }

    pub fn post(&self, level: NoticeLevel, message: impl Into<String>) {
        let mut state = self.0.borrow_mut();
        if state.notices.len() == state.capacity {
            state.notices.pop_front();
        }
        state.notices.push_back(Notice {
            at: Local::now(),
            level,
            message: message.into(),
        });
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.post(NoticeLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.post(NoticeLevel::Error, message);
    }

    /// Oldest first
    pub fn notices(&self) -> Vec<Notice> {
        self.0.borrow().notices.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<Notice> {
        self.0.borrow().notices.back().cloned()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().notices.is_empty()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().notices.clear();
    }
}

impl Default for NoticeBar {
    fn default() -> Self {
        Self::new(5)
    }
}
