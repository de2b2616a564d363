// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Bounded undo/redo history.
//!
//! Each image keeps its own history of marker snapshots. Once the limit is
//! reached the oldest snapshot is discarded first.

use crate::config::MAX_HISTORY;
use std::collections::VecDeque;

/// History system for undo/redo functionality.
#[derive(Debug, Clone)]
pub struct History<T> {
    /// Undo stack (past states, oldest at the front)
    undo_stack: VecDeque<T>,
    /// Redo stack (future states after undo)
    redo_stack: Vec<T>,
    /// Maximum history size
    max_size: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

impl<T> History<T> {
    /// Create a history holding at most `max_size` states (never more than
    /// [`MAX_HISTORY`], never fewer than one).
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_size: max_size.clamp(1, MAX_HISTORY),
        }
    }

    /// Save current state before making a change
    pub fn push(&mut self, state: T) {
        self.undo_stack.push_back(state);
        while self.undo_stack.len() > self.max_size {
            self.undo_stack.pop_front();
        }
        // Clear redo stack when new action is performed
        self.redo_stack.clear();
    }

    /// Undo: restore previous state
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    /// Redo: restore next state
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    /// Retained undo states, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.undo_stack.iter()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
