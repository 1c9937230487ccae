use image::RgbaImage;
use std::collections::VecDeque;
use std::sync::Arc;

/// Number of raster states kept for undo.
pub const MAX_HISTORY: usize = 10;

// ============================================================================
// SNAPSHOT: one full raster state of the surface
// ============================================================================

/// Immutable copy of the whole surface at one point in time.
///
/// Dimensions travel with the pixels: AI replacements can change the surface
/// size, and undo has to restore it.
#[derive(Clone)]
pub struct Snapshot {
    pub description: String,
    pixels: Arc<RgbaImage>,
}

impl Snapshot {
    pub fn capture(description: impl Into<String>, pixels: &RgbaImage) -> Self {
        Self {
            description: description.into(),
            pixels: Arc::new(pixels.clone()),
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn memory_size(&self) -> usize {
        self.pixels.as_raw().len()
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (w, h) = self.dimensions();
        write!(f, "Snapshot({:?}, {}x{})", self.description, w, h)
    }
}

// ============================================================================
// HISTORY MANAGER: bounded stack, oldest evicted first
// ============================================================================

/// Bounded undo log. The back entry is always the current state; undo pops it
/// and hands back the new back entry for the caller to restore.
pub struct HistoryManager {
    stack: VecDeque<Snapshot>,
    max_history_size: usize,
    total_memory: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

impl HistoryManager {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            stack: VecDeque::with_capacity(max_history_size + 1),
            max_history_size: max_history_size.max(1),
            total_memory: 0,
        }
    }

    /// Append a state; drops the oldest entries beyond the cap.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.total_memory += snapshot.memory_size();
        self.stack.push_back(snapshot);
        self.prune();
    }

    /// Discard the current state and return the one to restore.
    /// `None` (and no change) when fewer than two states exist.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        if let Some(removed) = self.stack.pop_back() {
            self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
        }
        self.stack.back()
    }

    pub fn can_undo(&self) -> bool {
        self.stack.len() > 1
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.stack.back()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_history_size
    }

    /// Descriptions, most recent first
    pub fn descriptions(&self) -> Vec<String> {
        self.stack.iter().rev().map(|s| s.description.clone()).collect()
    }

    /// Bytes held by all snapshots (O(1) via cached total)
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.total_memory = 0;
    }

    fn prune(&mut self) {
        while self.stack.len() > self.max_history_size {
            if let Some(removed) = self.stack.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
            }
        }
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
