use serde::Serialize;

/// Palette state of one question in the navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigatorStatus {
    Current,
    Marked,
    Attempted,
    Pending,
}

impl NavigatorStatus {
    /// Precedence: current, then marked, then attempted, else pending.
    #[must_use]
    pub fn resolve(is_current: bool, is_marked: bool, is_answered: bool) -> Self {
        if is_current {
            Self::Current
        } else if is_marked {
            Self::Marked
        } else if is_answered {
            Self::Attempted
        } else {
            Self::Pending
        }
    }
}

/// Aggregated view of attempt progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionProgress {
    pub total: usize,
    pub attempted: usize,
    pub marked: usize,
    pub percent: f64,
}

impl SessionProgress {
    #[must_use]
    pub fn new(total: usize, attempted: usize, marked: usize) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            attempted as f64 / total as f64 * 100.0
        };
        Self {
            total,
            attempted,
            marked,
            percent,
        }
    }

    /// Whole-number percentage for progress bars.
    #[must_use]
    pub fn percent_rounded(&self) -> u32 {
        self.percent.round() as u32
    }
}
