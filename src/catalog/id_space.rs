//! The enumerable ID space scanned for categories

use crate::config::ExplorerConfig;

/// A finite range `1..=upper_bound` rendered as `PREFIX` + zero-padded digits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSpace {
    prefix: String,
    width: usize,
    upper_bound: u32,
}

impl IdSpace {
    pub fn new(prefix: impl Into<String>, width: usize, upper_bound: u32) -> Self {
        Self {
            prefix: prefix.into(),
            width,
            upper_bound,
        }
    }

    pub fn from_config(config: &ExplorerConfig) -> Self {
        Self::new(config.id_prefix.clone(), config.id_width, config.upper_bound)
    }

    pub fn upper_bound(&self) -> u32 {
        self.upper_bound
    }

    /// Renders the category ID for a numeric position, e.g. 7 -> "MLA0007"
    pub fn category_id(&self, n: u32) -> String {
        format!("{}{:0width$}", self.prefix, n, width = self.width)
    }

    /// Parses a category ID back to its numeric position
    pub fn parse(&self, category_id: &str) -> Option<u32> {
        let digits = category_id.strip_prefix(&self.prefix)?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// First ID to explore given the last persisted position
    pub fn start_after(&self, last_explored_id: Option<u32>) -> u32 {
        last_explored_id.map_or(1, |last| last.saturating_add(1))
    }

    /// Whether `from_id` is an accepted resume point (`1 <= from_id < upper_bound`)
    pub fn accepts_resume_point(&self, from_id: i64) -> bool {
        from_id >= 1 && from_id < i64::from(self.upper_bound)
    }

    /// Rounded percentage of the space covered, capped at 100
    pub fn progress_percent(&self, last_explored_id: u32) -> u8 {
        let percent = (f64::from(last_explored_id) / f64::from(self.upper_bound) * 100.0).round();
        percent.min(100.0) as u8
    }
}
