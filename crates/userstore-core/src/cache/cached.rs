use chrono::{DateTime, Utc};

/// A cached value plus the moment it was last replaced.
///
/// `cached_at` is `None` until the first `replace`, which distinguishes
/// "never fetched" from "fetched and empty".
#[derive(Debug, Clone, Default)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CachedData<T> {
    /// Swap in a whole new value, returning the old one
    pub fn replace(&mut self, data: T) -> T {
        self.cached_at = Some(Utc::now());
        std::mem::replace(&mut self.data, data)
    }

    pub fn is_populated(&self) -> bool {
        self.cached_at.is_some()
    }

    pub fn age_minutes(&self) -> Option<i64> {
        self.cached_at.map(|at| (Utc::now() - at).num_minutes())
    }

    pub fn age_display(&self) -> String {
        let Some(minutes) = self.age_minutes() else {
            return "never".to_string();
        };
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                // Round up: 1h 30m+ becomes 2h
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}
