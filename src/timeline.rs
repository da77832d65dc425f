use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const BUILTIN: &str = include_str!("timeline.yaml");

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, utoipa::ToSchema)]
pub struct Milestone {
    pub date: NaiveDate,
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    pub milestones: Vec<Milestone>,
}

impl Timeline {
    pub fn builtin() -> Result<Self, TimelineError> {
        Self::from_str(BUILTIN)
    }

    pub fn from_file(path: &Path) -> Result<Self, TimelineError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses a YAML list of milestones and orders it by date.
    pub fn from_str(yaml: &str) -> Result<Self, TimelineError> {
        let mut milestones: Vec<Milestone> = serde_yaml::from_str(yaml)?;
        milestones.sort_by_key(|m| m.date);
        Ok(Self { milestones })
    }

    /// Builtin list unless `path` is given.
    pub fn load(path: Option<&Path>) -> Result<Self, TimelineError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    pub fn len(&self) -> usize {
        self.milestones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.milestones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_parses_in_order() {
        let timeline = Timeline::builtin().unwrap();
        assert!(timeline.len() >= 10);
        assert!(timeline
            .milestones
            .windows(2)
            .all(|w| w[0].date <= w[1].date));
        assert_eq!(timeline.milestones[0].title, "Zarya launched");
    }

    #[test]
    fn custom_list_is_sorted() {
        let yaml = r#"
- date: 2020-01-02
  title: later
  detail: b
- date: 2019-06-01
  title: earlier
  detail: a
"#;
        let timeline = Timeline::from_str(yaml).unwrap();
        assert_eq!(timeline.milestones[0].title, "earlier");
    }

    #[test]
    fn empty_list_is_empty() {
        let timeline = Timeline::from_str("[]").unwrap();
        assert!(timeline.is_empty());
        assert_eq!(timeline.len(), 0);
    }

    #[test]
    fn bad_date_is_rejected() {
        let yaml = "- date: yesterday\n  title: x\n  detail: y\n";
        assert!(matches!(
            Timeline::from_str(yaml),
            Err(TimelineError::Yaml(_))
        ));
    }
}
