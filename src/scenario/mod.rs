pub mod assert;
pub mod pay_section;
pub mod runner;

use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use assert::{expect_contains, expect_eq, expect_true};
pub use pay_section::pay_section_suite;
pub use runner::SuiteRunner;

/// One named check against a page model.
#[async_trait]
pub trait Scenario<P: Send>: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Drive the page and return the first failed expectation, if any.
    async fn run(&self, page: &mut P) -> Result<()>;
}

/// Outcome of a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub description: String,
    pub passed: bool,
    pub failure: Option<String>,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
}

impl ScenarioReport {
    pub fn passed(name: &str, description: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            passed: true,
            failure: None,
            duration_ms: 0,
            started_at,
        }
    }

    pub fn failed(
        name: &str,
        description: &str,
        started_at: DateTime<Utc>,
        failure: String,
    ) -> Self {
        Self {
            passed: false,
            failure: Some(failure),
            ..Self::passed(name, description, started_at)
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Outcome of one suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub results: Vec<ScenarioReport>,
}

impl SuiteReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, report: ScenarioReport) {
        self.results.push(report);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn get(&self, name: &str) -> Option<&ScenarioReport> {
        self.results.iter().find(|r| r.name == name)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for SuiteReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_serializes() {
        let now = Utc::now();
        let mut report = SuiteReport::new();
        report.push(ScenarioReport::passed("a", "first", now).with_duration(12));
        report.push(ScenarioReport::failed("b", "second", now, "boom".to_string()));
        report.finish();

        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.all_passed());
        assert_eq!(report.get("b").and_then(|r| r.failure.as_deref()), Some("boom"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["results"][0]["duration_ms"], 12);
        assert_eq!(json["results"][1]["passed"], false);
        assert!(json["finished_at"].is_string());
    }

    #[test]
    fn empty_suite_counts_as_passed() {
        assert!(SuiteReport::default().all_passed());
    }
}
