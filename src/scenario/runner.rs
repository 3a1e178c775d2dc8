use crate::pages::PageModel;
use crate::scenario::{Scenario, ScenarioReport, SuiteReport};
use chrono::Utc;
use std::time::Instant;
use tracing::{info, warn};

/// Runs scenarios in order over one page model and one browser session.
pub struct SuiteRunner<P: PageModel> {
    scenarios: Vec<Box<dyn Scenario<P>>>,
    filter: Option<String>,
}

impl<P: PageModel> SuiteRunner<P> {
    pub fn new() -> Self {
        Self {
            scenarios: Vec::new(),
            filter: None,
        }
    }

    pub fn register<S: Scenario<P> + 'static>(&mut self, scenario: S) {
        self.scenarios.push(Box::new(scenario));
    }

    pub fn with<S: Scenario<P> + 'static>(mut self, scenario: S) -> Self {
        self.register(scenario);
        self
    }

    /// Only run scenarios whose name contains `filter`.
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.filter(|f| !f.is_empty());
        self
    }

    fn selected(&self) -> impl Iterator<Item = &dyn Scenario<P>> + '_ {
        self.scenarios
            .iter()
            .map(|s| s.as_ref())
            .filter(|s| match &self.filter {
                Some(filter) => s.name().contains(filter.as_str()),
                None => true,
            })
    }

    /// `(name, description)` of every scenario the filter lets through.
    pub fn list(&self) -> Vec<(String, String)> {
        self.selected()
            .map(|s| (s.name().to_string(), s.description().to_string()))
            .collect()
    }

    /// Reset the page before each scenario, then tear the session down once.
    ///
    /// A failed reset fails only the scenario it precedes.
    pub async fn run(&self, page: &mut P) -> SuiteReport {
        let mut report = SuiteReport::new();
        info!(run_id = %report.run_id, "suite started");

        for scenario in self.selected() {
            let started_at = Utc::now();
            let start = Instant::now();

            let outcome = match page.reset().await {
                Ok(()) => scenario.run(page).await,
                Err(e) => Err(e),
            };
            let elapsed = start.elapsed().as_millis() as u64;

            let result = match outcome {
                Ok(()) => {
                    info!(scenario = scenario.name(), elapsed_ms = elapsed, "passed");
                    ScenarioReport::passed(scenario.name(), scenario.description(), started_at)
                }
                Err(e) => {
                    warn!(scenario = scenario.name(), error = %e, "failed");
                    ScenarioReport::failed(
                        scenario.name(),
                        scenario.description(),
                        started_at,
                        e.to_string(),
                    )
                }
            };
            report.push(result.with_duration(elapsed));
        }

        if let Err(e) = page.teardown().await {
            warn!(error = %e, "teardown failed");
        }
        report.finish();
        info!(
            passed = report.passed(),
            failed = report.failed(),
            "suite finished"
        );
        report
    }
}

impl<P: PageModel> Default for SuiteRunner<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{CheckError, Result};
    use async_trait::async_trait;

    #[derive(Default)]
    struct CountingPage {
        resets: u32,
        teardowns: u32,
        fail_reset_at: Option<u32>,
        visited: Vec<String>,
    }

    #[async_trait]
    impl PageModel for CountingPage {
        async fn reset(&mut self) -> Result<()> {
            self.resets += 1;
            if self.fail_reset_at == Some(self.resets) {
                return Err(CheckError::NavigationFailed("start page down".to_string()));
            }
            Ok(())
        }

        async fn teardown(&mut self) -> Result<()> {
            self.teardowns += 1;
            Ok(())
        }
    }

    struct Step {
        name: &'static str,
        pass: bool,
    }

    #[async_trait]
    impl Scenario<CountingPage> for Step {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "records its visit"
        }

        async fn run(&self, page: &mut CountingPage) -> Result<()> {
            page.visited.push(self.name.to_string());
            if self.pass {
                Ok(())
            } else {
                Err(CheckError::AssertionMismatch {
                    context: self.name.to_string(),
                    expected: "x".to_string(),
                    actual: "y".to_string(),
                })
            }
        }
    }

    fn runner() -> SuiteRunner<CountingPage> {
        SuiteRunner::new()
            .with(Step {
                name: "logo_visa",
                pass: true,
            })
            .with(Step {
                name: "logo_belkart",
                pass: false,
            })
            .with(Step {
                name: "block_title",
                pass: true,
            })
    }

    #[tokio::test]
    async fn resets_each_scenario_and_tears_down_once() {
        let mut page = CountingPage::default();
        let report = runner().run(&mut page).await;

        assert_eq!(page.resets, 3);
        assert_eq!(page.teardowns, 1);
        assert_eq!(page.visited, ["logo_visa", "logo_belkart", "block_title"]);
        assert_eq!(report.passed(), 2);
        assert!(!report.get("logo_belkart").unwrap().passed);
        assert!(report.finished_at.is_some());
    }

    #[tokio::test]
    async fn failed_reset_fails_only_that_scenario() {
        let mut page = CountingPage {
            fail_reset_at: Some(1),
            ..Default::default()
        };
        let report = runner().run(&mut page).await;

        let first = report.get("logo_visa").unwrap();
        assert!(!first.passed);
        assert!(first.failure.as_deref().unwrap().contains("start page down"));
        assert_eq!(page.visited, ["logo_belkart", "block_title"]);
        assert!(report.get("block_title").unwrap().passed);
    }

    #[tokio::test]
    async fn filter_selects_by_name_substring() {
        let runner = runner().with_filter(Some("logo".to_string()));
        let names: Vec<String> = runner.list().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["logo_visa", "logo_belkart"]);

        let mut page = CountingPage::default();
        let report = runner.run(&mut page).await;
        assert_eq!(report.results.len(), 2);
        assert_eq!(page.teardowns, 1);
    }
}
