use anyhow::{Result, ensure};
use colored::Colorize;
use offcharts_game::{DailyPuzzle, Gateway, Variant, daily_puzzle, share_text};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::logic::ScriptedJudge;
use crate::remote::HttpScoreService;
use crate::scenario::{Scenario, ScenarioCtx};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub date_key: String,
    pub variant: Variant,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    /// Final totals of the successful iterations, in order.
    pub scores: Vec<u32>,
    /// SHA-256 over the share texts of the successful iterations.
    pub fingerprint: String,
}

/// Where scores come from.
pub enum Backend {
    /// In-process gateway over a seeded scripted judge.
    Scripted,
    /// A running server.
    Http(HttpScoreService),
}

impl Backend {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Scripted => "logic",
            Self::Http(_) => "http",
        }
    }
}

/// Dates, variants and seeds one scenario is swept across.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub date_keys: Vec<String>,
    pub variants: Vec<Variant>,
    pub seed: u64,
    pub iterations: usize,
    pub save_dir: Option<PathBuf>,
}

pub struct ScenarioTester {
    backend: Backend,
    verbose: bool,
}

impl ScenarioTester {
    #[must_use]
    pub const fn new(backend: Backend, verbose: bool) -> Self {
        Self { backend, verbose }
    }

    #[must_use]
    pub const fn backend(&self) -> &Backend {
        &self.backend
    }

    pub async fn run_scenario(&self, scenario: &dyn Scenario, plan: &RunPlan) -> Vec<ScenarioResult> {
        let mut results = Vec::new();
        for date_key in &plan.date_keys {
            for &variant in &plan.variants {
                if self.verbose {
                    println!(
                        "🧪 Testing scenario: {} ({} {variant}, seed {})",
                        scenario.name().bright_white(),
                        date_key,
                        plan.seed
                    );
                }
                results.push(self.run_single(scenario, plan, date_key, variant).await);
            }
        }
        results
    }

    async fn resolve_puzzle(&self, date_key: &str, variant: Variant) -> Result<DailyPuzzle> {
        let local = daily_puzzle(date_key, variant);
        if let Backend::Http(service) = &self.backend
            && !date_key.starts_with("debug-")
        {
            let served = service.daily(variant, date_key).await?;
            ensure!(
                served == local,
                "server serves {:?} for {date_key} but the local calendar picks {:?}",
                served.adjectives,
                local.adjectives
            );
        }
        Ok(local)
    }

    async fn run_single(
        &self,
        scenario: &dyn Scenario,
        plan: &RunPlan,
        date_key: &str,
        variant: Variant,
    ) -> ScenarioResult {
        let mut result = ScenarioResult {
            scenario_name: scenario.name().to_string(),
            date_key: date_key.to_string(),
            variant,
            passed: false,
            iterations_run: plan.iterations,
            successful_iterations: 0,
            failures: Vec::new(),
            average_duration: Duration::ZERO,
            scores: Vec::new(),
            fingerprint: String::new(),
        };

        let puzzle = match self.resolve_puzzle(date_key, variant).await {
            Ok(puzzle) => puzzle,
            Err(err) => {
                result.failures.push(format!("Puzzle lookup failed: {err:#}"));
                return result;
            }
        };

        let mut hasher = Sha256::new();
        let mut durations = Vec::new();
        for i in 0..plan.iterations {
            let seed = plan.seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let mut ctx = ScenarioCtx::new(puzzle.clone(), seed);
            ctx.verbose = self.verbose;
            ctx.save_dir.clone_from(&plan.save_dir);

            let start_time = Instant::now();
            let outcome = match &self.backend {
                Backend::Scripted => {
                    let gateway = Gateway::new(ScriptedJudge::new(seed, scenario.judge()));
                    let outcome = scenario.play(&ctx, &gateway).await;
                    log::debug!(
                        "{} judge answered {} calls",
                        scenario.judge().label(),
                        gateway.generator().calls()
                    );
                    outcome
                }
                Backend::Http(service) => scenario.play(&ctx, service).await,
            };
            let duration = start_time.elapsed();

            match outcome {
                Ok(state) => {
                    result.successful_iterations += 1;
                    durations.push(duration);
                    hasher.update(share_text(&state).as_bytes());
                    hasher.update(b"\n");
                    result.scores.push(state.total_score());
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) score {}",
                            i + 1,
                            plan.iterations,
                            state.total_score()
                        );
                    }
                }
                Err(err) => {
                    let message = format!("Iteration {} (seed {seed}): {err:#}", i + 1);
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            plan.iterations,
                            message.clone().red()
                        );
                    }
                    log::warn!("{} {date_key} {variant}: {message}", scenario.key());
                    result.failures.push(message);
                }
            }
        }

        result.average_duration = if durations.is_empty() {
            Duration::ZERO
        } else {
            durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(1)
        };
        result.fingerprint = hex(&hasher.finalize());
        result.passed = result.failures.is_empty();
        result
    }
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::get_scenario;

    fn plan(date_keys: &[&str], variants: &[Variant], iterations: usize) -> RunPlan {
        RunPlan {
            date_keys: date_keys.iter().map(|s| (*s).to_string()).collect(),
            variants: variants.to_vec(),
            seed: 1337,
            iterations,
            save_dir: None,
        }
    }

    #[tokio::test]
    async fn smoke_passes_for_every_date_and_variant() {
        let tester = ScenarioTester::new(Backend::Scripted, false);
        let scenario = get_scenario("smoke").unwrap();
        let results = tester
            .run_scenario(
                scenario.as_ref(),
                &plan(&["2025-12-10-v1", "debug-a"], &[Variant::Pair, Variant::Grid], 2),
            )
            .await;
        assert_eq!(results.len(), 4);
        for result in &results {
            assert!(result.passed, "{result:?}");
            assert_eq!(result.successful_iterations, 2);
            assert_eq!(result.scores.len(), 2);
            assert_eq!(result.fingerprint.len(), 64);
        }
    }

    #[tokio::test]
    async fn fingerprints_repeat_for_the_same_seed() {
        let tester = ScenarioTester::new(Backend::Scripted, false);
        let scenario = get_scenario("appeal").unwrap();
        let sweep = plan(&["2026-02-02-v1"], &[Variant::Grid], 3);
        let first = tester.run_scenario(scenario.as_ref(), &sweep).await;
        let second = tester.run_scenario(scenario.as_ref(), &sweep).await;
        assert_eq!(first[0].fingerprint, second[0].fingerprint);
        assert_eq!(first[0].scores, second[0].scores);
    }

    #[test]
    fn results_serialize_durations_as_millis() {
        let result = ScenarioResult {
            scenario_name: "Smoke Test".into(),
            date_key: "2025-12-10-v1".into(),
            variant: Variant::Pair,
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(42),
            scores: vec![61],
            fingerprint: "ab".into(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 42);
        assert_eq!(json["variant"], "pair");
    }

    #[test]
    fn hex_is_lowercase_and_padded() {
        assert_eq!(hex(&[0x0a, 0xff]), "0aff");
    }
}
