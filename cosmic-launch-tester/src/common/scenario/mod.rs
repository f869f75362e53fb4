use anyhow::Result;

pub mod catalog;

/// Inputs handed to each scenario iteration.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioCtx {
    pub seed: u64,
    pub iteration: usize,
}

/// A named check against the round engine. Returns a one-line summary on success.
pub type ScenarioCheck = fn(&ScenarioCtx) -> Result<String>;

#[derive(Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: &'static str,
    check: ScenarioCheck,
}

impl TestScenario {
    #[must_use]
    pub const fn new(key: &'static str, name: &'static str, check: ScenarioCheck) -> Self {
        Self { key, name, check }
    }

    pub fn run(&self, ctx: &ScenarioCtx) -> Result<String> {
        (self.check)(ctx)
    }
}

impl std::fmt::Debug for TestScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestScenario")
            .field("key", &self.key)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let key = match name.to_lowercase().as_str() {
        "smoke" => "smoke",
        "forced-win" | "win" => "forced-win",
        "forced-loss" | "loss" => "forced-loss",
        "insufficient-funds" | "funds" => "insufficient-funds",
        "refill" => "refill",
        "bankrupt-clamp" | "clamp" => "bankrupt-clamp",
        "narration-outage" | "narration" => "narration-outage",
        "abort-midflight" | "abort" => "abort-midflight",
        "determinism" | "deterministic" => "determinism",
        "round-trip" | "roundtrip" => "round-trip",
        "realtime-driver" | "realtime" => "realtime-driver",
        _ => return None,
    };
    catalog::catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.key == key)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog::catalog_scenarios()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.name))
        .collect()
}
