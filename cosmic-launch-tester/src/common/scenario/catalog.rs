use anyhow::{Context, Result, anyhow, ensure};

use cosmic_launch_game::{
    AudioCue, CancellationToken, Catalog, Credits, CueLog, DestinationId, FallbackNarrator,
    GameConfig, GuardedNarrator, LaunchRejected, NarrationBackend, NarrationError, PlayerAccount,
    RoundMachine, RoundPhase, SequenceTimings, SilentDeck, run_flight,
};

use super::{ScenarioCtx, TestScenario};
use crate::common::fingerprint;

pub fn catalog_scenarios() -> Vec<TestScenario> {
    vec![
        TestScenario::new("smoke", "Smoke Test", smoke),
        TestScenario::new("forced-win", "Forced Win Payout", forced_win),
        TestScenario::new("forced-loss", "Forced Loss Payout", forced_loss),
        TestScenario::new(
            "insufficient-funds",
            "Insufficient Funds Guard",
            insufficient_funds,
        ),
        TestScenario::new("refill", "Bankrupt Refill", refill),
        TestScenario::new("bankrupt-clamp", "Balance Clamp at Zero", bankrupt_clamp),
        TestScenario::new(
            "narration-outage",
            "Narration Outage Fallback",
            narration_outage,
        ),
        TestScenario::new("abort-midflight", "Abort Mid-Flight", abort_midflight),
        TestScenario::new("determinism", "Seeded Replay Determinism", determinism),
        TestScenario::new("round-trip", "Selection Round Trip", round_trip),
        TestScenario::new("realtime-driver", "Real-Time Flight Driver", realtime_driver),
    ]
}

/// Backend that always fails with a rotating failure class.
struct OfflineBackend {
    iteration: usize,
}

impl NarrationBackend for OfflineBackend {
    fn generate(&self, _prompt: &str) -> Result<String, NarrationError> {
        Err(match self.iteration % 3 {
            0 => NarrationError::MissingCredentials,
            1 => NarrationError::EmptyResponse,
            _ => NarrationError::Unavailable("connection refused".to_string()),
        })
    }
}

fn session(balance: i64, seed: u64) -> RoundMachine {
    let config = GameConfig::default();
    let account = PlayerAccount::new(Credits::from_whole(balance));
    RoundMachine::new(Catalog::standard(), config, account, seed)
}

fn aim(machine: &mut RoundMachine, dest: DestinationId, wager: i64) -> Result<()> {
    ensure!(machine.select_destination(dest), "could not select {dest}");
    ensure!(
        machine.select_wager(Credits::from_whole(wager)),
        "could not wager {wager}"
    );
    Ok(())
}

fn pick(seed: u64, offset: u64) -> DestinationId {
    let idx = usize::try_from(seed.wrapping_add(offset) % 8).unwrap_or(0);
    DestinationId::ALL[idx]
}

fn smoke(ctx: &ScenarioCtx) -> Result<String> {
    let mut machine = RoundMachine::with_standard(ctx.seed);
    let dest = pick(ctx.seed, 0);
    aim(&mut machine, dest, 10)?;
    machine.launch().context("launch rejected")?;
    let mut deck = CueLog::new();
    let result = machine
        .run_round(&FallbackNarrator, &mut deck)
        .ok_or_else(|| anyhow!("round did not produce a result"))?;
    ensure!(machine.phase() == RoundPhase::Result, "round did not settle");
    ensure!(machine.rounds_played() == 1, "expected exactly one commit");
    ensure!(
        deck.cues
            == [
                AudioCue::Launch,
                AudioCue::StartCruiseLoop,
                AudioCue::StopCruiseLoop,
                AudioCue::Explosion
            ],
        "unexpected cue order {:?}",
        deck.cues
    );
    ensure!(result.outcome.won == (result.outcome.impact == dest), "won flag disagrees with impact");
    Ok(format!(
        "{dest} -> {} ({}), balance {}",
        result.outcome.impact,
        if result.outcome.won { "hit" } else { "miss" },
        machine.account().balance()
    ))
}

fn forced_win(ctx: &ScenarioCtx) -> Result<String> {
    let mut machine = session(1_000, ctx.seed);
    aim(&mut machine, DestinationId::Earth, 100)?;
    machine.launch_forced(DestinationId::Earth)?;
    let outcome = *machine
        .outcome()
        .ok_or_else(|| anyhow!("no outcome after launch"))?;
    ensure!(
        outcome.payout_delta == Credits::from_whole(20),
        "payout {} != 20.00",
        outcome.payout_delta
    );
    machine.run_round(&FallbackNarrator, &mut SilentDeck);
    let balance = machine.account().balance();
    ensure!(balance.to_string() == "1,020.00", "balance {balance}");
    ensure!(machine.account().score() == 100, "score {}", machine.account().score());
    Ok(format!("balance {balance}"))
}

fn forced_loss(ctx: &ScenarioCtx) -> Result<String> {
    let mut machine = session(1_000, ctx.seed);
    aim(&mut machine, DestinationId::Earth, 100)?;
    let impact = Catalog::standard()
        .others(DestinationId::Earth)
        .nth(ctx.iteration % 7)
        .map(|dest| dest.id)
        .ok_or_else(|| anyhow!("no alternative impact"))?;
    machine.launch_forced(impact)?;
    machine.run_round(&FallbackNarrator, &mut SilentDeck);
    let balance = machine.account().balance();
    ensure!(balance.to_string() == "900.00", "balance {balance}");
    ensure!(machine.account().score() == -100, "score {}", machine.account().score());
    Ok(format!("struck {impact}, balance {balance}"))
}

fn insufficient_funds(ctx: &ScenarioCtx) -> Result<String> {
    let mut machine = session(50, ctx.seed);
    let affordable: Vec<Credits> = machine
        .bet_options()
        .filter_map(|(amount, available)| available.then_some(amount))
        .collect();
    ensure!(
        affordable == [Credits::from_whole(10), Credits::from_whole(50)],
        "unexpected affordable presets {affordable:?}"
    );
    aim(&mut machine, pick(ctx.seed, 3), 100)?;
    match machine.launch() {
        Err(LaunchRejected::InsufficientFunds { wager, balance }) => {
            ensure!(machine.phase() == RoundPhase::Selection, "phase changed");
            ensure!(
                machine.account().balance() == Credits::from_whole(50),
                "balance changed"
            );
            Ok(format!("rejected {wager} against {balance}"))
        }
        other => Err(anyhow!("expected insufficient funds, got {other:?}")),
    }
}

fn refill(ctx: &ScenarioCtx) -> Result<String> {
    let mut machine = session(100, ctx.seed);
    ensure!(!machine.refill(), "refill accepted while solvent");
    ensure!(machine.select_destination(DestinationId::Mars), "select failed");
    ensure!(!machine.reset_to_selection(), "reset accepted during selection");
    ensure!(
        machine.selection() == Some(DestinationId::Mars),
        "selection lost before launch"
    );
    ensure!(machine.select_all_in(), "all-in rejected");
    machine.launch_forced(DestinationId::Venus)?;
    machine.tick(u64::MAX, &mut SilentDeck);
    ensure!(machine.phase() == RoundPhase::Result, "round did not settle");
    ensure!(machine.account().is_bankrupt(), "expected bankruptcy");
    ensure!(machine.reset_to_selection(), "reset rejected");
    ensure!(machine.refill(), "refill rejected while bankrupt");
    ensure!(
        machine.account().balance() == Credits::from_whole(1_000),
        "refill restored {}",
        machine.account().balance()
    );
    ensure!(machine.account().score() == 0, "score not cleared");
    Ok("refilled to 1,000.00".to_string())
}

fn bankrupt_clamp(ctx: &ScenarioCtx) -> Result<String> {
    let mut machine = session(300, ctx.seed);
    aim(&mut machine, DestinationId::Saturn, 300)?;
    machine.launch_forced(DestinationId::Neptune)?;
    machine.tick(u64::MAX, &mut SilentDeck);
    let balance = machine.account().balance();
    ensure!(balance == Credits::ZERO, "balance {balance} not clamped");
    Ok(format!("balance {balance}"))
}

fn narration_outage(ctx: &ScenarioCtx) -> Result<String> {
    let mut machine = RoundMachine::with_standard(ctx.seed);
    aim(&mut machine, pick(ctx.seed, 5), 10)?;
    machine.launch()?;
    let narrator = GuardedNarrator::new(OfflineBackend {
        iteration: ctx.iteration,
    });
    let result = machine
        .run_round(&narrator, &mut SilentDeck)
        .ok_or_else(|| anyhow!("no result despite outage"))?;
    ensure!(machine.phase() == RoundPhase::Result, "phase {:?}", machine.phase());
    ensure!(!result.narration.trim().is_empty(), "empty fallback narration");
    Ok(result.narration)
}

fn abort_midflight(ctx: &ScenarioCtx) -> Result<String> {
    let mut machine = RoundMachine::with_standard(ctx.seed);
    aim(&mut machine, pick(ctx.seed, 1), 100)?;
    machine.launch()?;
    let total = machine.config().timings.total_ms(machine.config().decoy_count);
    let cut = ctx.seed % total;
    let mut deck = CueLog::new();
    machine.tick(cut, &mut deck);
    ensure!(machine.abort_flight(&mut deck), "abort refused");
    ensure!(!deck.cruise_looping, "cruise loop still playing");
    ensure!(machine.phase() == RoundPhase::Selection, "phase {:?}", machine.phase());
    ensure!(
        machine.account().balance() == Credits::from_whole(1_000),
        "aborted round touched the account"
    );
    ensure!(machine.rounds_played() == 0, "aborted round counted");
    Ok(format!("aborted at {cut}ms"))
}

fn play_session(seed: u64, rounds: u64) -> Result<u64> {
    let mut machine = RoundMachine::with_standard(seed);
    let mut outcomes = Vec::new();
    for round in 0..rounds {
        aim(&mut machine, pick(seed, round), 10)?;
        machine.launch()?;
        outcomes.push((machine.outcome().copied(), machine.decoys().to_vec()));
        machine.tick(u64::MAX, &mut SilentDeck);
        machine.reset_to_selection();
    }
    fingerprint(&(outcomes, machine.account().balance(), machine.account().score()))
}

fn determinism(ctx: &ScenarioCtx) -> Result<String> {
    let first = play_session(ctx.seed, 25)?;
    let second = play_session(ctx.seed, 25)?;
    ensure!(first == second, "replay diverged: {first:016x} vs {second:016x}");
    Ok(format!("fingerprint {first:016x}"))
}

fn round_trip(ctx: &ScenarioCtx) -> Result<String> {
    let mut machine = RoundMachine::with_standard(ctx.seed);
    aim(&mut machine, pick(ctx.seed, 2), 10)?;
    machine.launch()?;
    ensure!(machine.phase() == RoundPhase::Launching, "not launching");
    machine.tick(u64::MAX, &mut SilentDeck);
    ensure!(machine.phase() == RoundPhase::Result, "not at result");
    ensure!(machine.reset_to_selection(), "reset refused");
    ensure!(machine.selection().is_none(), "selection survived reset");
    ensure!(machine.outcome().is_none(), "outcome survived reset");
    Ok("selection -> launching -> result -> selection".to_string())
}

fn realtime_driver(ctx: &ScenarioCtx) -> Result<String> {
    let config = GameConfig {
        timings: SequenceTimings {
            cruise_ms: 2,
            decoy_pass_ms: 2,
            decoy_gap_ms: 1,
            impact_ms: 2,
            settle_ms: 2,
        },
        late_narration_grace_ms: 5,
        ..GameConfig::default()
    };
    let account = PlayerAccount::new(config.starting_balance);
    let mut machine = RoundMachine::new(Catalog::standard(), config, account, ctx.seed);
    aim(&mut machine, pick(ctx.seed, 4), 10)?;
    machine.launch()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building flight runtime")?;
    let mut deck = CueLog::new();
    let mut events = 0usize;
    let report = runtime.block_on(run_flight(
        &mut machine,
        &FallbackNarrator,
        &mut deck,
        &CancellationToken::new(),
        |_, _| events += 1,
    ));
    ensure!(report.committed && !report.cancelled, "flight report {report:?}");
    ensure!(machine.phase() == RoundPhase::Result, "phase {:?}", machine.phase());
    ensure!(!deck.cruise_looping, "cruise loop left running");
    ensure!(
        machine.result().is_some_and(|result| !result.narration.is_empty()),
        "missing narration"
    );
    Ok(format!("{events} events, late narration: {}", report.narration_late))
}
