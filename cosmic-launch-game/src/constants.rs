//! Centralized balance and tuning constants for Cosmic Launch.
//!
//! These values define the default stake, scoring, and flight choreography.
//! Runtime overrides go through [`crate::config::GameConfig`]; the constants
//! here are only the defaults it falls back to.

// Account ------------------------------------------------------------------
/// Starting stake in cents (1000.00 RS).
pub const STARTING_BALANCE_CENTS: i64 = 100_000;
/// Wager preselected when a session starts, in cents.
pub const DEFAULT_WAGER_CENTS: i64 = 10_000;
/// Score awarded for a hit and removed for a miss.
pub const SCORE_STEP: i64 = 100;
/// Whole-credit bet presets offered next to the all-in option.
pub const BET_OPTIONS: [i64; 5] = [10, 50, 100, 500, 1000];

// Flight choreography --------------------------------------------------------
/// Transit time before the first decoy appears.
pub const CRUISE_MS: u64 = 800;
/// How long each decoy body stays on screen.
pub const DECOY_PASS_MS: u64 = 600;
/// Blank interval after each decoy leaves.
pub const DECOY_GAP_MS: u64 = 100;
/// Approach time between the impact reveal and the explosion.
pub const IMPACT_MS: u64 = 700;
/// Time the explosion settles before the result is committed.
pub const SETTLE_MS: u64 = 1_200;
/// Number of distinct decoy bodies flown past each round.
pub const DECOY_COUNT: usize = 2;

// Narration ------------------------------------------------------------------
/// Extra time a narration still in flight at commit may take to replace the fallback.
pub const LATE_NARRATION_GRACE_MS: u64 = 3_000;
/// Currency tag used in narration text.
pub const CURRENCY_TAG: &str = "RS";

// Rng domains ---------------------------------------------------------------
pub(crate) const RNG_DOMAIN_OUTCOME: &[u8] = b"outcome";
pub(crate) const RNG_DOMAIN_CHOREOGRAPHY: &[u8] = b"choreography";
