//! Request orchestration: expected goals, scoreline matrix, value check,
//! decision gate, and full market assembly for promoted picks.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::error::EngineError;
use super::expected_goals::{self, ContextFlags, ExpectedGoals};
use super::markets::{self, OutcomeProbs, Side};
use super::scoreline::{ScorelineMatrix, DEFAULT_MAX_GOALS};
use super::value::{self, MarketOdds, ValueReport};

/// Minimum best edge for a pick to be promoted.
pub const MIN_EDGE: f64 = 0.05;
/// Best edge below this marks the market as efficient.
pub const EFFICIENCY_THRESHOLD: f64 = 0.03;
/// Dixon-Coles correlation defaults, by fixture intensity.
pub const RHO_BASE: f64 = 0.02;
pub const RHO_HIGH_INTENSITY: f64 = 0.05;
/// Longest-price warning thresholds for home/away picks and for the draw.
const UNDERDOG_ODDS_LIMIT: f64 = 2.80;
const UNDERDOG_ODDS_LIMIT_DRAW: f64 = 3.50;

const SKIP_REASON: &str = "Edge < 5% (no value)";
const PICK_REMARK: &str = "Final Pick (Edge ≥ 5%)";

/// Engine tunables, normally filled from the service configuration.
#[derive(Debug, Clone, Copy)]
pub struct EngineParams {
    pub league_avg_goals: f64,
    pub max_goals: usize,
    pub min_edge: f64,
    pub efficiency_threshold: f64,
    pub rho_base: f64,
    pub rho_high_intensity: f64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            league_avg_goals: 2.6,
            max_goals: DEFAULT_MAX_GOALS,
            min_edge: MIN_EDGE,
            efficiency_threshold: EFFICIENCY_THRESHOLD,
            rho_base: RHO_BASE,
            rho_high_intensity: RHO_HIGH_INTENSITY,
        }
    }
}

impl EngineParams {
    fn rho_for(&self, ctx: &ContextFlags) -> f64 {
        if ctx.high_intensity {
            self.rho_high_intensity
        } else {
            self.rho_base
        }
    }
}

/// Explicit goal-expectancy override; bypasses the league-average prior.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LambdaOverride {
    pub home: f64,
    pub away: f64,
}

fn default_side_lines() -> Vec<f64> {
    vec![0.5, 1.5]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TeamGoalLines {
    pub home: Vec<f64>,
    pub away: Vec<f64>,
}

impl Default for TeamGoalLines {
    fn default() -> Self {
        Self {
            home: default_side_lines(),
            away: default_side_lines(),
        }
    }
}

fn default_league() -> String {
    "Unknown".to_string()
}

fn default_home() -> String {
    "Home".to_string()
}

fn default_away() -> String {
    "Away".to_string()
}

fn default_ou_lines() -> Vec<f64> {
    vec![1.5, 2.5, 3.5]
}

fn default_correct_scores() -> Vec<(usize, usize)> {
    vec![(1, 0), (2, 0), (2, 1)]
}

/// One analysis request. Every field except the odds quote has a usable
/// default so thin callers can post just the prices.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default = "default_league")]
    pub league: String,
    #[serde(default = "default_home")]
    pub home: String,
    #[serde(default = "default_away")]
    pub away: String,
    #[serde(default)]
    pub odds: MarketOdds,
    #[serde(default)]
    pub context: ContextFlags,
    #[serde(default)]
    pub expected_goals: Option<LambdaOverride>,
    #[serde(default = "default_ou_lines")]
    pub ou_lines: Vec<f64>,
    #[serde(default)]
    pub team_goal_lines: TeamGoalLines,
    #[serde(default = "default_correct_scores")]
    pub correct_scores: Vec<(usize, usize)>,
}

/// Probability-, fair-odds- or edge-valued mapping over the 1X2 outcomes,
/// serialized under the conventional outcome codes.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OutcomeTable<T: Serialize> {
    #[serde(rename = "1")]
    pub home: T,
    #[serde(rename = "X")]
    pub draw: T,
    #[serde(rename = "2")]
    pub away: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct WinnerRow {
    pub outcome: &'static str,
    #[serde(rename = "Poisson%")]
    pub poisson_pct: f64,
    #[serde(rename = "DixonColes%")]
    pub dixon_coles_pct: f64,
    #[serde(rename = "FairOdds")]
    pub fair_odds: Option<f64>,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WinnerModeTable {
    pub rows: Vec<WinnerRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValueModeTable {
    pub implied_percent: OutcomeTable<f64>,
    pub true_percent: OutcomeTable<f64>,
    pub fair_odds: OutcomeTable<Option<f64>>,
    pub edge_percent_points: OutcomeTable<f64>,
    pub efficient: bool,
    pub best_edge_sel: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Alignment {
    pub wm_best: &'static str,
    pub vm_best: &'static str,
    pub wm_equals_vm: bool,
    pub edge_best_pp: f64,
    pub remark: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Audit {
    pub parameters_ok: bool,
    pub formula_ok: bool,
    pub ev_sim: f64,
    pub calibration_note: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedResult {
    pub sport: &'static str,
    pub league: String,
    pub home: String,
    pub away: String,
    pub status: &'static str,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalPickResult {
    pub sport: &'static str,
    pub league: String,
    pub home: String,
    pub away: String,
    pub markets: Map<String, Value>,
    pub winner_mode_table: WinnerModeTable,
    pub value_mode_table: ValueModeTable,
    pub alignment: Alignment,
    pub audit: Audit,
    pub status: &'static str,
    pub remark: &'static str,
    pub warnings: Vec<String>,
}

/// Terminal analysis outcome. A skipped request carries no market tables,
/// so the two shapes serialize as distinct objects rather than one struct
/// full of nulls.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Skipped(SkippedResult),
    FinalPick(Box<FinalPickResult>),
}

impl AnalysisResult {
    pub fn status(&self) -> &'static str {
        match self {
            AnalysisResult::Skipped(_) => "SKIPPED",
            AnalysisResult::FinalPick(_) => "FINAL_PICK",
        }
    }
}

fn round_dp(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn pct2(p: f64) -> f64 {
    round_dp(p * 100.0, 2)
}

fn pct4(p: f64) -> f64 {
    round_dp(p * 100.0, 4)
}

/// Market-key rendering for a goals line. Whole-number lines carry one
/// decimal ("O2.0", not "O2") so keys stay stable however the caller wrote
/// the line; fractional lines keep their full precision ("O2.25").
fn fmt_line(line: f64) -> String {
    if line.fract() == 0.0 {
        format!("{line:.1}")
    } else {
        line.to_string()
    }
}

/// Per-unit-stake expectation for the chosen outcome. Note this is a
/// monetary expectation, not a probability, and its sign can disagree with
/// the probability-space edge that gated the pick; both are reported.
fn ev_simulation(prob: f64, odds: Option<f64>) -> f64 {
    match odds {
        Some(o) if o > 0.0 && prob > 0.0 => prob * (o - 1.0) - (1.0 - prob),
        _ => 0.0,
    }
}

fn underdog_warning(pick: &'static str, odds: &MarketOdds) -> Option<String> {
    let o1 = odds.home.unwrap_or(0.0);
    let ox = odds.draw.unwrap_or(0.0);
    let o2 = odds.away.unwrap_or(0.0);
    let warn = |label: &str| format!("MODEL_PICK_IS_MARKET_UNDERDOG: {label} has longest price.");
    match pick {
        "1" if o1 > ox.max(o2) && o1 > UNDERDOG_ODDS_LIMIT => Some(warn("Home")),
        "2" if o2 > o1.max(ox) && o2 > UNDERDOG_ODDS_LIMIT => Some(warn("Away")),
        "X" if ox > o1.max(o2) && ox > UNDERDOG_ODDS_LIMIT_DRAW => Some(warn("Draw")),
        _ => None,
    }
}

fn parameter_integrity(request: &AnalyzeRequest) -> bool {
    !request.home.is_empty() && !request.away.is_empty() && request.odds.any_quoted()
}

fn outcome_table(f: impl Fn(&str) -> f64) -> OutcomeTable<f64> {
    OutcomeTable {
        home: f("1"),
        draw: f("X"),
        away: f("2"),
    }
}

fn build_markets(matrix: &ScorelineMatrix, request: &AnalyzeRequest) -> Map<String, Value> {
    let probs = markets::one_x_two(matrix);
    let mut out = Map::new();

    out.insert(
        "1X2".into(),
        json!({ "1": pct2(probs.home), "X": pct2(probs.draw), "2": pct2(probs.away) }),
    );

    let (dc_1x, dc_12, dc_x2) = markets::double_chance(&probs);
    out.insert(
        "Double Chance".into(),
        json!({ "1X": pct2(dc_1x), "12": pct2(dc_12), "X2": pct2(dc_x2) }),
    );

    let (dnb_home, dnb_away) = markets::draw_no_bet(&probs);
    out.insert(
        "Draw No Bet".into(),
        json!({ "Home": pct2(dnb_home), "Away": pct2(dnb_away) }),
    );

    let mut ou = Map::new();
    for &line in &request.ou_lines {
        let (over, under) = markets::over_under(matrix, line);
        ou.insert(format!("O{}", fmt_line(line)), json!(pct2(over)));
        ou.insert(format!("U{}", fmt_line(line)), json!(pct2(under)));
    }
    out.insert("Over/Under".into(), Value::Object(ou));

    let (gg, ng) = markets::btts(matrix);
    out.insert("BTTS".into(), json!({ "Yes": pct2(gg), "No": pct2(ng) }));

    let mut tg_home = Map::new();
    for &line in &request.team_goal_lines.home {
        let p = markets::team_goals_over(matrix, Side::Home, line);
        tg_home.insert(format!("> {}", fmt_line(line)), json!(pct2(p)));
    }
    let mut tg_away = Map::new();
    for &line in &request.team_goal_lines.away {
        let p = markets::team_goals_over(matrix, Side::Away, line);
        tg_away.insert(format!("> {}", fmt_line(line)), json!(pct2(p)));
    }
    out.insert(
        "Team Goals".into(),
        json!({ "home": Value::Object(tg_home), "away": Value::Object(tg_away) }),
    );

    let mut combos = Map::new();
    for &line in &request.ou_lines {
        for code in ["1", "X", "2"] {
            let (with_over, with_under) = markets::result_total(matrix, code, line);
            combos.insert(format!("{code} & O{}", fmt_line(line)), json!(pct2(with_over)));
            combos.insert(format!("{code} & U{}", fmt_line(line)), json!(pct2(with_under)));
        }
    }
    out.insert("1X2 + O/U".into(), Value::Object(combos));

    let (dc1x_gg, dc12_gg, dcx2_gg) = markets::double_chance_btts(matrix);
    out.insert(
        "DC + BTTS".into(),
        json!({ "1X & GG": pct2(dc1x_gg), "X2 & GG": pct2(dcx2_gg), "12 & GG": pct2(dc12_gg) }),
    );

    let mut result_gg = Map::new();
    for code in ["1", "X", "2"] {
        result_gg.insert(
            format!("{code} & GG"),
            json!(pct2(markets::result_btts(matrix, code))),
        );
    }
    out.insert("Result + BTTS".into(), Value::Object(result_gg));

    let mut cs = Map::new();
    for &(h, a) in &request.correct_scores {
        cs.insert(
            format!("{h}:{a}"),
            json!(pct4(markets::correct_score(matrix, h, a))),
        );
    }
    out.insert("Correct Score".into(), Value::Object(cs));

    let (cs_home, cs_away) = markets::clean_sheet(matrix);
    out.insert(
        "Clean Sheet".into(),
        json!({ "Home Yes": pct2(cs_home), "Away Yes": pct2(cs_away) }),
    );

    let (wtn_home, wtn_away) = markets::win_to_nil(matrix);
    out.insert(
        "Win to Nil".into(),
        json!({ "Home": pct2(wtn_home), "Away": pct2(wtn_away) }),
    );

    let margin = markets::winning_margin(matrix);
    out.insert(
        "Winning Margin".into(),
        json!({
            "+1": pct2(margin.home_by_one),
            "+2": pct2(margin.home_by_two),
            "+3+": pct2(margin.home_by_three_plus),
            "-1": pct2(margin.away_by_one),
            "-2": pct2(margin.away_by_two),
            "-3+": pct2(margin.away_by_three_plus),
        }),
    );

    out
}

fn winner_mode_table(probs: &OutcomeProbs, eg: &ExpectedGoals) -> WinnerModeTable {
    let fair = |p: f64| (p > 0.0).then(|| round_dp(1.0 / p, 3));
    WinnerModeTable {
        rows: vec![
            WinnerRow {
                outcome: "1",
                poisson_pct: pct2(probs.home),
                dixon_coles_pct: pct2(probs.home),
                fair_odds: fair(probs.home),
                notes: format!("λ {:.2}-{:.2}; base priors", eg.home, eg.away),
            },
            WinnerRow {
                outcome: "X",
                poisson_pct: pct2(probs.draw),
                dixon_coles_pct: pct2(probs.draw),
                fair_odds: fair(probs.draw),
                notes: "DC low-score effect".to_string(),
            },
            WinnerRow {
                outcome: "2",
                poisson_pct: pct2(probs.away),
                dixon_coles_pct: pct2(probs.away),
                fair_odds: fair(probs.away),
                notes: "Away adjusted for context".to_string(),
            },
        ],
    }
}

fn value_mode_table(report: &ValueReport) -> ValueModeTable {
    ValueModeTable {
        implied_percent: outcome_table(|c| pct2(report.row(c).implied)),
        true_percent: outcome_table(|c| pct2(report.row(c).model)),
        fair_odds: OutcomeTable {
            home: report.home.fair_odds.map(|o| round_dp(o, 3)),
            draw: report.draw.fair_odds.map(|o| round_dp(o, 3)),
            away: report.away.fair_odds.map(|o| round_dp(o, 3)),
        },
        edge_percent_points: outcome_table(|c| pct2(report.row(c).edge)),
        efficient: report.efficient,
        best_edge_sel: report.best_selection,
    }
}

fn resolve_expected_goals(
    request: &AnalyzeRequest,
    params: &EngineParams,
) -> Result<ExpectedGoals, EngineError> {
    match request.expected_goals {
        Some(lambda) => {
            if !(lambda.home > 0.0) || !(lambda.away > 0.0) {
                return Err(EngineError::InvalidParameter(format!(
                    "expected goals must be positive, got {:.3}/{:.3}",
                    lambda.home, lambda.away
                )));
            }
            Ok(ExpectedGoals {
                home: lambda.home,
                away: lambda.away,
            })
        }
        None => Ok(expected_goals::estimate(
            params.league_avg_goals,
            &request.context,
        )),
    }
}

/// Runs one analysis request end to end.
///
/// Markets are only assembled for promoted picks; a skipped request exits
/// after the value check without touching the market layer.
pub fn analyze(request: &AnalyzeRequest, params: &EngineParams) -> Result<AnalysisResult, EngineError> {
    let eg = resolve_expected_goals(request, params)?;
    let rho = params.rho_for(&request.context);
    let matrix = ScorelineMatrix::build(eg.home, eg.away, params.max_goals, rho)?;
    let probs = markets::one_x_two(&matrix);
    let report = value::evaluate(&probs, &request.odds, params.efficiency_threshold);

    if report.best_edge < params.min_edge {
        return Ok(AnalysisResult::Skipped(SkippedResult {
            sport: "football",
            league: request.league.clone(),
            home: request.home.clone(),
            away: request.away.clone(),
            status: "SKIPPED",
            reason: SKIP_REASON,
        }));
    }

    let pick = report.best_selection;
    let mut warnings = Vec::new();
    if let Some(warning) = underdog_warning(pick, &request.odds) {
        warnings.push(warning);
    }

    let alignment = Alignment {
        wm_best: probs.best(),
        vm_best: pick,
        wm_equals_vm: probs.best() == pick,
        edge_best_pp: pct2(report.best_edge),
        remark: PICK_REMARK,
    };

    let audit = Audit {
        parameters_ok: parameter_integrity(request),
        formula_ok: true,
        ev_sim: round_dp(ev_simulation(probs.get(pick), request.odds.get(pick)), 4),
        calibration_note: format!("priors; DC rho={rho:.2}"),
    };

    Ok(AnalysisResult::FinalPick(Box::new(FinalPickResult {
        sport: "football",
        league: request.league.clone(),
        home: request.home.clone(),
        away: request.away.clone(),
        markets: build_markets(&matrix, request),
        winner_mode_table: winner_mode_table(&probs, &eg),
        value_mode_table: value_mode_table(&report),
        alignment,
        audit,
        status: "FINAL_PICK",
        remark: PICK_REMARK,
        warnings,
    })))
}
