//! Headless self-play harness for game balance work.
//!
//! Runs bot-vs-bot matches and collects metrics for balance evaluation.

use hyperroll_protocol::{Event, PlayerId};
use serde::{Deserialize, Serialize};

use crate::{
    game::{GameConfig, GameEngine, GameError},
    rules::RulesSource,
};

/// Configuration for self-play simulation.
#[derive(Clone, Debug)]
pub struct SelfPlayConfig {
    /// Random seed for determinism.
    pub seed: u64,
    /// Maximum rounds before declaring the richer player the winner.
    pub max_rounds: u32,
    /// Character data ids for the two seats.
    pub characters: [String; 2],
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_rounds: 300,
            characters: ["civilian".into(), "civilian".into()],
        }
    }
}

/// How a self-play match ended.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatchOutcome {
    /// One player could not cover an owed tax.
    Bankruptcy { winner: u8 },
    /// Round limit reached, winner by money.
    MoneyVictory { winner: u8, money: Vec<i64> },
    /// Round limit reached with equal money.
    Draw,
}

/// Metrics collected during a self-play match.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MatchMetrics {
    /// Total rounds played.
    pub rounds_played: u32,
    /// Per-player statistics.
    pub player_stats: Vec<PlayerStats>,
    /// Decisive duels (a winner moved).
    pub duels_resolved: u32,
    /// Tied duels (nobody moved).
    pub duels_tied: u32,
    /// Taxes actually transferred.
    pub taxes_paid: u32,
    /// Total money that changed hands through taxes.
    pub tax_volume: i64,
    /// Buildings placed on empty tiles.
    pub buildings_built: u32,
    /// Upgrade purchases (including free ones).
    pub buildings_upgraded: u32,
    /// Chance cards drawn.
    pub cards_drawn: u32,
    /// Doom cascades triggered.
    pub doom_cascades: u32,
    /// Ascensions triggered.
    pub ascensions: u32,
    /// Highest stage reached.
    pub final_stage: u8,
    /// Whether the match ended in bankruptcy.
    pub ended_by_bankruptcy: bool,
}

/// Per-player statistics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player_id: u8,
    /// Character data id for this seat.
    pub character: String,
    /// Duels won.
    pub duel_wins: u32,
    /// Special (doubles) wins.
    pub special_wins: u32,
    /// Taxes collected from the opponent.
    pub taxes_collected: u32,
    /// Money received through taxes.
    pub tax_income: i64,
    /// Buildings placed.
    pub buildings_built: u32,
    /// Chance cards drawn.
    pub cards_drawn: u32,
    /// Blessings received (including redirects).
    pub blessings_gained: u32,
    /// Curses received (including redirects).
    pub curses_suffered: u32,
    /// Completed laps past own Go.
    pub laps_completed: u32,
    /// Final money.
    pub final_money: i64,
    /// Final owned-tile count.
    pub final_properties: u32,
}

/// Result of a self-play match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelfPlayResult {
    /// Seed used for this match.
    pub seed: u64,
    /// How the match ended.
    pub outcome: MatchOutcome,
    /// Collected metrics.
    pub metrics: MatchMetrics,
    /// Duration in milliseconds (wall clock).
    pub duration_ms: u64,
}

/// Batch self-play results.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchSelfPlayResult {
    /// Number of matches played.
    pub games_played: u32,
    /// Individual match results.
    pub results: Vec<SelfPlayResult>,
    /// Aggregated metrics for balance evaluation.
    pub aggregate: AggregateMetrics,
}

/// Aggregated metrics across multiple matches.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AggregateMetrics {
    /// Average match length in rounds.
    pub avg_game_length: f64,
    /// Standard deviation of match length.
    pub game_length_std: f64,
    /// Win rate per seat (should be ~equal for balanced matchups).
    pub win_rates: Vec<f64>,
    /// Win rate balance score (1.0 = perfectly balanced).
    pub win_rate_balance: f64,
    /// Fraction of matches ending in bankruptcy.
    pub bankruptcy_rate: f64,
    /// Average taxes paid per match.
    pub avg_taxes: f64,
    /// Average buildings built per match.
    pub avg_buildings: f64,
    /// Average cards drawn per match.
    pub avg_cards: f64,
}

/// Run a single self-play match with both seats on the greedy bot policy.
pub fn run_selfplay(config: &SelfPlayConfig) -> Result<SelfPlayResult, GameError> {
    let start = std::time::Instant::now();

    let game_config = GameConfig {
        seed: config.seed,
        characters: config.characters.clone(),
        bots: [true, true],
    };
    let mut engine = GameEngine::new(&game_config, RulesSource::Embedded)?;

    let mut metrics = MatchMetrics {
        player_stats: (0..2u8)
            .map(|i| PlayerStats {
                player_id: i,
                character: config.characters[i as usize].clone(),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    };

    while !engine.is_over() && engine.state().round <= config.max_rounds {
        let events = engine.tick();
        if events.is_empty() {
            // Both seats are bots; an empty tick means the engine stalled.
            break;
        }
        for event in &events {
            process_event_for_metrics(event, &mut metrics);
        }
    }

    metrics.rounds_played = engine.state().round.saturating_sub(1);
    metrics.final_stage = engine.state().stage;
    metrics.ended_by_bankruptcy = engine.is_over();
    finalize_player_stats(&engine, &mut metrics);

    let outcome = match engine.winner() {
        Some(winner) => MatchOutcome::Bankruptcy { winner: winner.0 },
        None => {
            let money: Vec<i64> = engine.state().players.iter().map(|p| p.money).collect();
            if money[0] == money[1] {
                MatchOutcome::Draw
            } else {
                let winner = if money[0] > money[1] { 0 } else { 1 };
                MatchOutcome::MoneyVictory { winner, money }
            }
        }
    };

    Ok(SelfPlayResult {
        seed: config.seed,
        outcome,
        metrics,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Run multiple self-play matches with consecutive seeds.
pub fn run_batch_selfplay(
    config: &SelfPlayConfig,
    num_games: u32,
) -> Result<BatchSelfPlayResult, GameError> {
    let mut results = Vec::with_capacity(num_games as usize);

    for i in 0..num_games {
        let mut game_config = config.clone();
        game_config.seed = config.seed.wrapping_add(i as u64);
        results.push(run_selfplay(&game_config)?);
    }

    let aggregate = compute_aggregate_metrics(&results);

    Ok(BatchSelfPlayResult {
        games_played: num_games,
        results,
        aggregate,
    })
}

/// Process an event to update metrics.
fn process_event_for_metrics(event: &Event, metrics: &mut MatchMetrics) {
    match event {
        Event::DuelResolved {
            winner,
            is_special_win,
            ..
        } => {
            metrics.duels_resolved += 1;
            if let Some(stats) = metrics.player_stats.get_mut(winner.0 as usize) {
                stats.duel_wins += 1;
                if *is_special_win {
                    stats.special_wins += 1;
                }
            }
        }
        Event::DuelTied { .. } => {
            metrics.duels_tied += 1;
        }
        Event::DuelForfeited { winner, .. } => {
            metrics.duels_resolved += 1;
            if let Some(stats) = metrics.player_stats.get_mut(winner.0 as usize) {
                stats.duel_wins += 1;
            }
        }
        Event::TaxPaid {
            receiver, credited, ..
        } => {
            metrics.taxes_paid += 1;
            metrics.tax_volume += credited;
            if let Some(stats) = metrics.player_stats.get_mut(receiver.0 as usize) {
                stats.taxes_collected += 1;
                stats.tax_income += credited;
            }
        }
        Event::BuildingBuilt { player, .. } => {
            metrics.buildings_built += 1;
            if let Some(stats) = metrics.player_stats.get_mut(player.0 as usize) {
                stats.buildings_built += 1;
            }
        }
        Event::BuildingUpgraded { .. } => {
            metrics.buildings_upgraded += 1;
        }
        Event::CardDrawn { player, .. } => {
            metrics.cards_drawn += 1;
            if let Some(stats) = metrics.player_stats.get_mut(player.0 as usize) {
                stats.cards_drawn += 1;
            }
        }
        Event::BlessingGranted { player, .. } => {
            if let Some(stats) = metrics.player_stats.get_mut(player.0 as usize) {
                stats.blessings_gained += 1;
            }
        }
        Event::CurseInflicted { player, .. } => {
            if let Some(stats) = metrics.player_stats.get_mut(player.0 as usize) {
                stats.curses_suffered += 1;
            }
        }
        Event::PassedGo {
            player,
            laps_completed,
        } => {
            if let Some(stats) = metrics.player_stats.get_mut(player.0 as usize) {
                stats.laps_completed = *laps_completed;
            }
        }
        Event::DoomCascade { .. } => {
            metrics.doom_cascades += 1;
        }
        Event::Ascension { .. } => {
            metrics.ascensions += 1;
        }
        _ => {}
    }
}

/// Finalize player stats from the terminal state.
fn finalize_player_stats(engine: &GameEngine, metrics: &mut MatchMetrics) {
    let state = engine.state();
    for stats in metrics.player_stats.iter_mut() {
        let player_id = PlayerId(stats.player_id);
        let player = &state.players[player_id.index()];
        stats.final_money = player.money;
        stats.final_properties = state.board.tiles_owned_by(player_id).len() as u32;
    }
}

/// Compute aggregate metrics from batch results.
fn compute_aggregate_metrics(results: &[SelfPlayResult]) -> AggregateMetrics {
    if results.is_empty() {
        return AggregateMetrics::default();
    }

    let n = results.len() as f64;

    let lengths: Vec<f64> = results
        .iter()
        .map(|r| r.metrics.rounds_played as f64)
        .collect();
    let avg_length = lengths.iter().sum::<f64>() / n;
    let variance = lengths
        .iter()
        .map(|&l| (l - avg_length).powi(2))
        .sum::<f64>()
        / n;
    let std_length = variance.sqrt();

    let mut wins = [0u32; 2];
    let mut bankruptcies = 0u32;

    for result in results {
        match &result.outcome {
            MatchOutcome::Bankruptcy { winner } => {
                if let Some(w) = wins.get_mut(*winner as usize) {
                    *w += 1;
                }
                bankruptcies += 1;
            }
            MatchOutcome::MoneyVictory { winner, .. } => {
                if let Some(w) = wins.get_mut(*winner as usize) {
                    *w += 1;
                }
            }
            MatchOutcome::Draw => {}
        }
    }

    let win_rates: Vec<f64> = wins.iter().map(|&w| w as f64 / n).collect();

    // Win rate balance: 1 - max deviation from the expected 50%.
    let expected = 0.5;
    let max_deviation = win_rates
        .iter()
        .map(|&r| (r - expected).abs())
        .fold(0.0f64, f64::max);
    let win_rate_balance = 1.0 - (max_deviation / expected).min(1.0);

    let avg_taxes = results
        .iter()
        .map(|r| r.metrics.taxes_paid as f64)
        .sum::<f64>()
        / n;
    let avg_buildings = results
        .iter()
        .map(|r| r.metrics.buildings_built as f64)
        .sum::<f64>()
        / n;
    let avg_cards = results
        .iter()
        .map(|r| r.metrics.cards_drawn as f64)
        .sum::<f64>()
        / n;

    AggregateMetrics {
        avg_game_length: avg_length,
        game_length_std: std_length,
        win_rates,
        win_rate_balance,
        bankruptcy_rate: bankruptcies as f64 / n,
        avg_taxes,
        avg_buildings,
        avg_cards,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selfplay_completes() {
        let config = SelfPlayConfig {
            seed: 12345,
            max_rounds: 100,
            ..Default::default()
        };

        let result = run_selfplay(&config).expect("selfplay run");

        assert!(result.metrics.rounds_played > 0);
        assert!(result.metrics.rounds_played <= 100);
        assert!(result.metrics.duels_resolved + result.metrics.duels_tied > 0);
        println!("Match ran {} rounds", result.metrics.rounds_played);
        println!("Outcome: {:?}", result.outcome);
        println!("Duration: {}ms", result.duration_ms);
    }

    #[test]
    fn test_selfplay_is_deterministic() {
        let config = SelfPlayConfig {
            seed: 777,
            max_rounds: 80,
            characters: ["gambler".into(), "negotiator".into()],
        };

        let a = run_selfplay(&config).expect("first run");
        let b = run_selfplay(&config).expect("second run");

        assert_eq!(a.outcome, b.outcome);
        assert_eq!(a.metrics.rounds_played, b.metrics.rounds_played);
        assert_eq!(a.metrics.duels_resolved, b.metrics.duels_resolved);
        assert_eq!(
            a.metrics.player_stats[0].final_money,
            b.metrics.player_stats[0].final_money
        );
    }

    #[test]
    fn test_batch_selfplay() {
        let config = SelfPlayConfig {
            seed: 1000,
            max_rounds: 60,
            ..Default::default()
        };

        let batch = run_batch_selfplay(&config, 5).expect("batch run");

        assert_eq!(batch.games_played, 5);
        assert_eq!(batch.results.len(), 5);
        println!("Avg match length: {:.1}", batch.aggregate.avg_game_length);
        println!("Win rates: {:?}", batch.aggregate.win_rates);
        println!("Win rate balance: {:.2}", batch.aggregate.win_rate_balance);
    }
}
