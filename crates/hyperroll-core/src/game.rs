use hyperroll_protocol::{
    BlessingType, BuildingTypeId, CharacterPassive, ChoiceKind, Command, CurseType, DiceMode,
    Event, GameOverReason, PlayerId, PowerUp, QuestKind, RpsIntent, Snapshot, SoundCue,
    TileKind,
};
use thiserror::Error;

use crate::board::Board;
use crate::cards::{self, EffectCtx};
use crate::dice::{self, DiceRoll};
use crate::duel::{self, DuelNote};
use crate::economy::{self, MAX_STAGE};
use crate::player::Player;
use crate::quest::{QuestLog, QuestUpdate};
use crate::rng::GameRng;
use crate::rules::{load_rules, CompiledRules, RulesError, RulesSource};

/// Duels per stage before the stage counter advances.
pub const DUELS_PER_STAGE: u32 = 10;

/// Stages whose arrival offers both players a power-up.
pub const POWER_UP_STAGES: [u8; 3] = [1, 3, 5];

/// What the Athlete earns per space moved, scaled by `stage + 1`.
const ATHLETE_PAY_PER_STEP: i64 = 5;

/// Lucky One win payout at stage 0; tripled on special wins, scaled by stage.
const LUCKY_WIN_BASE: i64 = 100;

/// Cadence blessing: every 5th duel pays `CADENCE_BASE * (stage + 1)`.
const CADENCE_PERIOD: u32 = 5;
const CADENCE_BASE: i64 = 100;

/// Power-up payouts.
const POWER_UP_MONEY_PER_STAGE: i64 = 200;
const POWER_UP_SPECIAL_BONUS_BP: i32 = 1_000;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("rules error: {0}")]
    Rules(#[from] RulesError),
    #[error("unknown character '{0}'")]
    UnknownCharacter(String),
    #[error("no choice is pending")]
    NothingPending,
    #[error("the pending choice belongs to the other player")]
    WrongPlayer,
    #[error("a {0:?} choice is pending, not this command")]
    WrongChoice(ChoiceKind),
    #[error("invalid choice: {0}")]
    InvalidChoice(String),
    #[error("the game is over")]
    GameOver,
}

/// Match setup. `characters` are data ids from the character roster;
/// `bots[i]` marks a seat the engine plays itself with the greedy policy.
#[derive(Clone, Debug)]
pub struct GameConfig {
    pub seed: u64,
    pub characters: [String; 2],
    pub bots: [bool; 2],
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            characters: ["civilian".into(), "civilian".into()],
            bots: [false, true],
        }
    }
}

/// All mutable match state. The rules stay outside so the whole thing can be
/// handed to card effects as one bundle of disjoint borrows.
#[derive(Clone, Debug)]
pub struct GameState {
    pub board: Board,
    pub players: [Player; 2],
    pub rng: GameRng,
    pub round: u32,
    pub stage: u8,
    pub duels_this_stage: u32,
    pub dice_mode: DiceMode,
    /// Whose dice are loaded while `dice_mode` is rigged; the size modes
    /// apply to both players.
    pub rigged_player: Option<PlayerId>,
    pub quests: QuestLog,
}

/// Where the engine is waiting, if anywhere. `Idle` means between rounds:
/// the next `tick` starts a round.
#[derive(Clone, Debug)]
pub enum TurnPhase {
    Idle,
    ChoosingRps {
        pending: [Option<RpsIntent>; 2],
    },
    AwaitBuild {
        player: PlayerId,
        tile: usize,
        options: Vec<BuildingTypeId>,
    },
    AwaitUpgrade {
        player: PlayerId,
        tile: usize,
        cost: i64,
        new_level: u8,
    },
    AwaitAthleteBonus {
        player: PlayerId,
    },
    AwaitBonusSteps {
        player: PlayerId,
        available: u32,
    },
    AwaitCardAck {
        player: PlayerId,
    },
    AwaitPowerUp {
        pending: Vec<PlayerId>,
    },
    GameOver {
        winner: PlayerId,
    },
}

impl TurnPhase {
    fn choice_kind(&self) -> Option<ChoiceKind> {
        match self {
            TurnPhase::ChoosingRps { .. } => Some(ChoiceKind::Rps),
            TurnPhase::AwaitBuild { .. } => Some(ChoiceKind::Build),
            TurnPhase::AwaitUpgrade { .. } => Some(ChoiceKind::Upgrade),
            TurnPhase::AwaitAthleteBonus { .. } => Some(ChoiceKind::AthleteBonus),
            TurnPhase::AwaitBonusSteps { .. } => Some(ChoiceKind::BonusSteps),
            TurnPhase::AwaitCardAck { .. } => Some(ChoiceKind::CardAck),
            TurnPhase::AwaitPowerUp { .. } => Some(ChoiceKind::PowerUp),
            TurnPhase::Idle | TurnPhase::GameOver { .. } => None,
        }
    }
}

/// One decided duel's movement schedule: winner first, then loser, each by
/// their own dice sum. Suspensions park this until the answering command.
#[derive(Clone, Debug)]
struct MovePlan {
    order: [PlayerId; 2],
    sums: [u8; 2],
    mover: usize,
    stage: MoveStage,
    extra_steps: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MoveStage {
    AthleteOffer,
    StrideOffer,
    Step,
    TileEffect,
}

/// The rules engine: owns the compiled rules and the match state, consumes
/// `Command`s, and emits `Event`s. All randomness comes from the seeded RNG
/// in the state, so a `(config, command sequence)` pair replays exactly.
pub struct GameEngine {
    rules: CompiledRules,
    state: GameState,
    phase: TurnPhase,
    plan: Option<MovePlan>,
    bots: [bool; 2],
}

impl GameEngine {
    pub fn new(config: &GameConfig, source: RulesSource<'_>) -> Result<Self, GameError> {
        let rules = load_rules(source)?;
        let board = Board::standard();
        let mut seat = |id: PlayerId| -> Result<Player, GameError> {
            let data_id = &config.characters[id.index()];
            let character = rules
                .character_id(data_id)
                .ok_or_else(|| GameError::UnknownCharacter(data_id.clone()))?;
            let mut player = Player::new(id, character, &rules);
            player.path_position = board.go_index(id);
            Ok(player)
        };
        let players = [seat(PlayerId(0))?, seat(PlayerId(1))?];
        Ok(Self {
            rules,
            state: GameState {
                board,
                players,
                rng: GameRng::seed_from_u64(config.seed),
                round: 1,
                stage: 0,
                duels_this_stage: 0,
                dice_mode: DiceMode::Normal,
                rigged_player: None,
                quests: QuestLog::default(),
            },
            phase: TurnPhase::Idle,
            plan: None,
            bots: config.bots,
        })
    }

    pub fn rules(&self) -> &CompiledRules {
        &self.rules
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn phase(&self) -> &TurnPhase {
        &self.phase
    }

    pub fn path_length(&self) -> usize {
        self.state.board.path_length()
    }

    pub fn tile_at(&self, index: usize) -> Option<&crate::board::Tile> {
        self.state.board.tile_at(index)
    }

    pub fn tiles_owned_by(&self, player: PlayerId) -> Vec<usize> {
        self.state.board.tiles_owned_by(player)
    }

    pub fn buildable_empty_tiles(&self) -> Vec<usize> {
        self.state.board.buildable_empty_tiles()
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, TurnPhase::GameOver { .. })
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.phase {
            TurnPhase::GameOver { winner } => Some(winner),
            _ => None,
        }
    }

    /// Which choice the engine is waiting on, and whose it is.
    pub fn pending_choice(&self) -> Option<(ChoiceKind, PlayerId)> {
        let kind = self.phase.choice_kind()?;
        let player = match &self.phase {
            TurnPhase::ChoosingRps { pending } => {
                PlayerId(pending.iter().position(|p| p.is_none())? as u8)
            }
            TurnPhase::AwaitBuild { player, .. }
            | TurnPhase::AwaitUpgrade { player, .. }
            | TurnPhase::AwaitAthleteBonus { player }
            | TurnPhase::AwaitBonusSteps { player, .. }
            | TurnPhase::AwaitCardAck { player } => *player,
            TurnPhase::AwaitPowerUp { pending } => *pending.first()?,
            _ => return None,
        };
        Some((kind, player))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            round: self.state.round,
            stage: self.state.stage,
            duels_this_stage: self.state.duels_this_stage,
            dice_mode: self.state.dice_mode,
            rigged_player: self.state.rigged_player,
            tiles: self.state.board.snapshot(),
            players: self.state.players.iter().map(Player::snapshot).collect(),
        }
    }

    /// Advance the game when nothing is pending: starts the next round and
    /// drives it as far as bot play allows. A no-op while waiting on a human
    /// choice or after game over.
    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if matches!(self.phase, TurnPhase::Idle) && self.plan.is_none() {
            self.begin_round(&mut events);
        }
        events
    }

    /// Apply a command, logging and swallowing rejections.
    pub fn apply_command(&mut self, command: Command) -> Vec<Event> {
        match self.try_apply_command(command) {
            Ok(events) => events,
            Err(err) => vec![Event::LogMessage {
                text: format!("rejected command: {err}"),
            }],
        }
    }

    /// Apply a command if it answers the pending choice; reject it otherwise
    /// without touching the state.
    pub fn try_apply_command(&mut self, command: Command) -> Result<Vec<Event>, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        let mut events = Vec::new();
        let phase = std::mem::replace(&mut self.phase, TurnPhase::Idle);
        match (phase, command) {
            (TurnPhase::ChoosingRps { mut pending }, Command::ChooseRps { player, intent }) => {
                if player.index() >= 2 || self.bots[player.index()] || pending[player.index()].is_some() {
                    self.phase = TurnPhase::ChoosingRps { pending };
                    return Err(GameError::WrongPlayer);
                }
                pending[player.index()] = Some(intent);
                self.phase = TurnPhase::ChoosingRps { pending };
                self.maybe_resolve_rps(&mut events);
            }
            (
                TurnPhase::AwaitBuild {
                    player,
                    tile,
                    options,
                },
                Command::Build { building },
            ) => {
                if !options.contains(&building) {
                    self.phase = TurnPhase::AwaitBuild {
                        player,
                        tile,
                        options,
                    };
                    return Err(GameError::InvalidChoice("building not offered".into()));
                }
                self.do_build(player, tile, building, &mut events);
                self.run_movement(&mut events);
            }
            (TurnPhase::AwaitBuild { .. }, Command::PassBuild) => {
                self.run_movement(&mut events);
            }
            (
                TurnPhase::AwaitUpgrade {
                    player,
                    tile,
                    cost,
                    new_level,
                },
                Command::RespondUpgrade { accept },
            ) => {
                if accept {
                    self.do_upgrade(player, tile, cost, new_level, &mut events);
                }
                self.run_movement(&mut events);
            }
            (TurnPhase::AwaitAthleteBonus { player }, Command::RespondAthleteBonus { accept }) => {
                if accept {
                    self.athlete_sprint(player, &mut events);
                }
                self.run_movement(&mut events);
            }
            (
                TurnPhase::AwaitBonusSteps { player, available },
                Command::SpendBonusSteps { steps },
            ) => {
                if steps > available {
                    self.phase = TurnPhase::AwaitBonusSteps { player, available };
                    return Err(GameError::InvalidChoice(format!(
                        "only {available} bonus steps available"
                    )));
                }
                self.spend_bonus_steps(player, steps);
                self.run_movement(&mut events);
            }
            (TurnPhase::AwaitCardAck { .. }, Command::AcknowledgeCard) => {
                self.run_movement(&mut events);
            }
            (TurnPhase::AwaitPowerUp { mut pending }, Command::PickPowerUp { choice }) => {
                if pending.is_empty() {
                    return Err(GameError::NothingPending);
                }
                let player = pending.remove(0);
                self.apply_power_up(player, choice, &mut events);
                self.pump_power_ups(pending, &mut events);
            }
            (phase, _) => {
                let err = match phase.choice_kind() {
                    Some(kind) => GameError::WrongChoice(kind),
                    None => GameError::NothingPending,
                };
                self.phase = phase;
                return Err(err);
            }
        }
        Ok(events)
    }

    // ---- round flow -----------------------------------------------------

    fn begin_round(&mut self, events: &mut Vec<Event>) {
        events.push(Event::LogMessage {
            text: format!("Round {} begins.", self.state.round),
        });
        let afk = [
            self.state.players[0].passive.take_afk(),
            self.state.players[1].passive.take_afk(),
        ];
        match afk {
            [true, true] => {
                events.push(Event::TurnSkipped { player: PlayerId(0) });
                events.push(Event::TurnSkipped { player: PlayerId(1) });
                self.end_round(false, events);
            }
            [a, b] if a != b => {
                let skipped = if a { PlayerId(0) } else { PlayerId(1) };
                let mover = skipped.opponent();
                events.push(Event::TurnSkipped { player: skipped });
                events.push(Event::DuelForfeited {
                    round: self.state.round,
                    winner: mover,
                });
                let roll = self.roll_player(mover, RpsIntent::Random, events);
                self.state.players[mover.index()].passive.record_duel_win();
                self.state.players[skipped.index()].passive.record_duel_loss();
                let mut sums = [0, 0];
                sums[mover.index()] = roll.sum();
                self.plan = Some(MovePlan {
                    order: [mover, skipped],
                    sums,
                    mover: 0,
                    stage: MoveStage::AthleteOffer,
                    extra_steps: 0,
                });
                self.run_movement(events);
            }
            _ => {
                let mut pending = [None, None];
                for id in [PlayerId(0), PlayerId(1)] {
                    if self.bots[id.index()] {
                        pending[id.index()] = Some(RpsIntent::Random);
                    } else {
                        events.push(Event::RpsPromptShown { player: id });
                    }
                }
                self.phase = TurnPhase::ChoosingRps { pending };
                self.maybe_resolve_rps(events);
            }
        }
    }

    fn maybe_resolve_rps(&mut self, events: &mut Vec<Event>) {
        let intents = match &self.phase {
            TurnPhase::ChoosingRps {
                pending: [Some(a), Some(b)],
            } => [*a, *b],
            _ => return,
        };
        self.phase = TurnPhase::Idle;
        self.resolve_duel(intents, events);
    }

    fn resolve_duel(&mut self, intents: [RpsIntent; 2], events: &mut Vec<Event>) {
        events.push(Event::Sound {
            cue: SoundCue::DiceRoll,
        });
        let rolls = [
            self.roll_player(PlayerId(0), intents[0], events),
            self.roll_player(PlayerId(1), intents[1], events),
        ];
        let choices = [rolls[0].choice, rolls[1].choice];
        let sums = [rolls[0].sum(), rolls[1].sum()];

        let (mut outcome, notes) =
            duel::resolve(&self.rules, &mut self.state.players, choices);

        // Chaos-rolled wins are always special.
        if let Some(winner) = outcome.winner {
            if self.state.players[winner.index()].passive.chaos_duels > 0 {
                outcome.is_special_win = true;
            }
        }

        self.settle_duel_notes(&notes, events);

        let Some(winner) = outcome.winner else {
            events.push(Event::DuelTied {
                round: self.state.round,
                choices,
            });
            self.end_round(false, events);
            return;
        };
        let loser = winner.opponent();
        events.push(Event::DuelResolved {
            round: self.state.round,
            winner,
            is_special_win: outcome.is_special_win,
            choices,
            sums,
        });

        self.state.players[winner.index()].passive.record_duel_win();
        self.state.players[loser.index()].passive.record_duel_loss();

        if outcome.is_special_win {
            let updates =
                self.state
                    .quests
                    .advance(QuestKind::GetSpecialRolls, winner, 1);
            self.settle_quests(updates, events);
            if self.state.players[winner.index()]
                .passive
                .lift_curse(CurseType::Misfortune)
            {
                events.push(Event::CurseLifted {
                    player: winner,
                    curse: CurseType::Misfortune,
                });
            }
        }

        if self.state.players[winner.index()].is(&self.rules, CharacterPassive::LuckyOne) {
            let mut bonus = LUCKY_WIN_BASE * (self.state.stage as i64 + 1);
            if outcome.is_special_win {
                bonus *= 3;
            }
            self.add_money(winner, bonus, events);
        }
        if self.state.players[loser.index()].is(&self.rules, CharacterPassive::Gambler) {
            let treasure = self.state.rng.roll_die() as u32;
            self.state.players[loser.index()].passive.bank_treasure(treasure);
        }
        if outcome.is_special_win
            && self.state.players[winner.index()].is(&self.rules, CharacterPassive::Gambler)
        {
            let payout = self.state.players[winner.index()].passive.cash_out_treasure();
            if payout > 0 {
                events.push(Event::LogMessage {
                    text: "The Gambler cashes out the treasure hoard.".into(),
                });
                self.add_money(winner, payout, events);
            }
        }

        self.plan = Some(MovePlan {
            order: [winner, loser],
            sums,
            mover: 0,
            stage: MoveStage::AthleteOffer,
            extra_steps: 0,
        });
        self.run_movement(events);
    }

    /// Roll for one player, honoring the single-die penalty, chaos duels,
    /// and the Specialist's forced-special cadence.
    fn roll_player(&mut self, player: PlayerId, intent: RpsIntent, events: &mut Vec<Event>) -> DiceRoll {
        let mode = if self.state.dice_mode == DiceMode::Rigged
            && self.state.rigged_player != Some(player)
        {
            DiceMode::Normal
        } else {
            self.state.dice_mode
        };
        let force = self.take_forced_special(player);
        let passive = &self.state.players[player.index()].passive;
        let single = passive.single_die_duels > 0;
        let chaos = passive.chaos_duels > 0;
        let chance_bp = passive.special_chance_bp;
        let rng = &mut self.state.rng;
        let roll = if single {
            dice::roll_single(rng, mode)
        } else if chaos {
            dice::roll_free(rng, mode, force)
        } else {
            match intent {
                RpsIntent::Pick(sign) => dice::roll_for_sign(rng, sign, mode, force, chance_bp),
                RpsIntent::Random => dice::roll_free(rng, mode, force),
            }
        };
        events.push(Event::DiceRolled {
            player,
            die1: roll.die1,
            die2: roll.die2,
            choice: roll.choice,
        });
        let updates = self
            .state
            .quests
            .advance(QuestKind::RollSixes, player, roll.sixes());
        self.settle_quests(updates, events);
        roll
    }

    fn take_forced_special(&mut self, player: PlayerId) -> bool {
        let specialist =
            self.state.players[player.index()].is(&self.rules, CharacterPassive::Specialist);
        let threshold = if self.state.stage >= 3 { 3 } else { 4 };
        let passive = &mut self.state.players[player.index()].passive;
        passive.duels_since_special += 1;
        if specialist && passive.duels_since_special >= threshold {
            passive.duels_since_special = 0;
            return true;
        }
        false
    }

    fn settle_duel_notes(&mut self, notes: &[DuelNote], events: &mut Vec<Event>) {
        for note in notes {
            match *note {
                DuelNote::GuaranteedWin { player } => {
                    events.push(Event::LogMessage {
                        text: format!("Player {} cashes in a guaranteed win.", player.0),
                    });
                }
                DuelNote::GuaranteedWinsCancelled => {
                    events.push(Event::LogMessage {
                        text: "Two guaranteed wins cancel each other out.".into(),
                    });
                }
                DuelNote::PacifistStandDown { player } => {
                    let bonus = self.state.players[player.index()]
                        .passive
                        .take_pacifist_bonus();
                    events.push(Event::LogMessage {
                        text: "The Pacifist stands down and pockets the peace bonus.".into(),
                    });
                    self.add_money(player, bonus, events);
                }
                DuelNote::OverwhelmingPower { player } => {
                    events.push(Event::LogMessage {
                        text: format!("Player {}'s special roll is unstoppable.", player.0),
                    });
                }
                DuelNote::OverwhelmingPowerCancelled => {
                    events.push(Event::LogMessage {
                        text: "Both specials were unstoppable; neither prevails.".into(),
                    });
                }
                DuelNote::NegotiatorTieWin { player } => {
                    events.push(Event::LogMessage {
                        text: format!("Player {} negotiates the tie into a win.", player.0),
                    });
                }
                DuelNote::MisfortuneLoss { player } => {
                    events.push(Event::LogMessage {
                        text: format!("Misfortune turns player {}'s tie into a loss.", player.0),
                    });
                }
                DuelNote::SpecialDowngraded { by } => {
                    events.push(Event::LogMessage {
                        text: format!("Player {} spends a token to blunt the special win.", by.0),
                    });
                }
            }
        }
    }

    // ---- movement -------------------------------------------------------

    fn run_movement(&mut self, events: &mut Vec<Event>) {
        loop {
            let Some(mut plan) = self.plan.take() else {
                return;
            };
            if plan.mover >= plan.order.len() {
                self.end_round(true, events);
                return;
            }
            let player = plan.order[plan.mover];
            let moving = plan.sums[player.index()] > 0;
            match plan.stage {
                MoveStage::AthleteOffer => {
                    plan.stage = MoveStage::StrideOffer;
                    let is_athlete = self.state.players[player.index()]
                        .is(&self.rules, CharacterPassive::Athlete);
                    if moving && is_athlete {
                        if self.bots[player.index()] {
                            self.plan = Some(plan);
                            self.athlete_sprint(player, events);
                        } else {
                            self.plan = Some(plan);
                            self.phase = TurnPhase::AwaitAthleteBonus { player };
                            events.push(Event::AthleteBonusPromptShown { player });
                            return;
                        }
                    } else {
                        self.plan = Some(plan);
                    }
                }
                MoveStage::StrideOffer => {
                    plan.stage = MoveStage::Step;
                    let available = self.state.players[player.index()].passive.bonus_steps_pool;
                    if moving && available > 0 {
                        if self.bots[player.index()] {
                            self.plan = Some(plan);
                            self.spend_bonus_steps(player, available);
                        } else {
                            self.plan = Some(plan);
                            self.phase = TurnPhase::AwaitBonusSteps { player, available };
                            events.push(Event::BonusStepsPromptShown { player, available });
                            return;
                        }
                    } else {
                        self.plan = Some(plan);
                    }
                }
                MoveStage::Step => {
                    let steps = plan.sums[player.index()] as u32 + plan.extra_steps;
                    if steps == 0 {
                        plan.mover += 1;
                        plan.stage = MoveStage::AthleteOffer;
                        plan.extra_steps = 0;
                        self.plan = Some(plan);
                        continue;
                    }
                    plan.stage = MoveStage::TileEffect;
                    self.plan = Some(plan);
                    self.move_player(player, steps, events);
                }
                MoveStage::TileEffect => {
                    plan.mover += 1;
                    plan.stage = MoveStage::AthleteOffer;
                    plan.extra_steps = 0;
                    self.plan = Some(plan);
                    let suspended = self.tile_effect(player, events);
                    if suspended || self.is_over() {
                        if self.is_over() {
                            self.plan = None;
                        }
                        return;
                    }
                }
            }
        }
    }

    fn athlete_sprint(&mut self, player: PlayerId, events: &mut Vec<Event>) {
        let die = self.state.rng.roll_die();
        if let Some(plan) = self.plan.as_mut() {
            plan.extra_steps += die as u32;
        }
        events.push(Event::LogMessage {
            text: format!("The Athlete sprints {die} extra spaces."),
        });
        let updates =
            self.state
                .quests
                .advance(QuestKind::RollSixes, player, (die == 6) as i64);
        self.settle_quests(updates, events);
    }

    fn spend_bonus_steps(&mut self, player: PlayerId, steps: u32) {
        let passive = &mut self.state.players[player.index()].passive;
        passive.bonus_steps_pool = passive.bonus_steps_pool.saturating_sub(steps);
        if let Some(plan) = self.plan.as_mut() {
            plan.extra_steps += steps;
        }
    }

    fn move_player(&mut self, player: PlayerId, steps: u32, events: &mut Vec<Event>) {
        let from = self.state.players[player.index()].path_position;
        let to = self.state.board.advance(from, steps as usize);
        self.state.players[player.index()].path_position = to;
        events.push(Event::PlayerMoved {
            player,
            from,
            to,
            steps,
        });
        events.push(Event::Sound {
            cue: SoundCue::PieceMove,
        });

        if self.state.players[player.index()].is(&self.rules, CharacterPassive::Athlete) {
            let pay = steps as i64 * ATHLETE_PAY_PER_STEP * (self.state.stage as i64 + 1);
            self.add_money(player, pay, events);
        }

        if self.state.board.passed_own_go(player, from, to, steps as usize) {
            self.complete_lap(player, events);
        }
        if to == self.state.board.go_index(player) {
            let updates = self.state.quests.advance(QuestKind::LandOnGo, player, 1);
            self.settle_quests(updates, events);
        }
    }

    fn complete_lap(&mut self, player: PlayerId, events: &mut Vec<Event>) {
        self.state.players[player.index()].passive.laps_completed += 1;
        events.push(Event::PassedGo {
            player,
            laps_completed: self.state.players[player.index()].passive.laps_completed,
        });

        if self.state.players[player.index()].is(&self.rules, CharacterPassive::Thief) {
            let passive = &mut self.state.players[player.index()].passive;
            if passive.thief_lap_is_clean {
                passive.has_tax_immunity = true;
                passive.will_steal_next_income = true;
                events.push(Event::LogMessage {
                    text: "A clean lap: the Thief pockets immunity and eyes the next income."
                        .into(),
                });
            }
            passive.thief_lap_is_clean = true;
        }

        if self.state.players[player.index()].is(&self.rules, CharacterPassive::Architect) {
            self.architect_upgrade(player, events);
        }
    }

    /// One player's turn-end income sweep, with the opposing Thief's
    /// stage-scaled redirection if their steal flag is armed.
    fn sweep_income(&mut self, player: PlayerId, events: &mut Vec<Event>) {
        if self.state.players[player.index()]
            .passive
            .has_curse(CurseType::Drought)
        {
            return;
        }
        let owned = self.state.board.tiles_owned_by(player);
        let tiles: Vec<&crate::board::Tile> = owned
            .iter()
            .filter_map(|&i| self.state.board.tile_at(i))
            .collect();
        let sweep = economy::income_sweep(&self.rules, &tiles, &self.state.players[player.index()]);
        if sweep <= 0 {
            return;
        }
        let thief = player.opponent();
        if self.state.players[thief.index()].passive.take_income_steal() {
            let stolen = sweep * (self.state.stage as i64 + 1);
            events.push(Event::IncomeStolen {
                thief,
                victim: player,
                amount: stolen,
            });
            self.add_money(thief, stolen, events);
        } else {
            events.push(Event::PassiveIncome {
                player,
                amount: sweep,
            });
            self.add_money(player, sweep, events);
        }
    }

    fn architect_upgrade(&mut self, player: PlayerId, events: &mut Vec<Event>) {
        let cap = economy::max_level(&self.rules, &self.state.players[player.index()]);
        let candidates: Vec<usize> = self
            .state
            .board
            .tiles_owned_by(player)
            .into_iter()
            .filter(|&i| {
                self.state
                    .board
                    .tile_at(i)
                    .map_or(false, |t| t.level < cap)
            })
            .collect();
        let Some(&index) = self.state.rng.pick(&candidates) else {
            return;
        };
        let new_level = self
            .state
            .board
            .tile_at(index)
            .map_or(1, |t| t.level + 1);
        self.state.board.set_level(index, new_level);
        events.push(Event::BuildingUpgraded {
            player,
            tile: index,
            new_level,
            cost: 0,
        });
        self.push_tile_changed(index, events);
        self.maybe_lift_recession(player, new_level, events);
    }

    /// Landing effects for the mover's current tile. Returns true if the
    /// engine suspended waiting for a choice.
    fn tile_effect(&mut self, player: PlayerId, events: &mut Vec<Event>) -> bool {
        let pos = self.state.players[player.index()].path_position;
        let (kind, owner) = match self.state.board.tile_at(pos) {
            Some(tile) => (tile.kind, tile.owner),
            None => return false,
        };
        match kind {
            TileKind::Go => false,
            TileKind::Chance => {
                self.draw_card_for(player, events);
                if self.bots[player.index()] || self.is_over() {
                    false
                } else {
                    self.phase = TurnPhase::AwaitCardAck { player };
                    true
                }
            }
            TileKind::Buildable => match owner {
                None => self.offer_build(player, pos, events),
                Some(o) if o == player => {
                    if self.state.players[player.index()].is(&self.rules, CharacterPassive::Eventer)
                    {
                        self.draw_card_for(player, events);
                    }
                    self.offer_upgrade(player, pos, events)
                }
                Some(receiver) => {
                    self.pay_tax(player, receiver, pos, events);
                    false
                }
            },
        }
    }

    fn offer_build(&mut self, player: PlayerId, tile: usize, events: &mut Vec<Event>) -> bool {
        if self.state.players[player.index()].is(&self.rules, CharacterPassive::Major) {
            return false;
        }
        let money = self.state.players[player.index()].money;
        let options: Vec<BuildingTypeId> = (0..self.rules.buildings.len() as u16)
            .map(BuildingTypeId::new)
            .filter(|id| self.rules.building(*id).cost <= money)
            .collect();
        if options.is_empty() {
            return false;
        }
        if self.bots[player.index()] {
            // Greedy: the priciest building affordable.
            let best = options
                .iter()
                .copied()
                .max_by_key(|id| self.rules.building(*id).cost);
            if let Some(building) = best {
                self.do_build(player, tile, building, events);
            }
            return false;
        }
        events.push(Event::BuildPromptShown {
            player,
            tile,
            options: options.clone(),
        });
        self.phase = TurnPhase::AwaitBuild {
            player,
            tile,
            options,
        };
        true
    }

    fn offer_upgrade(&mut self, player: PlayerId, tile: usize, events: &mut Vec<Event>) -> bool {
        let quote = self
            .state
            .board
            .tile_at(tile)
            .and_then(|t| economy::upgrade_quote(&self.rules, t, &self.state.players[player.index()]));
        let Some((cost, new_level)) = quote else {
            return false;
        };
        if self.state.players[player.index()]
            .passive
            .has_curse(CurseType::Sanction)
        {
            events.push(Event::LogMessage {
                text: "Sanction blocks the upgrade.".into(),
            });
            return false;
        }
        if cost > self.state.players[player.index()].money {
            return false;
        }
        if self.bots[player.index()] {
            self.do_upgrade(player, tile, cost, new_level, events);
            return false;
        }
        events.push(Event::UpgradePromptShown {
            player,
            tile,
            cost,
            new_level,
        });
        self.phase = TurnPhase::AwaitUpgrade {
            player,
            tile,
            cost,
            new_level,
        };
        true
    }

    fn do_build(
        &mut self,
        player: PlayerId,
        tile: usize,
        building: BuildingTypeId,
        events: &mut Vec<Event>,
    ) {
        let cost = self.rules.building(building).cost;
        if !self.state.board.place_building(tile, player, building, 1) {
            return;
        }
        self.add_money(player, -cost, events);
        events.push(Event::BuildingBuilt {
            player,
            tile,
            building,
            cost,
        });
        events.push(Event::Sound {
            cue: SoundCue::BuildProperty,
        });
        self.push_tile_changed(tile, events);
    }

    fn do_upgrade(
        &mut self,
        player: PlayerId,
        tile: usize,
        cost: i64,
        new_level: u8,
        events: &mut Vec<Event>,
    ) {
        if cost > self.state.players[player.index()].money {
            return;
        }
        self.add_money(player, -cost, events);
        self.state.board.set_level(tile, new_level);
        events.push(Event::BuildingUpgraded {
            player,
            tile,
            new_level,
            cost,
        });
        self.push_tile_changed(tile, events);
        self.maybe_lift_recession(player, new_level, events);
    }

    /// The full tax exchange, or game over if the payer cannot cover it.
    fn pay_tax(
        &mut self,
        payer: PlayerId,
        receiver: PlayerId,
        tile: usize,
        events: &mut Vec<Event>,
    ) {
        let bill = match self.state.board.tile_at(tile).and_then(|t| {
            economy::assess_tax(
                &self.rules,
                t,
                self.state.stage,
                &self.state.players[payer.index()],
                &self.state.players[receiver.index()],
            )
        }) {
            Some(bill) => bill,
            None => return,
        };

        // Insolvency against the assessed amount ends the game before any
        // transfer; immunity is only consulted for a payer who could pay.
        if self.state.players[payer.index()].money < bill.assessed {
            events.push(Event::GameEnded {
                winner: receiver,
                reason: GameOverReason::Bankruptcy,
            });
            self.phase = TurnPhase::GameOver { winner: receiver };
            return;
        }

        if self.state.players[payer.index()].passive.take_tax_immunity() {
            events.push(Event::TaxBlocked {
                payer,
                receiver,
                amount: bill.debited,
            });
            return;
        }

        self.add_money(payer, -bill.debited, events);
        self.add_money(receiver, bill.credited, events);
        events.push(Event::TaxPaid {
            payer,
            receiver,
            debited: bill.debited,
            credited: bill.credited,
        });

        // The Extortion surcharge lands after the solvency check, so a
        // settlement can still leave the payer underwater.
        if self.state.players[payer.index()].money < 0 {
            events.push(Event::GameEnded {
                winner: receiver,
                reason: GameOverReason::Bankruptcy,
            });
            self.phase = TurnPhase::GameOver { winner: receiver };
            return;
        }

        if self.state.players[payer.index()]
            .passive
            .lift_curse(CurseType::Sanction)
        {
            events.push(Event::CurseLifted {
                player: payer,
                curse: CurseType::Sanction,
            });
        }
        if self.state.players[receiver.index()]
            .passive
            .lift_curse(CurseType::Drought)
        {
            events.push(Event::CurseLifted {
                player: receiver,
                curse: CurseType::Drought,
            });
        }
        self.state.players[payer.index()].passive.thief_lap_is_clean = false;

        let updates = self
            .state
            .quests
            .advance(QuestKind::CollectTaxes, receiver, 1);
        self.settle_quests(updates, events);
    }

    // ---- round end ------------------------------------------------------

    /// Close out a round. Tied or fully skipped rounds loop straight back to
    /// the next duel; only decisive duels run the turn-end upkeep (timers,
    /// income, the stage counter).
    fn end_round(&mut self, decisive: bool, events: &mut Vec<Event>) {
        self.plan = None;

        if !decisive {
            events.push(Event::RoundEnded {
                round: self.state.round,
            });
            self.state.round += 1;
            self.phase = TurnPhase::Idle;
            return;
        }

        for id in [PlayerId(0), PlayerId(1)] {
            if self.state.players[id.index()]
                .passive
                .has_blessing(BlessingType::Cadence)
            {
                let passive = &mut self.state.players[id.index()].passive;
                passive.five_counter += 1;
                if passive.five_counter >= CADENCE_PERIOD {
                    passive.five_counter = 0;
                    let bonus = CADENCE_BASE * (self.state.stage as i64 + 1);
                    events.push(Event::LogMessage {
                        text: "Cadence pays its every-fifth-duel bonus.".into(),
                    });
                    self.add_money(id, bonus, events);
                }
            }
            self.state.players[id.index()].passive.tick_round_end();
        }

        self.sweep_income(PlayerId(0), events);
        self.sweep_income(PlayerId(1), events);

        self.state.dice_mode = DiceMode::Normal;
        self.state.rigged_player = None;

        events.push(Event::RoundEnded {
            round: self.state.round,
        });
        self.state.round += 1;

        self.state.duels_this_stage += 1;
        let mut power_ups = None;
        if self.state.duels_this_stage >= DUELS_PER_STAGE && self.state.stage < MAX_STAGE {
            self.state.duels_this_stage = 0;
            self.state.stage += 1;
            events.push(Event::StageAdvanced {
                stage: self.state.stage,
            });
            if POWER_UP_STAGES.contains(&self.state.stage) {
                power_ups = Some(vec![PlayerId(0), PlayerId(1)]);
            }
        }
        match power_ups {
            Some(pending) => self.pump_power_ups(pending, events),
            None => self.phase = TurnPhase::Idle,
        }
    }

    fn pump_power_ups(&mut self, mut pending: Vec<PlayerId>, events: &mut Vec<Event>) {
        while let Some(&front) = pending.first() {
            if self.bots[front.index()] {
                pending.remove(0);
                self.apply_power_up(front, PowerUp::Money, events);
            } else {
                events.push(Event::PowerUpPromptShown {
                    player: front,
                    stage: self.state.stage,
                });
                self.phase = TurnPhase::AwaitPowerUp { pending };
                return;
            }
        }
        self.phase = TurnPhase::Idle;
    }

    fn apply_power_up(&mut self, player: PlayerId, choice: PowerUp, events: &mut Vec<Event>) {
        match choice {
            PowerUp::Money => {
                let amount = POWER_UP_MONEY_PER_STAGE * self.state.stage as i64;
                self.add_money(player, amount, events);
            }
            PowerUp::RandomBlessing => {
                let mut ctx = self.effect_ctx(events);
                cards::grant_random_blessing(&mut ctx, player);
            }
            PowerUp::SpecialChance => {
                self.state.players[player.index()].passive.special_chance_bp +=
                    POWER_UP_SPECIAL_BONUS_BP;
                events.push(Event::LogMessage {
                    text: format!("Player {}'s special chance rises.", player.0),
                });
            }
        }
    }

    // ---- shared helpers ---------------------------------------------------

    fn effect_ctx<'a>(&'a mut self, events: &'a mut Vec<Event>) -> EffectCtx<'a> {
        EffectCtx {
            rules: &self.rules,
            board: &mut self.state.board,
            players: &mut self.state.players,
            quests: &mut self.state.quests,
            rng: &mut self.state.rng,
            dice_mode: &mut self.state.dice_mode,
            rigged_player: &mut self.state.rigged_player,
            stage: self.state.stage,
            events,
        }
    }

    fn draw_card_for(&mut self, player: PlayerId, events: &mut Vec<Event>) {
        let mut ctx = self.effect_ctx(events);
        cards::draw_card(&mut ctx, player);
    }

    fn settle_quests(&mut self, updates: Vec<QuestUpdate>, events: &mut Vec<Event>) {
        if updates.is_empty() {
            return;
        }
        let mut ctx = self.effect_ctx(events);
        cards::settle_quest_updates(&mut ctx, updates);
    }

    fn add_money(&mut self, player: PlayerId, delta: i64, events: &mut Vec<Event>) {
        let p = &mut self.state.players[player.index()];
        p.money += delta;
        events.push(Event::MoneyChanged {
            player,
            money: p.money,
        });
    }

    fn push_tile_changed(&mut self, index: usize, events: &mut Vec<Event>) {
        if let Some(tile) = self.state.board.tile_at(index) {
            events.push(Event::TileChanged {
                tile: tile.snapshot(index),
            });
        }
    }

    fn maybe_lift_recession(&mut self, player: PlayerId, new_level: u8, events: &mut Vec<Event>) {
        let cap = economy::max_level(&self.rules, &self.state.players[player.index()]);
        if new_level >= cap
            && self.state.players[player.index()]
                .passive
                .lift_curse(CurseType::Recession)
        {
            events.push(Event::CurseLifted {
                player,
                curse: CurseType::Recession,
            });
        }
    }
}
