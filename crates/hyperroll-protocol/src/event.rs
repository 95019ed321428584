use serde::{Deserialize, Serialize};

use crate::{
    BlessingType, BuildingTypeId, CardCategory, CardId, CurseType, DuelChoice, GameOverReason,
    PlayerId, QuestKind, QuestReward, SoundCue, TileSnapshot,
};

/// All possible sim→client events. Fully serializable.
///
/// This stream is the only channel from the core to the presentation layer:
/// log lines, sound cues, money displays and choice prompts all arrive here.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // Fire-and-forget presentation hooks
    LogMessage {
        text: String,
    },
    Sound {
        cue: SoundCue,
    },
    MoneyChanged {
        player: PlayerId,
        money: i64,
    },

    // Duel flow
    DiceRolled {
        player: PlayerId,
        die1: u8,
        die2: u8,
        choice: DuelChoice,
    },
    DuelResolved {
        round: u32,
        winner: PlayerId,
        is_special_win: bool,
        choices: [DuelChoice; 2],
        sums: [u8; 2],
    },
    DuelTied {
        round: u32,
        choices: [DuelChoice; 2],
    },
    /// A player's AFK flag consumed their round; the opponent wins by default.
    TurnSkipped {
        player: PlayerId,
    },
    /// The round was decided without dice: the skipped player's opponent
    /// takes a default win.
    DuelForfeited {
        round: u32,
        winner: PlayerId,
    },

    // Movement
    PlayerMoved {
        player: PlayerId,
        from: usize,
        to: usize,
        steps: u32,
    },
    PassedGo {
        player: PlayerId,
        laps_completed: u32,
    },

    // Economy
    BuildingBuilt {
        player: PlayerId,
        tile: usize,
        building: BuildingTypeId,
        cost: i64,
    },
    BuildingUpgraded {
        player: PlayerId,
        tile: usize,
        new_level: u8,
        cost: i64,
    },
    TaxPaid {
        payer: PlayerId,
        receiver: PlayerId,
        debited: i64,
        credited: i64,
    },
    TaxBlocked {
        payer: PlayerId,
        receiver: PlayerId,
        amount: i64,
    },
    PassiveIncome {
        player: PlayerId,
        amount: i64,
    },
    IncomeStolen {
        thief: PlayerId,
        victim: PlayerId,
        amount: i64,
    },
    TileChanged {
        tile: TileSnapshot,
    },

    // Cards, blessings, curses
    CardDrawn {
        player: PlayerId,
        card: CardId,
        title: String,
        category: CardCategory,
    },
    BlessingGranted {
        player: PlayerId,
        blessing: BlessingType,
    },
    CurseInflicted {
        player: PlayerId,
        curse: CurseType,
    },
    CurseLifted {
        player: PlayerId,
        curse: CurseType,
    },
    /// A third distinct curse: properties razed, money halved, curses lifted.
    DoomCascade {
        player: PlayerId,
        properties_lost: usize,
    },
    /// Six blessings held: the board is wiped in the blessed player's favor.
    Ascension {
        player: PlayerId,
    },

    // Quests
    QuestStarted {
        kind: QuestKind,
        target: i64,
        reward: QuestReward,
    },
    QuestProgress {
        player: PlayerId,
        progress: i64,
        target: i64,
    },
    QuestCompleted {
        player: PlayerId,
        kind: QuestKind,
        reward: QuestReward,
    },

    // Stage meta-game
    StageAdvanced {
        stage: u8,
    },

    // Choice prompts: each mirrors a suspension phase and expects exactly
    // one resuming command.
    RpsPromptShown {
        player: PlayerId,
    },
    BuildPromptShown {
        player: PlayerId,
        tile: usize,
        options: Vec<BuildingTypeId>,
    },
    UpgradePromptShown {
        player: PlayerId,
        tile: usize,
        cost: i64,
        new_level: u8,
    },
    AthleteBonusPromptShown {
        player: PlayerId,
    },
    BonusStepsPromptShown {
        player: PlayerId,
        available: u32,
    },
    PowerUpPromptShown {
        player: PlayerId,
        stage: u8,
    },

    // Game flow
    RoundEnded {
        round: u32,
    },
    GameEnded {
        winner: PlayerId,
        reason: GameOverReason,
    },
}
