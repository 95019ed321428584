use serde::{Deserialize, Serialize};

use crate::{
    BlessingType, BuildingTypeId, CharacterId, CurseType, DiceMode, PlayerId, TileKind,
};

/// Full observable board/player state, enough for a client to render from
/// scratch. The core also streams incremental `Event`s; a snapshot is the
/// resync path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub round: u32,
    pub stage: u8,
    pub duels_this_stage: u32,
    pub dice_mode: DiceMode,
    /// Whose dice are loaded while `dice_mode` is rigged.
    #[serde(default)]
    pub rigged_player: Option<PlayerId>,
    pub tiles: Vec<TileSnapshot>,
    pub players: Vec<PlayerSnapshot>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub path_index: usize,
    pub kind: TileKind,
    #[serde(default)]
    pub owner: Option<PlayerId>,
    #[serde(default)]
    pub building: Option<BuildingTypeId>,
    pub level: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub character: CharacterId,
    pub money: i64,
    pub path_position: usize,
    pub win_streak: u32,
    pub blessings: Vec<BlessingType>,
    pub curses: Vec<CurseType>,
}
