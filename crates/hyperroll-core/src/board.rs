use hyperroll_protocol::{BuildingTypeId, PlayerId, TileKind, TileSnapshot};

/// Canonical board: the 44-tile perimeter loop of a 12x12 interior region.
pub const STANDARD_PATH_LEN: usize = 44;

/// One tile on the path cycle.
///
/// Invariant: `owner.is_none() ⇔ building.is_none() ⇔ level == 0`, enforced
/// by mutating only through [`Board`] methods.
#[derive(Clone, Debug)]
pub struct Tile {
    pub kind: TileKind,
    pub owner: Option<PlayerId>,
    pub building: Option<BuildingTypeId>,
    pub level: u8,
}

impl Tile {
    fn new(kind: TileKind) -> Self {
        Self {
            kind,
            owner: None,
            building: None,
            level: 0,
        }
    }

    #[inline]
    pub fn is_built(&self) -> bool {
        self.owner.is_some()
    }

    pub fn snapshot(&self, path_index: usize) -> TileSnapshot {
        TileSnapshot {
            path_index,
            kind: self.kind,
            owner: self.owner,
            building: self.building,
            level: self.level,
        }
    }
}

/// The static path topology plus per-tile mutable state. Movement is a
/// single cycle: `(index + steps) % len`.
#[derive(Clone, Debug)]
pub struct Board {
    tiles: Vec<Tile>,
}

impl Board {
    /// Build the canonical 44-tile board: two opposite Go corners (one per
    /// player) and two opposite Chance corners.
    pub fn standard() -> Self {
        Self::with_path_len(STANDARD_PATH_LEN)
    }

    /// A cyclic board of `len` tiles (multiple of 4, at least 8) with the
    /// corner layout of the standard board.
    pub fn with_path_len(len: usize) -> Self {
        assert!(len >= 8 && len % 4 == 0, "path length must be 4n >= 8");
        let quarter = len / 4;
        let tiles = (0..len)
            .map(|i| {
                let kind = if i == 0 || i == len / 2 {
                    TileKind::Go
                } else if i == quarter || i == quarter * 3 {
                    TileKind::Chance
                } else {
                    TileKind::Buildable
                };
                Tile::new(kind)
            })
            .collect();
        Self { tiles }
    }

    #[inline]
    pub fn path_length(&self) -> usize {
        self.tiles.len()
    }

    /// The path index of a player's own Go corner (their starting tile).
    #[inline]
    pub fn go_index(&self, player: PlayerId) -> usize {
        if player.0 == 0 {
            0
        } else {
            self.tiles.len() / 2
        }
    }

    pub fn tile_at(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    #[inline]
    pub fn advance(&self, index: usize, steps: usize) -> usize {
        (index + steps) % self.tiles.len()
    }

    /// Path indices of every tile owned by `player`.
    pub fn tiles_owned_by(&self, player: PlayerId) -> Vec<usize> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.owner == Some(player))
            .map(|(i, _)| i)
            .collect()
    }

    /// Path indices of buildable tiles with no owner.
    pub fn buildable_empty_tiles(&self) -> Vec<usize> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind == TileKind::Buildable && t.owner.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Set owner/building/level together, preserving the tile invariant.
    /// No-op on Go/Chance tiles.
    pub fn place_building(
        &mut self,
        index: usize,
        owner: PlayerId,
        building: BuildingTypeId,
        level: u8,
    ) -> bool {
        match self.tiles.get_mut(index) {
            Some(tile) if tile.kind == TileKind::Buildable => {
                tile.owner = Some(owner);
                tile.building = Some(building);
                tile.level = level.max(1);
                true
            }
            _ => false,
        }
    }

    pub fn set_level(&mut self, index: usize, level: u8) {
        if let Some(tile) = self.tiles.get_mut(index) {
            if tile.is_built() {
                tile.level = level.max(1);
            }
        }
    }

    pub fn set_owner(&mut self, index: usize, owner: PlayerId) {
        if let Some(tile) = self.tiles.get_mut(index) {
            if tile.is_built() {
                tile.owner = Some(owner);
            }
        }
    }

    /// Clear owner/building/level, reverting to the default buildable state.
    /// Go and Chance tiles are never reset.
    pub fn reset_tile(&mut self, index: usize) {
        if let Some(tile) = self.tiles.get_mut(index) {
            if tile.kind == TileKind::Buildable {
                tile.owner = None;
                tile.building = None;
                tile.level = 0;
            }
        }
    }

    pub fn reset_all_tiles(&mut self) {
        for i in 0..self.tiles.len() {
            self.reset_tile(i);
        }
    }

    /// Did a move from `before` to `after` (of `steps` spaces) pass the
    /// player's own Go tile?
    ///
    /// Evaluated in own-Go-relative coordinates so both players' corners are
    /// handled by the same wrap test. A `steps == 0` move never passes; the
    /// test assumes `steps < path_length` (single moves top out at 18 spaces
    /// on the standard board, so multi-lap single moves cannot occur).
    pub fn passed_own_go(&self, player: PlayerId, before: usize, after: usize, steps: usize) -> bool {
        if steps == 0 {
            return false;
        }
        let len = self.tiles.len();
        let go = self.go_index(player);
        let rel_before = (before + len - go) % len;
        let rel_after = (after + len - go) % len;
        rel_after < rel_before || rel_after == 0
    }

    pub fn snapshot(&self) -> Vec<TileSnapshot> {
        self.tiles
            .iter()
            .enumerate()
            .map(|(i, t)| t.snapshot(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_board_has_44_tiles_and_four_corners() {
        let board = Board::standard();
        assert_eq!(board.path_length(), 44);
        assert_eq!(board.tile_at(0).unwrap().kind, TileKind::Go);
        assert_eq!(board.tile_at(11).unwrap().kind, TileKind::Chance);
        assert_eq!(board.tile_at(22).unwrap().kind, TileKind::Go);
        assert_eq!(board.tile_at(33).unwrap().kind, TileKind::Chance);
        let buildable = board.buildable_empty_tiles();
        assert_eq!(buildable.len(), 40);
    }

    #[test]
    fn go_corners_belong_to_the_right_players() {
        let board = Board::standard();
        assert_eq!(board.go_index(PlayerId(0)), 0);
        assert_eq!(board.go_index(PlayerId(1)), 22);
    }

    #[test]
    fn movement_wraps_around_the_cycle() {
        let board = Board::standard();
        assert_eq!(board.advance(40, 7), 3);
        assert_eq!(board.advance(0, 44), 0);
    }

    #[test]
    fn passed_go_wrap_test() {
        let board = Board::standard();
        let p0 = PlayerId(0);
        // Wrapping past index 0 counts.
        assert!(board.passed_own_go(p0, 40, 2, 6));
        // Landing exactly on Go counts.
        assert!(board.passed_own_go(p0, 38, 0, 6));
        // Not wrapping does not.
        assert!(!board.passed_own_go(p0, 3, 9, 6));
        // A zero-step "move" never passes, even though before == after.
        assert!(!board.passed_own_go(p0, 0, 0, 0));
    }

    #[test]
    fn passed_go_is_relative_to_own_corner() {
        let board = Board::standard();
        let p1 = PlayerId(1);
        // Crossing index 22 counts for player 1...
        assert!(board.passed_own_go(p1, 20, 25, 5));
        // ...but crossing index 0 does not.
        assert!(!board.passed_own_go(p1, 40, 2, 6));
    }

    #[test]
    fn reset_never_touches_go_or_chance() {
        let mut board = Board::standard();
        assert!(board.place_building(1, PlayerId(0), BuildingTypeId::new(0), 1));
        assert!(!board.place_building(0, PlayerId(0), BuildingTypeId::new(0), 1));
        board.reset_all_tiles();
        assert!(!board.tile_at(1).unwrap().is_built());
        assert_eq!(board.tile_at(0).unwrap().kind, TileKind::Go);
    }

    #[test]
    fn tile_invariant_holds_through_place_and_reset() {
        let mut board = Board::standard();
        board.place_building(5, PlayerId(1), BuildingTypeId::new(1), 3);
        let tile = board.tile_at(5).unwrap();
        assert_eq!(tile.owner, Some(PlayerId(1)));
        assert_eq!(tile.level, 3);
        board.reset_tile(5);
        let tile = board.tile_at(5).unwrap();
        assert!(tile.owner.is_none() && tile.building.is_none() && tile.level == 0);
    }
}
