use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// Data IDs are strings used in YAML files (human-readable, stable across versions)
pub type DataId = String;

/// Runtime IDs are integers compiled at rules-load (fast, deterministic)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeId<T> {
    pub raw: u16,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> RuntimeId<T> {
    #[inline]
    pub const fn new(raw: u16) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }
}

// Type-safe runtime IDs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuildingTypeTag;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacterTag;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardTag;

pub type BuildingTypeId = RuntimeId<BuildingTypeTag>;
pub type CharacterId = RuntimeId<CharacterTag>;
pub type CardId = RuntimeId<CardTag>;

/// Player ID is a simple index (exactly two players, 0 and 1)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// The other player. "The other player" is always `1 - index`.
    #[inline]
    pub const fn opponent(self) -> Self {
        Self(1 - self.0)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
