use std::collections::BTreeMap;

use hyperroll_protocol::{BuildingTypeId, CardCategory, CardId, CharacterId};
use thiserror::Error;

use crate::rules::{CardDecks, CompiledRules};

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid reference data: {0}")]
    InvalidData(String),
    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub enum RulesSource<'a> {
    Embedded,
    Path(String),
    Bytes {
        buildings: &'a [u8],
        characters: &'a [u8],
        cards: &'a [u8],
    },
}

#[derive(Debug, serde::Deserialize)]
struct RawRules {
    buildings: BTreeMap<String, crate::rules::RawBuildingType>,
    characters: BTreeMap<String, crate::rules::RawCharacter>,
    cards: BTreeMap<String, crate::rules::RawChanceCard>,
}

pub fn load_rules(source: RulesSource<'_>) -> Result<CompiledRules, RulesError> {
    let raw: RawRules = match source {
        RulesSource::Embedded => {
            let buildings_yaml = include_str!("../../data/base/buildings.yaml");
            let characters_yaml = include_str!("../../data/base/characters.yaml");
            let cards_yaml = include_str!("../../data/base/cards.yaml");
            parse_raw_rules(buildings_yaml, characters_yaml, cards_yaml)?
        }
        RulesSource::Path(path) => {
            let buildings_yaml = std::fs::read_to_string(format!("{path}/buildings.yaml"))?;
            let characters_yaml = std::fs::read_to_string(format!("{path}/characters.yaml"))?;
            let cards_yaml = std::fs::read_to_string(format!("{path}/cards.yaml"))?;
            parse_raw_rules(&buildings_yaml, &characters_yaml, &cards_yaml)?
        }
        RulesSource::Bytes {
            buildings,
            characters,
            cards,
        } => parse_raw_rules(
            std::str::from_utf8(buildings)?,
            std::str::from_utf8(characters)?,
            std::str::from_utf8(cards)?,
        )?,
    };

    compile_rules(raw)
}

fn parse_raw_rules(
    buildings_yaml: &str,
    characters_yaml: &str,
    cards_yaml: &str,
) -> Result<RawRules, RulesError> {
    let buildings = serde_yaml::from_str(buildings_yaml)?;
    let characters = serde_yaml::from_str(characters_yaml)?;
    let cards = serde_yaml::from_str(cards_yaml)?;
    Ok(RawRules {
        buildings,
        characters,
        cards,
    })
}

fn compile_rules(raw: RawRules) -> Result<CompiledRules, RulesError> {
    let building_ids = raw
        .buildings
        .keys()
        .enumerate()
        .map(|(i, k)| (k.clone(), BuildingTypeId::new(i as u16)))
        .collect::<std::collections::HashMap<_, _>>();
    let character_ids = raw
        .characters
        .keys()
        .enumerate()
        .map(|(i, k)| (k.clone(), CharacterId::new(i as u16)))
        .collect::<std::collections::HashMap<_, _>>();
    let card_ids = raw
        .cards
        .keys()
        .enumerate()
        .map(|(i, k)| (k.clone(), CardId::new(i as u16)))
        .collect::<std::collections::HashMap<_, _>>();

    let buildings = raw
        .buildings
        .into_values()
        .map(|b| b.compile())
        .collect::<Result<Vec<_>, _>>()?;
    let characters = raw
        .characters
        .into_values()
        .map(|c| c.compile())
        .collect::<Vec<_>>();
    let cards = raw
        .cards
        .into_values()
        .map(|c| c.compile())
        .collect::<Vec<_>>();

    if buildings.is_empty() {
        return Err(RulesError::InvalidData("no buildings defined".into()));
    }

    let mut decks = CardDecks::default();
    for (i, card) in cards.iter().enumerate() {
        let id = CardId::new(i as u16);
        match card.category {
            CardCategory::Good => decks.good.push(id),
            CardCategory::Bad => decks.bad.push(id),
            CardCategory::Unknown => decks.unknown.push(id),
        }
    }
    for (category, deck) in [
        (CardCategory::Good, &decks.good),
        (CardCategory::Bad, &decks.bad),
        (CardCategory::Unknown, &decks.unknown),
    ] {
        if deck.is_empty() {
            return Err(RulesError::InvalidData(format!(
                "empty {category:?} card deck"
            )));
        }
    }

    Ok(CompiledRules {
        buildings,
        characters,
        cards,
        building_ids,
        character_ids,
        card_ids,
        decks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_rules_load_and_index() {
        let rules = load_rules(RulesSource::Embedded).expect("rules load");
        assert!(rules.building_id("house").is_some());
        assert!(rules.building_id("shop").is_some());
        assert!(rules.character_id("civilian").is_some());
        assert!(!rules.decks.good.is_empty());
        assert!(!rules.decks.bad.is_empty());
        assert!(!rules.decks.unknown.is_empty());
    }

    #[test]
    fn every_passive_has_a_character() {
        use hyperroll_protocol::CharacterPassive::*;
        let rules = load_rules(RulesSource::Embedded).expect("rules load");
        for passive in [
            Architect, Athlete, Civilian, Duelist, Economist, Eventer, Gambler, LuckyOne, Major,
            Negotiator, Pacifist, Specialist, Thief,
        ] {
            assert!(
                rules.character_with_passive(passive).is_some(),
                "missing character for {passive:?}"
            );
        }
    }
}
