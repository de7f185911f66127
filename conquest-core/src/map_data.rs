//! Map definitions - area tables and connection text

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::world::World;

/// One scoring area: bonus value and member territory names
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaDefinition {
    pub name: String,
    pub value: u32,
    pub territories: Vec<String>,
}

/// Everything needed to build a world
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDefinition {
    pub areas: Vec<AreaDefinition>,
    /// Adjacency chains, one per line, names joined by `--`
    pub connections: String,
}

impl MapDefinition {
    /// Build the world graph
    pub fn build(&self) -> Result<World, WorldError> {
        World::load(&self.areas, &self.connections)
    }

    /// Load a map from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read map file: {}", path.display()))?;
        let map = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse map file: {}", path.display()))?;
        Ok(map)
    }

    /// The classic 42-territory world
    pub fn classic() -> Self {
        let areas = CLASSIC_AREAS
            .iter()
            .map(|&(name, value, territories)| AreaDefinition {
                name: name.to_string(),
                value,
                territories: territories.iter().map(|t| t.to_string()).collect(),
            })
            .collect();

        Self {
            areas,
            connections: CLASSIC_CONNECTIONS.to_string(),
        }
    }
}

/// Classic areas: (name, bonus, members)
pub const CLASSIC_AREAS: &[(&str, u32, &[&str])] = &[
    (
        "North America",
        5,
        &[
            "Alaska",
            "Northwest Territories",
            "Greenland",
            "Alberta",
            "Ontario",
            "Quebec",
            "Western United States",
            "Eastern United States",
            "Mexico",
        ],
    ),
    ("South America", 2, &["Venezuala", "Brazil", "Peru", "Argentina"]),
    (
        "Africa",
        3,
        &[
            "North Africa",
            "Egypt",
            "East Africa",
            "Congo",
            "South Africa",
            "Madagascar",
        ],
    ),
    (
        "Europe",
        5,
        &[
            "Iceland",
            "Great Britain",
            "Scandanavia",
            "Ukraine",
            "Northern Europe",
            "Western Europe",
            "Southern Europe",
        ],
    ),
    (
        "Asia",
        7,
        &[
            "Middle East",
            "Afghanistan",
            "India",
            "South East Asia",
            "China",
            "Mongolia",
            "Japan",
            "Kamchatka",
            "Irkutsk",
            "Yakutsk",
            "Siberia",
            "Ural",
        ],
    ),
    (
        "Australia",
        2,
        &["Indonesia", "New Guinea", "Eastern Australia", "Western Australia"],
    ),
];

/// Classic adjacency chains
pub const CLASSIC_CONNECTIONS: &str = "
Alaska--Northwest Territories--Alberta--Alaska
Alberta--Ontario--Greenland--Northwest Territories
Greenland--Quebec--Ontario--Eastern United States--Quebec
Alberta--Western United States--Ontario--Northwest Territories
Western United States--Eastern United States--Mexico--Western United States

Venezuala--Peru--Argentina--Brazil
Peru--Brazil--Venezuala

North Africa--Egypt--East Africa--North Africa
North Africa--Congo--East Africa--South Africa--Congo
East Africa--Madagascar--South Africa

Indonesia--Western Australia--Eastern Australia--New Guinea--Indonesia
Western Australia--New Guinea

Iceland--Great Britain--Western Europe--Southern Europe--Northern Europe--Western Europe
Northern Europe--Great Britain--Scandanavia--Northern Europe--Ukraine--Scandanavia--Iceland
Southern Europe--Ukraine

Middle East--India--South East Asia--China--Mongolia--Japan--Kamchatka--Yakutsk--Irkutsk--Kamchatka--Mongolia--Irkutsk
Yakutsk--Siberia--Irkutsk
China--Siberia--Mongolia
Siberia--Ural--China--Afghanistan--Ural
Middle East--Afghanistan--India--China

Mexico--Venezuala
Brazil--North Africa
Western Europe--North Africa--Southern Europe--Egypt--Middle East--East Africa
Southern Europe--Middle East--Ukraine--Afghanistan--Ural
Ukraine--Ural
Greenland--Iceland
Alaska--Kamchatka
South East Asia--Indonesia
";
