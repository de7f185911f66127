//! World graph: territories, scoring areas and adjacency
//!
//! The graph is a flat registry addressed by index keys. Topology is fixed
//! once `World::load` returns; only ownership and force counts change
//! afterwards, and only through the rules engine.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::game::PlayerId;
use crate::map_data::AreaDefinition;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Marker symbols for territories; neighbors never share one
pub const TERRITORY_MARKERS: [char; 5] = ['\\', '/', '-', '|', '+'];

/// Separator between territory names in a connection line
const CONNECTION_SEPARATOR: &str = "--";

// ============================================================================
// KEYS
// ============================================================================

/// Stable key of a territory (index into the world registry)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TerritoryId(pub usize);

/// Stable key of an area (index into the world registry)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AreaId(pub usize);

// ============================================================================
// ENTITIES
// ============================================================================

/// Smallest unit of ownership on the map
#[derive(Clone, Debug)]
pub struct Territory {
    pub name: String,
    /// Area this territory scores for
    pub area: AreaId,
    /// Display marker, distinct from every neighbor's
    pub marker: char,
    pub(crate) owner: Option<PlayerId>,
    pub(crate) forces: u32,
    neighbors: BTreeSet<TerritoryId>,
}

impl Territory {
    fn new(name: String, area: AreaId) -> Self {
        Self {
            name,
            area,
            marker: ' ',
            owner: None,
            forces: 0,
            neighbors: BTreeSet::new(),
        }
    }

    /// Current owner, if any
    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    /// Forces stationed here (0 when unowned)
    pub fn forces(&self) -> u32 {
        self.forces
    }

    /// Check ownership by a specific player
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }

    /// Neighbor keys in ascending order
    pub fn neighbors(&self) -> impl Iterator<Item = TerritoryId> + '_ {
        self.neighbors.iter().copied()
    }
}

/// Fixed group of territories granting a bonus when held by one player
#[derive(Clone, Debug)]
pub struct Area {
    pub name: String,
    /// Reinforcement bonus for holding every member
    pub value: u32,
    territories: Vec<TerritoryId>,
}

impl Area {
    /// Member territories in definition order
    pub fn territories(&self) -> &[TerritoryId] {
        &self.territories
    }
}

// ============================================================================
// WORLD
// ============================================================================

/// Registry of every territory and area of a map
#[derive(Clone, Debug, Default)]
pub struct World {
    territories: Vec<Territory>,
    areas: Vec<Area>,
    territory_index: FxHashMap<String, TerritoryId>,
    area_index: FxHashMap<String, AreaId>,
}

impl World {
    // ========================================================================
    // CONSTRUCTION
    // ========================================================================

    /// Build a world from area definitions and connection text
    ///
    /// Each non-blank connection line is a chain of territory names joined by
    /// `--`; every consecutive pair becomes a symmetric edge.
    pub fn load(areas: &[AreaDefinition], connections: &str) -> Result<Self, WorldError> {
        let mut world = World::default();

        for def in areas {
            world.add_area(def)?;
        }
        for line in connections.lines() {
            world.connect_chain(line)?;
        }
        world.assign_markers()?;

        Ok(world)
    }

    fn add_area(&mut self, def: &AreaDefinition) -> Result<(), WorldError> {
        if self.area_index.contains_key(&def.name) {
            return Err(WorldError::DuplicateArea(def.name.clone()));
        }

        let area_id = AreaId(self.areas.len());
        let mut members = Vec::with_capacity(def.territories.len());

        for name in &def.territories {
            if self.territory_index.contains_key(name) {
                return Err(WorldError::DuplicateTerritory(name.clone()));
            }
            let id = TerritoryId(self.territories.len());
            self.territories.push(Territory::new(name.clone(), area_id));
            self.territory_index.insert(name.clone(), id);
            members.push(id);
        }

        self.areas.push(Area {
            name: def.name.clone(),
            value: def.value,
            territories: members,
        });
        self.area_index.insert(def.name.clone(), area_id);
        Ok(())
    }

    fn connect_chain(&mut self, line: &str) -> Result<(), WorldError> {
        if line.trim().is_empty() {
            return Ok(());
        }

        let chain = line
            .split(CONNECTION_SEPARATOR)
            .map(str::trim)
            .map(|name| {
                self.territory_id(name).ok_or_else(|| WorldError::UnknownTerritory {
                    name: name.to_string(),
                    line: line.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for pair in chain.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a == b {
                return Err(WorldError::SelfConnection(self.territories[a.0].name.clone()));
            }
            self.territories[a.0].neighbors.insert(b);
            self.territories[b.0].neighbors.insert(a);
        }

        Ok(())
    }

    /// Give every territory the last marker not used by an already-marked neighbor
    fn assign_markers(&mut self) -> Result<(), WorldError> {
        for index in 0..self.territories.len() {
            let taken: Vec<char> = self.territories[index]
                .neighbors
                .iter()
                .filter(|n| n.0 < index)
                .map(|n| self.territories[n.0].marker)
                .collect();

            let marker = TERRITORY_MARKERS
                .iter()
                .rev()
                .copied()
                .find(|m| !taken.contains(m))
                .ok_or_else(|| WorldError::MarkersExhausted(self.territories[index].name.clone()))?;

            self.territories[index].marker = marker;
        }
        Ok(())
    }

    // ========================================================================
    // LOOKUP
    // ========================================================================

    /// Territory by name
    pub fn territory(&self, name: &str) -> Option<&Territory> {
        self.territory_id(name).map(|id| &self.territories[id.0])
    }

    /// Territory key by name
    pub fn territory_id(&self, name: &str) -> Option<TerritoryId> {
        self.territory_index.get(name).copied()
    }

    /// Area by name
    pub fn area(&self, name: &str) -> Option<&Area> {
        self.area_id(name).map(|id| &self.areas[id.0])
    }

    /// Area key by name
    pub fn area_id(&self, name: &str) -> Option<AreaId> {
        self.area_index.get(name).copied()
    }

    /// Territory by key
    pub fn get(&self, id: TerritoryId) -> Option<&Territory> {
        self.territories.get(id.0)
    }

    /// Area by key
    pub fn get_area(&self, id: AreaId) -> Option<&Area> {
        self.areas.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: TerritoryId) -> Option<&mut Territory> {
        self.territories.get_mut(id.0)
    }

    /// Name of a territory, empty for an unknown key
    pub fn name_of(&self, id: TerritoryId) -> &str {
        self.get(id).map_or("", |t| t.name.as_str())
    }

    /// All territories in definition order
    pub fn territories(&self) -> impl Iterator<Item = (TerritoryId, &Territory)> + '_ {
        self.territories
            .iter()
            .enumerate()
            .map(|(i, t)| (TerritoryId(i), t))
    }

    /// All areas in definition order
    pub fn areas(&self) -> impl Iterator<Item = (AreaId, &Area)> + '_ {
        self.areas.iter().enumerate().map(|(i, a)| (AreaId(i), a))
    }

    /// Number of territories
    pub fn len(&self) -> usize {
        self.territories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.territories.is_empty()
    }

    // ========================================================================
    // TERRITORY QUERIES
    // ========================================================================

    /// Front-line check: some owned neighbor belongs to a different owner
    pub fn border(&self, id: TerritoryId) -> bool {
        let Some(territory) = self.get(id) else {
            return false;
        };
        territory.neighbors().any(|n| {
            let other = self.territories[n.0].owner;
            other.is_some() && other != territory.owner
        })
    }

    /// Territory is owned and its whole area belongs to the same owner
    pub fn area_owned(&self, id: TerritoryId) -> bool {
        match self.get(id) {
            Some(t) => t.owner.is_some() && self.area_owner(t.area) == t.owner,
            None => false,
        }
    }

    /// Some neighbor lies in a different area
    pub fn area_border(&self, id: TerritoryId) -> bool {
        let Some(territory) = self.get(id) else {
            return false;
        };
        territory
            .neighbors()
            .any(|n| self.territories[n.0].area != territory.area)
    }

    /// Neighbors, optionally filtered
    ///
    /// `friendly`: keep only neighbors whose owner equals (`Some(true)`) or
    /// differs from (`Some(false)`) this territory's owner.
    /// `same_area`: keep only neighbors inside (`Some(true)`) or outside
    /// (`Some(false)`) this territory's area.
    pub fn adjacent(
        &self,
        id: TerritoryId,
        friendly: Option<bool>,
        same_area: Option<bool>,
    ) -> Vec<TerritoryId> {
        let Some(territory) = self.get(id) else {
            return Vec::new();
        };

        territory
            .neighbors()
            .filter(|n| {
                let other = &self.territories[n.0];
                let friendly_ok = friendly.map_or(true, |f| f == (other.owner == territory.owner));
                let area_ok = same_area.map_or(true, |s| s == (other.area == territory.area));
                friendly_ok && area_ok
            })
            .collect()
    }

    /// Sum of forces over `adjacent` with the same filters
    pub fn adjacent_forces(
        &self,
        id: TerritoryId,
        friendly: Option<bool>,
        same_area: Option<bool>,
    ) -> u32 {
        self.adjacent(id, friendly, same_area)
            .into_iter()
            .map(|n| self.territories[n.0].forces)
            .sum()
    }

    /// Check for a direct edge between two territories
    pub fn are_adjacent(&self, a: TerritoryId, b: TerritoryId) -> bool {
        self.get(a).is_some_and(|t| t.neighbors.contains(&b))
    }

    /// Territories owned by a player, in definition order
    pub fn owned_by(&self, player: PlayerId) -> Vec<TerritoryId> {
        self.territories()
            .filter(|(_, t)| t.is_owned_by(player))
            .map(|(id, _)| id)
            .collect()
    }

    /// Number of territories owned by a player
    pub fn territory_count(&self, player: PlayerId) -> usize {
        self.territories
            .iter()
            .filter(|t| t.is_owned_by(player))
            .count()
    }

    // ========================================================================
    // AREA QUERIES
    // ========================================================================

    /// The single player holding every member, if there is one
    pub fn area_owner(&self, id: AreaId) -> Option<PlayerId> {
        let area = self.get_area(id)?;
        let mut owners = area.territories.iter().map(|t| self.territories[t.0].owner);
        let first = owners.next()??;
        owners.all(|o| o == Some(first)).then_some(first)
    }

    /// Total forces stationed in an area
    pub fn area_forces(&self, id: AreaId) -> u32 {
        self.get_area(id).map_or(0, |area| {
            area.territories
                .iter()
                .map(|t| self.territories[t.0].forces)
                .sum()
        })
    }

    /// Areas reachable across one border edge
    pub fn adjacent_areas(&self, id: AreaId) -> BTreeSet<AreaId> {
        let Some(area) = self.get_area(id) else {
            return BTreeSet::new();
        };
        area.territories
            .iter()
            .flat_map(|t| self.territories[t.0].neighbors())
            .map(|n| self.territories[n.0].area)
            .filter(|&a| a != id)
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map_data::MapDefinition;

    fn area(name: &str, value: u32, territories: &[&str]) -> AreaDefinition {
        AreaDefinition {
            name: name.to_string(),
            value,
            territories: territories.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Two areas: north (a, b) and south (c, d), chained a-b-c-d plus a-c
    fn small_world() -> World {
        let areas = vec![area("North", 2, &["a", "b"]), area("South", 3, &["c", "d"])];
        World::load(&areas, "a--b--c--d\n\n  a -- c  \n").unwrap()
    }

    fn id(world: &World, name: &str) -> TerritoryId {
        world.territory_id(name).unwrap()
    }

    fn set_owner(world: &mut World, name: &str, owner: PlayerId, forces: u32) {
        let tid = id(world, name);
        let t = world.get_mut(tid).unwrap();
        t.owner = Some(owner);
        t.forces = forces;
    }

    #[test]
    fn test_load_small_world() {
        let world = small_world();
        assert_eq!(world.len(), 4);
        assert_eq!(world.areas().count(), 2);
        assert!(world.are_adjacent(id(&world, "a"), id(&world, "c")));
        assert!(world.are_adjacent(id(&world, "c"), id(&world, "a")));
        assert!(!world.are_adjacent(id(&world, "a"), id(&world, "d")));
        assert_eq!(world.area("South").unwrap().value, 3);
    }

    #[test]
    fn test_lookup_unknown_names() {
        let world = small_world();
        assert!(world.territory("nowhere").is_none());
        assert!(world.area("nowhere").is_none());
        assert!(world.get(TerritoryId(99)).is_none());
        assert!(!world.border(TerritoryId(99)));
        assert!(world.adjacent(TerritoryId(99), None, None).is_empty());
    }

    #[test]
    fn test_unknown_territory_in_connections() {
        let areas = vec![area("North", 2, &["a", "b"])];
        let err = World::load(&areas, "a--b--zed").unwrap_err();
        assert!(matches!(err, WorldError::UnknownTerritory { ref name, .. } if name == "zed"));
    }

    #[test]
    fn test_duplicate_and_self_connection_rejected() {
        let dup = vec![area("North", 2, &["a", "b"]), area("South", 1, &["a"])];
        assert!(matches!(
            World::load(&dup, ""),
            Err(WorldError::DuplicateTerritory(_))
        ));

        let areas = vec![area("North", 2, &["a", "b"])];
        assert!(matches!(
            World::load(&areas, "a--a"),
            Err(WorldError::SelfConnection(_))
        ));
    }

    #[test]
    fn test_markers_distinct_between_neighbors() {
        let world = MapDefinition::classic().build().unwrap();
        for (_, t) in world.territories() {
            assert!(TERRITORY_MARKERS.contains(&t.marker));
            for n in t.neighbors() {
                assert_ne!(t.marker, world.get(n).unwrap().marker, "{}", t.name);
            }
        }
    }

    #[test]
    fn test_markers_exhausted() {
        // Complete graph on six nodes needs six symbols
        let names = ["a", "b", "c", "d", "e", "f"];
        let areas = vec![area("K6", 1, &names)];
        let mut lines = Vec::new();
        for (i, x) in names.iter().enumerate() {
            for y in &names[i + 1..] {
                lines.push(format!("{}--{}", x, y));
            }
        }
        let result = World::load(&areas, &lines.join("\n"));
        assert!(matches!(result, Err(WorldError::MarkersExhausted(ref t)) if t == "f"));
    }

    #[test]
    fn test_border_and_area_owned() {
        let mut world = small_world();
        let p0 = PlayerId(0);
        let p1 = PlayerId(1);

        // Unowned neighbors never make a border
        set_owner(&mut world, "a", p0, 1);
        assert!(!world.border(id(&world, "a")));

        set_owner(&mut world, "b", p0, 1);
        set_owner(&mut world, "c", p1, 1);
        assert!(world.border(id(&world, "a")));
        assert!(world.border(id(&world, "b")));
        assert!(world.area_owned(id(&world, "a")));
        assert!(!world.area_owned(id(&world, "c")));
        assert_eq!(world.area_owner(AreaId(0)), Some(p0));
        assert_eq!(world.area_owner(AreaId(1)), None);

        set_owner(&mut world, "d", p1, 4);
        assert_eq!(world.area_owner(AreaId(1)), Some(p1));
        assert_eq!(world.area_forces(AreaId(1)), 5);
    }

    #[test]
    fn test_area_border_and_adjacent_areas() {
        let world = small_world();
        assert!(world.area_border(id(&world, "a")));
        assert!(!world.area_border(id(&world, "d")));
        let adjacent: Vec<_> = world.adjacent_areas(AreaId(0)).into_iter().collect();
        assert_eq!(adjacent, vec![AreaId(1)]);
    }

    #[test]
    fn test_adjacent_filters() {
        let mut world = small_world();
        let p0 = PlayerId(0);
        let p1 = PlayerId(1);
        set_owner(&mut world, "a", p0, 2);
        set_owner(&mut world, "b", p0, 3);
        set_owner(&mut world, "c", p1, 5);

        let a = id(&world, "a");
        assert_eq!(world.adjacent(a, None, None).len(), 2);
        assert_eq!(world.adjacent(a, Some(true), None), vec![id(&world, "b")]);
        assert_eq!(world.adjacent(a, Some(false), None), vec![id(&world, "c")]);
        assert_eq!(world.adjacent(a, None, Some(false)), vec![id(&world, "c")]);
        assert!(world.adjacent(a, Some(false), Some(true)).is_empty());

        assert_eq!(world.adjacent_forces(a, None, None), 8);
        assert_eq!(world.adjacent_forces(a, Some(false), None), 5);
    }

    #[test]
    fn test_owned_by() {
        let mut world = small_world();
        set_owner(&mut world, "b", PlayerId(1), 1);
        set_owner(&mut world, "d", PlayerId(1), 1);
        assert_eq!(world.owned_by(PlayerId(1)), vec![TerritoryId(1), TerritoryId(3)]);
        assert_eq!(world.territory_count(PlayerId(1)), 2);
        assert_eq!(world.territory_count(PlayerId(0)), 0);
    }
}
