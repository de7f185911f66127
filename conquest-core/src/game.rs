//! Rules engine: the single writer of match state
//!
//! Every mutating operation is atomic. A refused operation returns a
//! `RuleViolation` and changes nothing; a successful one commits its change and
//! queues exactly one `Event` in the outbox, which the owner drains with
//! `take_events`.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RuleViolation, SetupError};
use crate::event::{Event, EventKind, EventValue};
use crate::rng::{GameRng, RngMode};
use crate::world::{Territory, TerritoryId, World};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Smallest supported match
pub const MIN_PLAYERS: usize = 2;

/// Largest supported match (one marker symbol per player)
pub const MAX_PLAYERS: usize = 6;

/// Dice cap for the attacking side
const ATTACK_DICE: u32 = 3;

/// Dice cap for the defending side
const DEFEND_DICE: u32 = 2;

const DIE_FACES: i32 = 6;

/// Floor of the per-turn reinforcement entitlement
const MIN_REINFORCEMENTS: u32 = 3;

/// Owned territories per reinforcement unit
const TERRITORIES_PER_REINFORCEMENT: u32 = 3;

// ============================================================================
// PLAYERS
// ============================================================================

/// Stable key of a player (index into the player list)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub usize);

/// Match participant
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    /// 1-based display index in turn order, 0 until assigned
    pub color: usize,
    /// Display marker, blank until assigned
    pub marker: char,
}

impl Player {
    fn new(name: String) -> Self {
        Self {
            name,
            color: 0,
            marker: ' ',
        }
    }
}

// ============================================================================
// COMBAT
// ============================================================================

/// Result of one `resolve_combat` call that passed the legality checks
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombatOutcome {
    /// Destination changed hands
    pub conquered: bool,
    pub attacker: PlayerId,
    /// Destination owner before the battle
    pub defender: Option<PlayerId>,
    pub source: TerritoryId,
    pub destination: TerritoryId,
    /// (attacker, defender) forces before the first roll
    pub initial: (u32, u32),
    /// (source, destination) forces once the battle is settled
    pub after: (u32, u32),
    /// Dice rounds fought
    pub rounds: u32,
}

// ============================================================================
// GAME
// ============================================================================

/// Authoritative match state
#[derive(Clone, Debug)]
pub struct Game {
    world: World,
    players: Vec<Player>,
    rng: GameRng,
    seed: u32,
    events: Vec<Event>,
}

impl Game {
    /// Start a match on `world` with the given player names
    ///
    /// Without a seed one is drawn from OS entropy and logged, so the match
    /// can still be replayed.
    pub fn new(
        world: World,
        names: Vec<String>,
        seed: Option<u32>,
        mode: RngMode,
    ) -> Result<Self, SetupError> {
        if world.is_empty() {
            return Err(SetupError::EmptyWorld);
        }
        if names.len() < MIN_PLAYERS {
            return Err(SetupError::TooFewPlayers {
                min: MIN_PLAYERS,
                got: names.len(),
            });
        }
        if names.len() > MAX_PLAYERS {
            return Err(SetupError::TooManyPlayers {
                max: MAX_PLAYERS,
                got: names.len(),
            });
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(SetupError::DuplicatePlayer(name.clone()));
            }
        }

        let rng = match seed {
            Some(seed) => GameRng::with_mode(seed, mode),
            None => {
                let rng = GameRng::from_entropy(mode);
                info!(seed = rng.last_seed(), "No seed given, drew one from entropy");
                rng
            }
        };

        Ok(Self {
            world,
            players: names.into_iter().map(Player::new).collect(),
            seed: rng.last_seed(),
            rng,
            events: Vec::new(),
        })
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Read-only view of the map
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Seed the match generator started from
    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.0)
    }

    /// Player keys in construction order
    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        (0..self.players.len()).map(PlayerId)
    }

    pub fn find_player(&self, name: &str) -> Option<PlayerId> {
        self.players.iter().position(|p| p.name == name).map(PlayerId)
    }

    /// Name of a player, empty for an unknown key
    pub fn player_name(&self, id: PlayerId) -> &str {
        self.player(id).map_or("", |p| p.name.as_str())
    }

    pub fn territory_count(&self, player: PlayerId) -> usize {
        self.world.territory_count(player)
    }

    /// Territories owned by `player`, in definition order
    pub fn owned_territories(&self, player: PlayerId) -> Vec<TerritoryId> {
        self.world.owned_by(player)
    }

    /// A player is alive while owning at least one territory
    pub fn is_alive(&self, player: PlayerId) -> bool {
        self.world.territories().any(|(_, t)| t.is_owned_by(player))
    }

    pub fn alive_players(&self) -> Vec<PlayerId> {
        self.player_ids().filter(|&p| self.is_alive(p)).collect()
    }

    /// Forces granted at the start of a turn
    ///
    /// `max(owned / 3, 3)` plus the bonus of every area the player holds.
    pub fn reinforcement_count(&self, player: PlayerId) -> u32 {
        let owned = self.territory_count(player) as u32;
        let base = (owned / TERRITORIES_PER_REINFORCEMENT).max(MIN_REINFORCEMENTS);
        let bonus: u32 = self
            .world
            .areas()
            .filter(|&(id, _)| self.world.area_owner(id) == Some(player))
            .map(|(_, area)| area.value)
            .sum();
        base + bonus
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Take an unowned territory, or add forces to one already held
    pub fn claim(
        &mut self,
        player: PlayerId,
        territory: TerritoryId,
        forces: u32,
    ) -> Result<(), RuleViolation> {
        self.check_player(player)?;
        let current = self.territory_ref(territory)?;
        match current.owner() {
            Some(owner) if owner != player => return Err(RuleViolation::OwnedByOther(territory)),
            None if forces == 0 => return Err(RuleViolation::ZeroForces),
            _ => {}
        }

        let t = self.territory_mut(territory)?;
        t.owner = Some(player);
        t.forces = t.forces.saturating_add(forces);

        self.emit(EventKind::Claim, vec![
            self.player_name(player).into(),
            self.world.name_of(territory).into(),
            forces.into(),
        ]);
        Ok(())
    }

    /// Add forces to a territory the player holds
    pub fn reinforce(
        &mut self,
        player: PlayerId,
        territory: TerritoryId,
        forces: u32,
    ) -> Result<(), RuleViolation> {
        self.check_player(player)?;
        if !self.territory_ref(territory)?.is_owned_by(player) {
            return Err(RuleViolation::NotOwned(territory));
        }

        let t = self.territory_mut(territory)?;
        t.forces = t.forces.saturating_add(forces);

        self.emit(EventKind::Reinforce, vec![
            self.player_name(player).into(),
            self.world.name_of(territory).into(),
            forces.into(),
        ]);
        Ok(())
    }

    /// Shift forces between two territories the player holds
    ///
    /// The source always keeps at least one unit.
    pub fn move_forces(
        &mut self,
        player: PlayerId,
        source: TerritoryId,
        destination: TerritoryId,
        forces: u32,
    ) -> Result<(), RuleViolation> {
        self.check_player(player)?;
        let available = {
            let src = self.territory_ref(source)?;
            if !src.is_owned_by(player) {
                return Err(RuleViolation::NotOwned(source));
            }
            src.forces()
        };
        if !self.territory_ref(destination)?.is_owned_by(player) {
            return Err(RuleViolation::NotOwned(destination));
        }
        if forces >= available {
            return Err(RuleViolation::InsufficientForces {
                available,
                requested: forces,
            });
        }

        self.territory_mut(source)?.forces -= forces;
        self.territory_mut(destination)?.forces += forces;

        self.emit(EventKind::Move, vec![
            self.player_name(player).into(),
            self.world.name_of(source).into(),
            self.world.name_of(destination).into(),
            forces.into(),
        ]);
        Ok(())
    }

    /// Attack with the default decisions: fight to the end, move everything
    pub fn attack(
        &mut self,
        source: TerritoryId,
        destination: TerritoryId,
    ) -> Result<CombatOutcome, RuleViolation> {
        self.resolve_combat(source, destination, |_, _| true, |a| a - 1)
    }

    /// Multi-round dice battle from `source` into `destination`
    ///
    /// `keep_attacking(attackers, defenders)` is consulted before every round.
    /// On conquest `move_amount(attackers)` picks how many units advance; the
    /// answer is clamped to `[min(attackers - 1, 3), attackers - 1]`.
    pub fn resolve_combat<C, M>(
        &mut self,
        source: TerritoryId,
        destination: TerritoryId,
        mut keep_attacking: C,
        move_amount: M,
    ) -> Result<CombatOutcome, RuleViolation>
    where
        C: FnMut(u32, u32) -> bool,
        M: FnOnce(u32) -> u32,
    {
        let src = self.territory_ref(source)?;
        let dst = self.territory_ref(destination)?;
        let attacker = src.owner().ok_or(RuleViolation::Unowned(source))?;
        let defender = dst.owner();
        if defender == Some(attacker) {
            return Err(RuleViolation::SameOwner(source, destination));
        }
        if !self.world.are_adjacent(source, destination) {
            return Err(RuleViolation::NotAdjacent(source, destination));
        }
        // A single unit cannot occupy an empty territory
        if src.forces() < 2 && dst.forces() == 0 {
            return Err(RuleViolation::TooFewAttackers(source));
        }

        let initial = (src.forces(), dst.forces());
        let (mut atk, mut def) = initial;
        let mut rounds = 0;

        while atk > 1 && def > 0 && keep_attacking(atk, def) {
            let atk_roll = self.roll((atk - 1).min(ATTACK_DICE));
            let def_roll = self.roll(def.min(DEFEND_DICE));
            for (a, d) in atk_roll.iter().zip(&def_roll) {
                // Ties go to the defender
                if a > d {
                    def -= 1;
                } else {
                    atk -= 1;
                }
            }
            rounds += 1;
        }

        let conquered = def == 0;
        let after = if conquered {
            let max_move = atk - 1;
            let min_move = max_move.min(ATTACK_DICE);
            let moved = move_amount(atk).clamp(min_move, max_move);
            (atk - moved, moved)
        } else {
            (atk, def)
        };

        {
            let t = self.territory_mut(source)?;
            t.forces = after.0;
        }
        {
            let t = self.territory_mut(destination)?;
            t.forces = after.1;
            if conquered {
                t.owner = Some(attacker);
            }
        }

        let defender_name = defender.map_or("", |p| self.player_name(p));
        let args: Vec<EventValue> = vec![
            self.player_name(attacker).into(),
            defender_name.into(),
            self.world.name_of(source).into(),
            self.world.name_of(destination).into(),
            initial.into(),
            after.into(),
        ];
        let kind = if conquered {
            EventKind::Conquer
        } else {
            EventKind::Defeat
        };
        self.emit(kind, args);

        Ok(CombatOutcome {
            conquered,
            attacker,
            defender,
            source,
            destination,
            initial,
            after,
            rounds,
        })
    }

    /// Announce the winner; changes no state
    pub fn victory(&mut self, player: PlayerId) -> Result<(), RuleViolation> {
        self.check_player(player)?;
        self.emit(EventKind::Victory, vec![self.player_name(player).into()]);
        Ok(())
    }

    // ========================================================================
    // EVENTS AND RANDOMNESS
    // ========================================================================

    /// Drain committed events in commit order
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Committed events not yet drained
    pub fn pending_events(&self) -> &[Event] {
        &self.events
    }

    /// Restart the match generator from a new seed
    pub fn reseed(&mut self, seed: u32) {
        self.seed = seed;
        self.rng.seed(seed);
    }

    pub fn rng_mode(&self) -> RngMode {
        self.rng.mode()
    }

    /// Switch generator algorithm, restarting from the last seed
    pub fn set_rng_mode(&mut self, mode: RngMode) {
        self.rng.set_mode(mode);
    }

    pub(crate) fn rng_mut(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    pub(crate) fn assign_display(&mut self, player: PlayerId, color: usize, marker: char) {
        if let Some(p) = self.players.get_mut(player.0) {
            p.color = color;
            p.marker = marker;
        }
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn roll(&mut self, dice: u32) -> Vec<u32> {
        let mut rolls: Vec<u32> = (0..dice)
            .map(|_| self.rng.int_in_range(1, DIE_FACES) as u32)
            .collect();
        rolls.sort_unstable_by(|a, b| b.cmp(a));
        rolls
    }

    fn emit(&mut self, kind: EventKind, args: Vec<EventValue>) {
        let event = Event::new(kind, args);
        debug!(%event, "Committed");
        self.events.push(event);
    }

    fn check_player(&self, player: PlayerId) -> Result<(), RuleViolation> {
        match self.player(player) {
            Some(_) => Ok(()),
            None => Err(RuleViolation::UnknownPlayer(player)),
        }
    }

    fn territory_ref(&self, id: TerritoryId) -> Result<&Territory, RuleViolation> {
        self.world.get(id).ok_or(RuleViolation::UnknownTerritory(id))
    }

    fn territory_mut(&mut self, id: TerritoryId) -> Result<&mut Territory, RuleViolation> {
        self.world.get_mut(id).ok_or(RuleViolation::UnknownTerritory(id))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map_data::{AreaDefinition, MapDefinition};

    const ALICE: PlayerId = PlayerId(0);
    const BOB: PlayerId = PlayerId(1);

    /// North (a, b) and South (c, d), chained a-b-c-d plus a-c
    fn small_game(seed: u32) -> Game {
        let areas = vec![
            AreaDefinition {
                name: "North".to_string(),
                value: 2,
                territories: vec!["a".to_string(), "b".to_string()],
            },
            AreaDefinition {
                name: "South".to_string(),
                value: 3,
                territories: vec!["c".to_string(), "d".to_string()],
            },
        ];
        let world = World::load(&areas, "a--b--c--d\na--c").unwrap();
        Game::new(
            world,
            vec!["Alice".to_string(), "Bob".to_string()],
            Some(seed),
            RngMode::Reference,
        )
        .unwrap()
    }

    fn tid(game: &Game, name: &str) -> TerritoryId {
        game.world().territory_id(name).unwrap()
    }

    fn forces(game: &Game, name: &str) -> u32 {
        game.world().territory(name).unwrap().forces()
    }

    #[test]
    fn test_unseeded_game_records_its_seed() {
        let world = MapDefinition::classic().build().unwrap();
        let names = vec!["Alice".to_string(), "Bob".to_string()];
        let mut fresh = Game::new(world.clone(), names.clone(), None, RngMode::Reference).unwrap();
        let mut replay = Game::new(world, names, Some(fresh.seed()), RngMode::Reference).unwrap();

        assert_eq!(fresh.rng_mut().last_seed(), fresh.seed());
        for _ in 0..20 {
            assert_eq!(fresh.rng_mut().bounded_int(6), replay.rng_mut().bounded_int(6));
        }
    }

    #[test]
    fn test_setup_validation() {
        let world = MapDefinition::classic().build().unwrap();
        let one = Game::new(world.clone(), vec!["a".to_string()], Some(1), RngMode::Reference);
        assert!(matches!(one, Err(SetupError::TooFewPlayers { got: 1, .. })));

        let seven: Vec<String> = (0..7).map(|i| format!("p{}", i)).collect();
        let many = Game::new(world.clone(), seven, Some(1), RngMode::Reference);
        assert!(matches!(many, Err(SetupError::TooManyPlayers { got: 7, .. })));

        let dup = Game::new(world, vec!["x".to_string(), "x".to_string()], Some(1), RngMode::Reference);
        assert!(matches!(dup, Err(SetupError::DuplicatePlayer(ref n)) if n == "x"));

        let empty = Game::new(World::default(), vec!["a".into(), "b".into()], Some(1), RngMode::Reference);
        assert!(matches!(empty, Err(SetupError::EmptyWorld)));
    }

    #[test]
    fn test_find_player() {
        let game = small_game(1);
        assert_eq!(game.find_player("Bob"), Some(BOB));
        assert_eq!(game.find_player("Carol"), None);
        assert_eq!(game.player_name(ALICE), "Alice");
        assert_eq!(game.seed(), 1);
    }

    #[test]
    fn test_claim_rules() {
        let mut game = small_game(1);
        let a = tid(&game, "a");

        game.claim(ALICE, a, 1).unwrap();
        game.claim(ALICE, a, 2).unwrap();
        assert_eq!(forces(&game, "a"), 3);

        assert_eq!(game.claim(BOB, a, 1), Err(RuleViolation::OwnedByOther(a)));
        assert_eq!(forces(&game, "a"), 3);
        assert_eq!(game.world().get(a).unwrap().owner(), Some(ALICE));

        let b = tid(&game, "b");
        assert_eq!(game.claim(BOB, b, 0), Err(RuleViolation::ZeroForces));
        assert!(game.world().get(b).unwrap().owner().is_none());

        assert_eq!(game.claim(PlayerId(9), b, 1), Err(RuleViolation::UnknownPlayer(PlayerId(9))));
        assert_eq!(
            game.claim(ALICE, TerritoryId(99), 1),
            Err(RuleViolation::UnknownTerritory(TerritoryId(99)))
        );

        let events = game.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].to_string(), "claim(Alice, a, 1)");
        assert_eq!(events[1].to_string(), "claim(Alice, a, 2)");
        assert!(game.take_events().is_empty());
    }

    #[test]
    fn test_reinforce_rules() {
        let mut game = small_game(1);
        let a = tid(&game, "a");
        let b = tid(&game, "b");
        game.claim(ALICE, a, 1).unwrap();
        game.claim(BOB, b, 1).unwrap();
        game.take_events();

        assert_eq!(game.reinforce(ALICE, b, 3), Err(RuleViolation::NotOwned(b)));
        assert_eq!(game.reinforce(ALICE, tid(&game, "c"), 3), Err(RuleViolation::NotOwned(tid(&game, "c"))));
        game.reinforce(ALICE, a, 4).unwrap();
        assert_eq!(forces(&game, "a"), 5);

        let events = game.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Reinforce);
        assert_eq!(events[0].int(2), Some(4));
    }

    #[test]
    fn test_move_rules() {
        let mut game = small_game(1);
        let (a, b, c) = (tid(&game, "a"), tid(&game, "b"), tid(&game, "c"));
        game.claim(ALICE, a, 4).unwrap();
        game.claim(ALICE, b, 1).unwrap();
        game.claim(BOB, c, 1).unwrap();
        game.take_events();

        assert_eq!(
            game.move_forces(ALICE, a, b, 4),
            Err(RuleViolation::InsufficientForces { available: 4, requested: 4 })
        );
        assert_eq!(game.move_forces(ALICE, a, c, 1), Err(RuleViolation::NotOwned(c)));
        assert_eq!(game.move_forces(BOB, a, b, 1), Err(RuleViolation::NotOwned(a)));
        assert!(game.take_events().is_empty());

        game.move_forces(ALICE, a, b, 3).unwrap();
        assert_eq!(forces(&game, "a"), 1);
        assert_eq!(forces(&game, "b"), 4);
        assert_eq!(game.take_events()[0].to_string(), "move(Alice, a, b, 3)");
    }

    #[test]
    fn test_reinforcement_count() {
        let mut game = small_game(1);
        // Unowned players still get the floor
        assert_eq!(game.reinforcement_count(ALICE), 3);

        game.claim(ALICE, tid(&game, "a"), 1).unwrap();
        game.claim(ALICE, tid(&game, "b"), 1).unwrap();
        assert_eq!(game.reinforcement_count(ALICE), 3 + 2);

        game.claim(BOB, tid(&game, "c"), 1).unwrap();
        game.claim(ALICE, tid(&game, "d"), 1).unwrap();
        assert_eq!(game.reinforcement_count(ALICE), 3 + 2);
        assert_eq!(game.reinforcement_count(BOB), 3);
    }

    #[test]
    fn test_reinforcement_count_scales_with_territories() {
        let world = MapDefinition::classic().build().unwrap();
        let mut game = Game::new(world, vec!["A".into(), "B".into()], Some(3), RngMode::Reference).unwrap();
        let asia: Vec<TerritoryId> = game.world().area("Asia").unwrap().territories().to_vec();
        for t in asia {
            game.claim(ALICE, t, 1).unwrap();
        }
        let peru = game.world().territory_id("Peru").unwrap();
        game.claim(ALICE, peru, 1).unwrap();
        // 13 territories / 3 = 4, plus Asia's 7
        assert_eq!(game.reinforcement_count(ALICE), 11);
    }

    #[test]
    fn test_combat_legality() {
        let mut game = small_game(1);
        let (a, b, c, d) = (tid(&game, "a"), tid(&game, "b"), tid(&game, "c"), tid(&game, "d"));

        assert_eq!(game.attack(a, b), Err(RuleViolation::Unowned(a)));

        game.claim(ALICE, a, 5).unwrap();
        game.claim(ALICE, b, 1).unwrap();
        game.claim(BOB, d, 1).unwrap();
        game.take_events();

        assert_eq!(game.attack(a, b), Err(RuleViolation::SameOwner(a, b)));
        assert_eq!(game.attack(a, d), Err(RuleViolation::NotAdjacent(a, d)));
        assert_eq!(game.attack(b, c), Err(RuleViolation::TooFewAttackers(b)));
        assert_eq!(forces(&game, "b"), 1);
        assert_eq!(game.attack(a, TerritoryId(42)), Err(RuleViolation::UnknownTerritory(TerritoryId(42))));
        assert!(game.take_events().is_empty());
        assert_eq!(forces(&game, "a"), 5);
    }

    #[test]
    fn test_single_unit_attack_is_a_defeat() {
        let mut game = small_game(42);
        let (a, b) = (tid(&game, "a"), tid(&game, "b"));
        game.claim(ALICE, a, 1).unwrap();
        game.claim(BOB, b, 1).unwrap();
        game.take_events();

        let outcome = game.attack(a, b).unwrap();
        assert!(!outcome.conquered);
        assert_eq!(outcome.initial, (1, 1));
        assert_eq!(outcome.after, (1, 1));
        assert_eq!(outcome.rounds, 0);

        let events = game.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].to_string(), "defeat(Alice, Bob, a, b, (1, 1), (1, 1))");
        assert_eq!(forces(&game, "a"), 1);
        assert_eq!(forces(&game, "b"), 1);
    }

    #[test]
    fn test_combat_seed_42_defeat() {
        // Rolls for seed 42: attacker 6 1 1 vs 6 3, then 2 vs 2 2
        let mut game = small_game(42);
        let (a, c) = (tid(&game, "a"), tid(&game, "c"));
        game.claim(ALICE, a, 4).unwrap();
        game.claim(BOB, c, 2).unwrap();
        game.take_events();

        let outcome = game.attack(a, c).unwrap();
        assert!(!outcome.conquered);
        assert_eq!(outcome.initial, (4, 2));
        assert_eq!(outcome.after, (1, 2));
        assert_eq!(outcome.rounds, 2);

        let events = game.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].to_string(), "defeat(Alice, Bob, a, c, (4, 2), (1, 2))");
    }

    #[test]
    fn test_combat_seed_42_conquest() {
        // Rolls for seed 42: 6 1 1 vs 6 (tie), then 3 2 2 vs 2
        let mut game = small_game(42);
        let (a, c) = (tid(&game, "a"), tid(&game, "c"));
        game.claim(ALICE, a, 10).unwrap();
        game.claim(BOB, c, 1).unwrap();
        game.take_events();

        let outcome = game.attack(a, c).unwrap();
        assert!(outcome.conquered);
        assert_eq!(outcome.defender, Some(BOB));
        assert_eq!(outcome.after, (1, 8));
        assert_eq!(game.world().get(c).unwrap().owner(), Some(ALICE));
        assert_eq!(
            game.take_events()[0].to_string(),
            "conquer(Alice, Bob, a, c, (10, 1), (1, 8))"
        );
    }

    #[test]
    fn test_conquer_unowned_territory() {
        let mut game = small_game(5);
        let (a, b) = (tid(&game, "a"), tid(&game, "b"));
        game.claim(ALICE, a, 3).unwrap();
        game.take_events();

        let outcome = game.attack(a, b).unwrap();
        assert!(outcome.conquered);
        assert_eq!(outcome.rounds, 0);
        assert_eq!(outcome.after, (1, 2));
        assert_eq!(game.take_events()[0].text(1), Some(""));
    }

    #[test]
    fn test_combat_invariants_over_many_seeds() {
        for seed in 0..300u32 {
            let mut game = small_game(seed);
            let (a, c) = (tid(&game, "a"), tid(&game, "c"));
            let atk = 2 + seed % 12;
            let def = 1 + seed % 7;
            game.claim(ALICE, a, atk).unwrap();
            game.claim(BOB, c, def).unwrap();
            game.take_events();

            let mut last_atk = atk;
            let outcome = game
                .resolve_combat(
                    a,
                    c,
                    |a, _| {
                        assert!(a <= last_atk);
                        last_atk = a;
                        true
                    },
                    |a| a - 1,
                )
                .unwrap();

            let (src, dst) = outcome.after;
            assert!(src >= 1);
            if outcome.conquered {
                let remaining = src + dst;
                assert!(remaining <= atk);
                assert!(dst >= (remaining - 1).min(3) && dst <= remaining - 1);
            } else {
                assert!(src <= atk && dst <= def);
            }

            let events = game.take_events();
            assert_eq!(events.len(), 1);
            let expected = if outcome.conquered { EventKind::Conquer } else { EventKind::Defeat };
            assert_eq!(events[0].kind, expected);
        }
    }

    #[test]
    fn test_move_amount_clamped() {
        // Nine attackers remain after the seed-42 battle
        for (requested, expected) in [(0, (6, 3)), (100, (1, 8)), (5, (4, 5))] {
            let mut game = small_game(42);
            let (a, c) = (tid(&game, "a"), tid(&game, "c"));
            game.claim(ALICE, a, 10).unwrap();
            game.claim(BOB, c, 1).unwrap();

            let outcome = game.resolve_combat(a, c, |_, _| true, |_| requested).unwrap();
            assert!(outcome.conquered);
            assert_eq!(outcome.after, expected);
        }
    }

    #[test]
    fn test_declined_attack_is_a_defeat() {
        let mut game = small_game(42);
        let (a, c) = (tid(&game, "a"), tid(&game, "c"));
        game.claim(ALICE, a, 6).unwrap();
        game.claim(BOB, c, 2).unwrap();
        game.take_events();

        let outcome = game.resolve_combat(a, c, |_, _| false, |a| a - 1).unwrap();
        assert!(!outcome.conquered);
        assert_eq!(outcome.rounds, 0);
        assert_eq!(outcome.after, (6, 2));
        assert_eq!(game.take_events()[0].kind, EventKind::Defeat);
    }

    #[test]
    fn test_alive_players_and_victory() {
        let mut game = small_game(1);
        game.claim(BOB, tid(&game, "d"), 1).unwrap();
        assert!(!game.is_alive(ALICE));
        assert!(game.is_alive(BOB));
        assert_eq!(game.alive_players(), vec![BOB]);

        game.take_events();
        game.victory(BOB).unwrap();
        assert_eq!(game.take_events()[0].to_string(), "victory(Bob)");
        assert!(game.victory(PlayerId(5)).is_err());
    }

    #[test]
    fn test_reseed_and_mode() {
        let mut game = small_game(42);
        game.reseed(7);
        assert_eq!(game.seed(), 7);
        assert_eq!(game.rng_mut().bounded_uint(5), 10);

        game.set_rng_mode(RngMode::ChaCha);
        assert_eq!(game.rng_mode(), RngMode::ChaCha);
    }
}
