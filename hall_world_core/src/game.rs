use log::info;

use crate::{
    Direction, GridCoord, PixelPos, PixelRect,
    config::WorldConfig,
    explorer::Explorer,
    grid::GridError,
    hall::Hall,
    random::RandomSource,
    room_map::{MapError, RoomMap},
    transition::{SlideOffsets, TransitionComplete, TransitionController, TransitionState},
};

/// Movement requested for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    Wait,
    Move { dx: i32, dy: i32 },
}

/// Represents the outcome of a movement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    Moved,
    /// A wall or the room edge is in the way.
    Blocked,
    /// A slide is running; input is ignored.
    Frozen,
    /// The move reached a door and a slide has started.
    EnteredDoor(Direction),
}

/// Provides a read-only view of the current room for an explorer.
#[derive(Debug)]
pub struct RoomView<'a> {
    pub coord: GridCoord,
    pub hall: &'a Hall,
    pub player: PixelPos,
    pub hitbox: PixelRect,
}

/// Both halls of a running slide with their draw offsets.
#[derive(Debug)]
pub struct Slide<'a> {
    pub direction: Direction,
    pub source: &'a Hall,
    pub target: &'a Hall,
    pub offsets: SlideOffsets,
}

/// Everything that changes while playing: which room is current, where the
/// player stands, and the slide in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    map: RoomMap,
    current: GridCoord,
    player: PixelPos,
    player_hitbox: i32,
    transition: TransitionController,
}

impl GameState {
    /// Places the player in the middle of `start`.
    ///
    /// The entry offset is checked against the rooms of `map`, which may
    /// differ from the room size named in `config`.
    pub fn new(map: RoomMap, start: GridCoord, config: &WorldConfig) -> Result<Self, MapError> {
        config.validate()?;
        config.check_entry_offset(map.dimensions())?;
        if map.get(start).is_none() {
            return Err(GridError::OutOfBounds {
                coord: start,
                rows: map.rows(),
                cols: map.cols(),
            }
            .into());
        }
        let player = map.dimensions().center();
        info!("Starting in {}", start.room_key());
        Ok(GameState {
            map,
            current: start,
            player,
            player_hitbox: config.player_hitbox,
            transition: TransitionController::from_config(config),
        })
    }

    /// Starts in a room picked uniformly from the map.
    pub fn new_random_start(
        map: RoomMap,
        config: &WorldConfig,
        rng: &mut dyn RandomSource,
    ) -> Result<Self, MapError> {
        let index = rng.next_index(map.len());
        let start = GridCoord::new(index / map.cols(), index % map.cols());
        Self::new(map, start, config)
    }

    /// Builds a whole world from configuration alone.
    pub fn generate(config: &WorldConfig) -> Result<Self, MapError> {
        let mut rng = config.random_source();
        let map = RoomMap::build(config, &mut rng)?;
        Self::new_random_start(map, config, &mut rng)
    }

    pub fn map(&self) -> &RoomMap {
        &self.map
    }

    pub fn current_coord(&self) -> GridCoord {
        self.current
    }

    pub fn current_room_key(&self) -> String {
        self.current.room_key()
    }

    pub fn current_hall(&self) -> &Hall {
        &self.map[self.current]
    }

    pub fn player_position(&self) -> PixelPos {
        self.player
    }

    pub fn player_hitbox(&self) -> PixelRect {
        PixelRect::centered(self.player, self.player_hitbox)
    }

    pub fn transition(&self) -> &TransitionController {
        &self.transition
    }

    /// True while a slide runs; movement and collisions are suspended.
    pub fn is_frozen(&self) -> bool {
        self.transition.is_active()
    }

    pub fn view(&self) -> RoomView<'_> {
        RoomView {
            coord: self.current,
            hall: self.current_hall(),
            player: self.player,
            hitbox: self.player_hitbox(),
        }
    }

    /// Moves the player, refusing moves into walls, then checks the doors of
    /// the current hall.
    pub fn move_player(&mut self, dx: i32, dy: i32) -> MoveResult {
        if self.is_frozen() {
            return MoveResult::Frozen;
        }
        let next = PixelPos::new(self.player.x + dx, self.player.y + dy);
        let hitbox = PixelRect::centered(next, self.player_hitbox);
        let hall = &self.map[self.current];
        if hall.blocks(&hitbox) {
            return MoveResult::Blocked;
        }
        let door = hall.door_at(&hitbox);
        self.player = next;

        match door {
            Some(direction) if self.on_door_collision(direction) => {
                MoveResult::EnteredDoor(direction)
            }
            _ => MoveResult::Moved,
        }
    }

    /// Input side of the collaborator surface: the player touched the door
    /// on side `direction` of the current room.
    pub fn on_door_collision(&mut self, direction: Direction) -> bool {
        self.transition
            .on_door_collision(self.current, direction, &self.map)
    }

    /// Advances a running slide. On completion the target becomes the current
    /// room and the player is moved to the arrival position.
    pub fn tick(&mut self) -> Option<TransitionComplete> {
        let done = self.transition.tick(self.map.dimensions())?;
        self.current = done.room;
        self.player = done.player_position;
        Some(done)
    }

    /// One fixed-rate update: either the slide advances or the player moves,
    /// never both.
    pub fn update(&mut self, step: Step) -> Option<TransitionComplete> {
        if self.is_frozen() {
            return self.tick();
        }
        if let Step::Move { dx, dy } = step {
            self.move_player(dx, dy);
        }
        None
    }

    /// Lets an explorer pick this tick's step.
    pub fn process_explorer(&mut self, explorer: &mut dyn Explorer) -> Option<TransitionComplete> {
        let step = if self.is_frozen() {
            Step::Wait
        } else {
            explorer.next_step(&self.view())
        };
        self.update(step)
    }

    pub fn slide(&self) -> Option<Slide<'_>> {
        let TransitionState::Sliding {
            direction,
            source,
            target,
            ..
        } = self.transition.state()
        else {
            return None;
        };
        Some(Slide {
            direction,
            source: &self.map[source],
            target: &self.map[target],
            offsets: self.transition.offsets(self.map.dimensions())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ConfigError,
        doors::{DoorFlags, DoorGrid},
        random::{ScriptedRandom, SeededRandom},
    };

    fn column_state() -> GameState {
        let config = WorldConfig::default();
        let door_grid = DoorGrid::from_flags(
            2,
            1,
            vec![
                DoorFlags {
                    down: true,
                    ..DoorFlags::default()
                },
                DoorFlags {
                    up: true,
                    ..DoorFlags::default()
                },
            ],
        )
        .unwrap();
        let map = RoomMap::from_door_grid(door_grid, &config, &mut ScriptedRandom::exhausted())
            .unwrap();
        GameState::new(map, GridCoord::new(0, 0), &config).unwrap()
    }

    /// Walks from the room centre into the down door.
    fn walk_into_down_door(state: &mut GameState) {
        assert_eq!(state.move_player(32, 0), MoveResult::Moved);
        for _ in 0..100 {
            match state.move_player(0, 8) {
                MoveResult::Moved => continue,
                MoveResult::EnteredDoor(direction) => {
                    assert_eq!(direction, Direction::Down);
                    return;
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        panic!("never reached the door");
    }

    #[test]
    fn walking_through_the_down_door() {
        let mut state = column_state();
        assert_eq!(state.player_position(), PixelPos::new(640, 352));
        walk_into_down_door(&mut state);
        assert!(state.is_frozen());

        let mut completed = None;
        for _ in 0..100 {
            if let Some(done) = state.update(Step::Move { dx: 8, dy: 0 }) {
                completed = Some(done);
                break;
            }
        }
        let done = completed.unwrap();
        assert_eq!(done.room_key, "room_1_0");
        assert_eq!(state.current_coord(), GridCoord::new(1, 0));
        assert_eq!(state.player_position(), PixelPos::new(672, 96));
        assert!(!state.is_frozen());

        // The arrival spot does not touch the door just used.
        assert_eq!(state.current_hall().door_at(&state.player_hitbox()), None);
    }

    #[test]
    fn input_is_frozen_while_sliding() {
        let mut state = column_state();
        walk_into_down_door(&mut state);
        let position = state.player_position();
        assert_eq!(state.move_player(0, -8), MoveResult::Frozen);
        assert!(!state.on_door_collision(Direction::Down));
        state.update(Step::Move { dx: 0, dy: -8 });
        assert_eq!(state.player_position(), position);
        assert_eq!(state.current_coord(), GridCoord::new(0, 0));
    }

    #[test]
    fn door_into_nothing_changes_nothing() {
        let mut state = column_state();
        let before = state.clone();
        assert!(!state.on_door_collision(Direction::Up));
        assert_eq!(state, before);
        assert!(!state.on_door_collision(Direction::Up));
        assert_eq!(state, before);
    }

    #[test]
    fn walls_block_movement() {
        let mut state = column_state();
        let mut blocked = false;
        for _ in 0..100 {
            if state.move_player(-16, 0) == MoveResult::Blocked {
                blocked = true;
                break;
            }
        }
        assert!(blocked);
        assert!(state.player_hitbox().x >= 64);
    }

    #[test]
    fn start_must_be_on_the_map() {
        let state = column_state();
        let config = WorldConfig::default();
        assert!(matches!(
            GameState::new(state.map().clone(), GridCoord::new(2, 0), &config),
            Err(MapError::Grid(GridError::OutOfBounds { .. }))
        ));
    }

    #[test]
    fn entry_offset_must_fit_the_built_rooms() {
        let small = WorldConfig {
            grid_rows: 1,
            grid_cols: 2,
            room_width: 3,
            room_height: 3,
            ..WorldConfig::default()
        };
        let map = RoomMap::build(&small, &mut ScriptedRandom::exhausted()).unwrap();
        let roomy = WorldConfig {
            entry_offset: 100,
            ..WorldConfig::default()
        };
        assert_eq!(
            GameState::new(map.clone(), GridCoord::new(0, 0), &roomy),
            Err(MapError::Config(ConfigError::EntryOffsetTooLarge {
                entry_offset: 100,
                maximum: 72,
            }))
        );
        assert!(GameState::new(map, GridCoord::new(0, 1), &small).is_ok());
    }

    #[test]
    fn random_start_lands_on_the_map() {
        let config = WorldConfig {
            seed: Some(4),
            ..WorldConfig::default()
        };
        let mut rng = SeededRandom::new(4);
        let map = RoomMap::build(&config, &mut rng).unwrap();
        let state = GameState::new_random_start(map, &config, &mut rng).unwrap();
        assert!(state.map().get(state.current_coord()).is_some());
        assert!(GameState::generate(&config).is_ok());
    }

    #[test]
    fn slide_exposes_both_halls() {
        let mut state = column_state();
        assert!(state.slide().is_none());
        walk_into_down_door(&mut state);
        state.tick();
        let slide = state.slide().unwrap();
        assert_eq!(slide.direction, Direction::Down);
        assert!(slide.source.doors().down);
        assert!(slide.target.doors().up);
        assert_eq!(slide.offsets.source, PixelPos::new(0, -20));
    }
}
