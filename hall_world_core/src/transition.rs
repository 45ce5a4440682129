use log::{debug, info, trace};

use crate::{
    Direction, GridCoord, PixelPos, config::WorldConfig, hall::RoomDimensions, room_map::RoomMap,
};

/// Where the room-to-room slide stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionState {
    #[default]
    Idle,
    Sliding {
        direction: Direction,
        /// Pixels travelled so far.
        progress: i32,
        source: GridCoord,
        target: GridCoord,
    },
}

/// Emitted once a slide has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionComplete {
    pub room: GridCoord,
    pub room_key: String,
    pub direction: Direction,
    /// Where the player now stands in the new room.
    pub player_position: PixelPos,
}

/// Draw offsets of the two halls during a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideOffsets {
    pub source: PixelPos,
    pub target: PixelPos,
}

/// Drives the slide between adjacent rooms.
///
/// Idle until a door collision names a room that exists, then advances a
/// fixed number of pixels per tick until the travel distance is covered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionController {
    state: TransitionState,
    step: i32,
    entry_offset: i32,
}

impl TransitionController {
    pub fn new(step: i32, entry_offset: i32) -> Self {
        TransitionController {
            state: TransitionState::Idle,
            step,
            entry_offset,
        }
    }

    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.transition_step, config.entry_offset)
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TransitionState::Sliding { .. })
    }

    /// Starts a slide from `current` through the door on side `direction`.
    ///
    /// Returns `false` and leaves the controller untouched when already
    /// sliding or when the map has no room on that side.
    pub fn on_door_collision(
        &mut self,
        current: GridCoord,
        direction: Direction,
        map: &RoomMap,
    ) -> bool {
        if self.is_active() {
            return false;
        }
        let Some(target) = map
            .neighbor(current, direction)
            .filter(|coord| map.get(*coord).is_some())
        else {
            trace!("No room {} of {}, staying put", direction, current);
            return false;
        };

        self.state = TransitionState::Sliding {
            direction,
            progress: 0,
            source: current,
            target,
        };
        debug!("Sliding {} from {} to {}", direction, current, target);
        true
    }

    /// Advances an active slide by one step.
    ///
    /// Returns the completion event on the tick the travel distance is
    /// reached; the controller is idle again afterwards.
    pub fn tick(&mut self, dimensions: RoomDimensions) -> Option<TransitionComplete> {
        let TransitionState::Sliding {
            direction,
            progress,
            source,
            target,
        } = self.state
        else {
            return None;
        };

        let progress = progress + self.step;
        if progress < dimensions.travel_distance(direction) {
            self.state = TransitionState::Sliding {
                direction,
                progress,
                source,
                target,
            };
            return None;
        }

        self.state = TransitionState::Idle;
        let player_position = arrival_position(dimensions, direction, self.entry_offset);
        let room_key = target.room_key();
        info!(
            "Entered {} going {}, player at ({}, {})",
            room_key, direction, player_position.x, player_position.y
        );
        Some(TransitionComplete {
            room: target,
            room_key,
            direction,
            player_position,
        })
    }

    /// Offsets for drawing source and target hall while sliding.
    pub fn offsets(&self, dimensions: RoomDimensions) -> Option<SlideOffsets> {
        match self.state {
            TransitionState::Sliding {
                direction,
                progress,
                ..
            } => Some(slide_offsets(dimensions, direction, progress)),
            TransitionState::Idle => None,
        }
    }
}

/// Source and target offsets after `progress` pixels of a slide.
///
/// The two offsets always differ by exactly one room along the travel axis.
pub fn slide_offsets(dimensions: RoomDimensions, direction: Direction, progress: i32) -> SlideOffsets {
    let (w, h) = (dimensions.pixel_width(), dimensions.pixel_height());
    let (source, target) = match direction {
        Direction::Up => ((0, progress), (0, progress - h)),
        Direction::Down => ((0, -progress), (0, h - progress)),
        Direction::Left => ((progress, 0), (progress - w, 0)),
        Direction::Right => ((-progress, 0), (w - progress, 0)),
    };
    SlideOffsets {
        source: PixelPos::new(source.0, source.1),
        target: PixelPos::new(target.0, target.1),
    }
}

/// Where a player travelling `direction` lands: `entry_offset` pixels into
/// the room from the door on the opposite wall.
pub fn arrival_position(dimensions: RoomDimensions, direction: Direction, entry_offset: i32) -> PixelPos {
    let anchor = dimensions.door_anchor(direction.opposite());
    let (dr, dc) = direction.offset();
    PixelPos::new(
        anchor.x + dc as i32 * entry_offset,
        anchor.y + dr as i32 * entry_offset,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        doors::{DoorFlags, DoorGrid},
        random::ScriptedRandom,
    };

    /// Two rooms stacked vertically, joined by a single door.
    fn column_map() -> (RoomMap, WorldConfig) {
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
        (map, config)
    }

    #[test]
    fn collision_starts_a_slide() {
        let (map, config) = column_map();
        let mut controller = TransitionController::from_config(&config);
        assert!(controller.on_door_collision(GridCoord::new(0, 0), Direction::Down, &map));
        assert_eq!(
            controller.state(),
            TransitionState::Sliding {
                direction: Direction::Down,
                progress: 0,
                source: GridCoord::new(0, 0),
                target: GridCoord::new(1, 0),
            }
        );
    }

    #[test]
    fn missing_neighbour_is_a_silent_no_op() {
        let (map, config) = column_map();
        let mut controller = TransitionController::from_config(&config);
        let before = controller.clone();

        assert!(!controller.on_door_collision(GridCoord::new(0, 0), Direction::Up, &map));
        assert_eq!(controller, before);
        assert!(!controller.on_door_collision(GridCoord::new(0, 0), Direction::Up, &map));
        assert_eq!(controller, before);
        assert!(!controller.on_door_collision(GridCoord::new(1, 0), Direction::Right, &map));
        assert_eq!(controller.state(), TransitionState::Idle);
    }

    #[test]
    fn collisions_while_sliding_are_ignored() {
        let (map, config) = column_map();
        let mut controller = TransitionController::from_config(&config);
        controller.on_door_collision(GridCoord::new(0, 0), Direction::Down, &map);
        controller.tick(map.dimensions());
        let mid_slide = controller.clone();
        assert!(!controller.on_door_collision(GridCoord::new(1, 0), Direction::Up, &map));
        assert_eq!(controller, mid_slide);
    }

    #[test]
    fn slide_completes_after_the_room_height() {
        let (map, config) = column_map();
        let dims = map.dimensions();
        let mut controller = TransitionController::from_config(&config);
        controller.on_door_collision(GridCoord::new(0, 0), Direction::Down, &map);

        // 704px at 20px per tick: 35 ticks reach 700, the 36th finishes.
        for tick in 1..36 {
            assert_eq!(controller.tick(dims), None, "tick {tick}");
            assert!(controller.is_active());
        }
        let done = controller.tick(dims).unwrap();
        assert_eq!(controller.state(), TransitionState::Idle);
        assert_eq!(done.room, GridCoord::new(1, 0));
        assert_eq!(done.room_key, "room_1_0");
        assert_eq!(done.player_position, PixelPos::new(672, 96));
        assert_eq!(controller.tick(dims), None);
    }

    #[test]
    fn arrival_is_away_from_the_entry_door() {
        let dims = RoomDimensions::new(20, 11).unwrap();
        assert_eq!(arrival_position(dims, Direction::Down, 64), PixelPos::new(672, 96));
        assert_eq!(arrival_position(dims, Direction::Up, 64), PixelPos::new(672, 704 - 96));
        assert_eq!(arrival_position(dims, Direction::Right, 64), PixelPos::new(96, 352));
        assert_eq!(arrival_position(dims, Direction::Left, 64), PixelPos::new(1280 - 96, 352));
    }

    #[test]
    fn offsets_mirror_each_other() {
        let dims = RoomDimensions::new(20, 11).unwrap();
        for direction in Direction::ALL {
            let travel = dims.travel_distance(direction);
            for progress in [0, 20, travel / 2, travel] {
                let offsets = slide_offsets(dims, direction, progress);
                let gap = PixelPos::new(
                    offsets.target.x - offsets.source.x,
                    offsets.target.y - offsets.source.y,
                );
                let (dr, dc) = direction.offset();
                assert_eq!(gap, PixelPos::new(dc as i32 * travel, dr as i32 * travel));
            }
            let start = slide_offsets(dims, direction, 0);
            assert_eq!(start.source, PixelPos::new(0, 0));
            let end = slide_offsets(dims, direction, travel);
            assert_eq!(end.target, PixelPos::new(0, 0));
        }
    }

    #[test]
    fn offsets_only_while_sliding() {
        let (map, config) = column_map();
        let mut controller = TransitionController::from_config(&config);
        assert_eq!(controller.offsets(map.dimensions()), None);
        controller.on_door_collision(GridCoord::new(0, 0), Direction::Down, &map);
        controller.tick(map.dimensions());
        assert_eq!(
            controller.offsets(map.dimensions()),
            Some(SlideOffsets {
                source: PixelPos::new(0, -20),
                target: PixelPos::new(0, 684),
            })
        );
    }
}
