use crate::{
    Direction, GridCoord,
    game::{RoomView, Step},
    random::{RandomSource, SeededRandom},
};

/// Trait defining something that steers the player.
/// Explorers decide each tick's step from a view of the current room.
pub trait Explorer {
    /// `&mut self` lets the explorer keep state between ticks (e.g. a chosen door).
    fn next_step(&mut self, view: &RoomView) -> Step;
}

fn step_towards(direction: Direction, speed: i32) -> Step {
    let (dr, dc) = direction.offset();
    Step::Move {
        dx: dc as i32 * speed,
        dy: dr as i32 * speed,
    }
}

/// An explorer that wanders in random straight runs, pausing now and then.
#[derive(Debug)]
pub struct RandomWalker {
    rng: SeededRandom,
    speed: i32,
    heading: Option<Direction>,
    steps_left: usize,
}

impl RandomWalker {
    pub fn new(seed: u64, speed: i32) -> Self {
        Self {
            rng: SeededRandom::new(seed),
            speed,
            heading: None,
            steps_left: 0,
        }
    }
}

impl Explorer for RandomWalker {
    fn next_step(&mut self, _view: &RoomView) -> Step {
        if self.steps_left == 0 {
            // One extra slot past the four directions means "stand still".
            let choice = self.rng.next_index(Direction::ALL.len() + 1);
            self.heading = Direction::ALL.get(choice).copied();
            self.steps_left = 8 + self.rng.next_index(24);
        }
        self.steps_left -= 1;
        match self.heading {
            Some(direction) => step_towards(direction, self.speed),
            None => Step::Wait,
        }
    }
}

/// An explorer that picks one open door of the current room and walks to it:
/// first lining up with the door, then straight through it.
#[derive(Debug)]
pub struct DoorSeeker {
    rng: SeededRandom,
    speed: i32,
    goal: Option<(GridCoord, Direction)>,
}

impl DoorSeeker {
    pub fn new(seed: u64, speed: i32) -> Self {
        Self {
            rng: SeededRandom::new(seed),
            speed,
            goal: None,
        }
    }

    /// The door currently being walked to, if any.
    pub fn goal(&self) -> Option<Direction> {
        self.goal.map(|(_, direction)| direction)
    }

    fn choose_door(&mut self, view: &RoomView) -> Option<Direction> {
        let open: Vec<Direction> = view.hall.doors().open_directions().collect();
        if open.is_empty() {
            return None;
        }
        Some(open[self.rng.next_index(open.len())])
    }
}

impl Explorer for DoorSeeker {
    fn next_step(&mut self, view: &RoomView) -> Step {
        let door = match self.goal {
            Some((coord, direction)) if coord == view.coord => direction,
            _ => match self.choose_door(view) {
                Some(direction) => {
                    self.goal = Some((view.coord, direction));
                    direction
                }
                None => {
                    self.goal = None;
                    return Step::Wait;
                }
            },
        };

        let anchor = view.hall.dimensions().door_anchor(door);
        let dx = (anchor.x - view.player.x).clamp(-self.speed, self.speed);
        let dy = (anchor.y - view.player.y).clamp(-self.speed, self.speed);
        let (dx, dy) = match (door.is_vertical(), dx, dy) {
            (true, 0, dy) => (0, dy),
            (true, dx, _) => (dx, 0),
            (false, dx, 0) => (dx, 0),
            (false, _, dy) => (0, dy),
        };
        if dx == 0 && dy == 0 {
            Step::Wait
        } else {
            Step::Move { dx, dy }
        }
    }
}
