use serde::{Deserialize, Serialize};

use crate::{
    Direction, PixelPos, PixelRect, TILE_SIZE,
    config::{ConfigError, distinct_names},
    doors::DoorFlags,
    random::RandomSource,
};

/// Smallest room edge, in tiles, that leaves a tile between two corner walls
/// for a centred door.
pub const MIN_ROOM_TILES: usize = 3;

/// Squared pixel tolerance used when matching positions against door anchors.
const ANCHOR_TOLERANCE_SQ: i64 = 1;

/// Size of every room, in tiles. Always at least 3x3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomDimensions {
    width: usize,
    height: usize,
}

impl RoomDimensions {
    pub fn new(width: usize, height: usize) -> Result<Self, ConfigError> {
        if width < MIN_ROOM_TILES || height < MIN_ROOM_TILES {
            return Err(ConfigError::RoomTooSmall { width, height });
        }
        // Every pixel coordinate inside the room has to fit an i32.
        let fits = |tiles: usize| {
            i32::try_from(tiles)
                .ok()
                .and_then(|tiles| tiles.checked_mul(TILE_SIZE))
                .is_some()
        };
        if !fits(width) || !fits(height) {
            return Err(ConfigError::RoomTooLarge { width, height });
        }
        Ok(RoomDimensions { width, height })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel_width(&self) -> i32 {
        self.width as i32 * TILE_SIZE
    }

    pub fn pixel_height(&self) -> i32 {
        self.height as i32 * TILE_SIZE
    }

    /// The whole room in pixels.
    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.pixel_width(), self.pixel_height())
    }

    pub fn center(&self) -> PixelPos {
        PixelPos::new(self.pixel_width() / 2, self.pixel_height() / 2)
    }

    /// Pixels a slide through a door on this side has to cover.
    pub fn travel_distance(&self, direction: Direction) -> i32 {
        if direction.is_vertical() {
            self.pixel_height()
        } else {
            self.pixel_width()
        }
    }

    /// `(x, y)` tile holding the door on the given side.
    pub fn anchor_tile(&self, direction: Direction) -> (usize, usize) {
        match direction {
            Direction::Up => (self.width / 2, 0),
            Direction::Down => (self.width / 2, self.height - 1),
            Direction::Left => (0, self.height / 2),
            Direction::Right => (self.width - 1, self.height / 2),
        }
    }

    /// Pixel centre of the door tile on the given side.
    pub fn door_anchor(&self, direction: Direction) -> PixelPos {
        let (x, y) = self.anchor_tile(direction);
        tile_center(tile_origin(x, y))
    }

    pub fn is_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1
    }
}

fn tile_origin(x: usize, y: usize) -> PixelPos {
    PixelPos::new(x as i32 * TILE_SIZE, y as i32 * TILE_SIZE)
}

fn tile_center(origin: PixelPos) -> PixelPos {
    PixelPos::new(origin.x + TILE_SIZE / 2, origin.y + TILE_SIZE / 2)
}

/// What a textured tile is, which decides its asset folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Floor,
    Wall,
    Ornament,
}

/// A textured 64x64 tile, positioned by its top-left corner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    pub texture: String,
    pub position: PixelPos,
}

impl Tile {
    pub fn rect(&self) -> PixelRect {
        PixelRect::new(self.position.x, self.position.y, TILE_SIZE, TILE_SIZE)
    }

    pub fn center(&self) -> PixelPos {
        tile_center(self.position)
    }

    /// Asset path the renderer loads for this tile.
    pub fn asset_path(&self) -> String {
        let folder = match self.kind {
            TileKind::Floor => "map/floors",
            TileKind::Wall => "map/walls",
            TileKind::Ornament => "map/wall_ornaments",
        };
        format!("{}/{}", folder, self.texture)
    }
}

/// A door placed in a wall gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorMarker {
    pub direction: Direction,
    /// Top-left corner of the door tile.
    pub tile: PixelPos,
    /// Centre of the door tile.
    pub anchor: PixelPos,
}

impl DoorMarker {
    pub fn rect(&self) -> PixelRect {
        PixelRect::new(self.tile.x, self.tile.y, TILE_SIZE, TILE_SIZE)
    }

    pub fn asset_path(&self) -> String {
        format!("map/doors/door_{}", self.direction)
    }
}

/// What occupies a tile cell of a hall, ignoring ornaments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Floor,
    Wall,
    Door(Direction),
}

/// One generated room.
///
/// All collections are built by [`Hall::generate`] and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hall {
    dimensions: RoomDimensions,
    floor_type: String,
    wall_type: String,
    doors: DoorFlags,
    ornament_names: Vec<String>,
    floor_tiles: Vec<Tile>,
    wall_tiles: Vec<Tile>,
    door_markers: Vec<DoorMarker>,
    ornaments: Vec<Tile>,
}

impl Hall {
    /// Builds a room: floor, walls with centred door gaps, then ornaments.
    ///
    /// Repeated ornament names count once, so every distinct ornament is
    /// equally likely.
    ///
    /// The ornament pass is the only one that draws from `rng`: one coin per
    /// wall tile, plus one index per placed ornament. An empty ornament set
    /// draws nothing.
    pub fn generate(
        dimensions: RoomDimensions,
        floor_type: &str,
        wall_type: &str,
        doors: DoorFlags,
        ornament_names: &[String],
        rng: &mut dyn RandomSource,
    ) -> Hall {
        let mut hall = Hall {
            dimensions,
            floor_type: floor_type.to_string(),
            wall_type: wall_type.to_string(),
            doors,
            ornament_names: distinct_names(ornament_names),
            floor_tiles: Vec::with_capacity(dimensions.width * dimensions.height),
            wall_tiles: Vec::new(),
            door_markers: Vec::new(),
            ornaments: Vec::new(),
        };
        hall.place_floor();
        hall.place_walls();
        hall.place_ornaments(rng);
        hall
    }

    fn place_floor(&mut self) {
        for y in 0..self.dimensions.height {
            for x in 0..self.dimensions.width {
                self.floor_tiles.push(Tile {
                    kind: TileKind::Floor,
                    texture: self.floor_type.clone(),
                    position: tile_origin(x, y),
                });
            }
        }
    }

    fn place_walls(&mut self) {
        let dims = self.dimensions;
        for y in 0..dims.height {
            for x in 0..dims.width {
                if !dims.is_border(x, y) {
                    continue;
                }
                let door = self
                    .doors
                    .open_directions()
                    .find(|direction| dims.anchor_tile(*direction) == (x, y));
                match door {
                    Some(direction) => self.door_markers.push(DoorMarker {
                        direction,
                        tile: tile_origin(x, y),
                        anchor: dims.door_anchor(direction),
                    }),
                    None => self.wall_tiles.push(Tile {
                        kind: TileKind::Wall,
                        texture: self.wall_type.clone(),
                        position: tile_origin(x, y),
                    }),
                }
            }
        }
    }

    fn place_ornaments(&mut self, rng: &mut dyn RandomSource) {
        if self.ornament_names.is_empty() {
            return;
        }
        for wall in &self.wall_tiles {
            if !rng.next_bool() {
                continue;
            }
            let center = wall.center();
            let on_door = self
                .door_markers
                .iter()
                .any(|door| door.anchor.distance_sq(&center) <= ANCHOR_TOLERANCE_SQ);
            if on_door {
                continue;
            }
            let name = &self.ornament_names[rng.next_index(self.ornament_names.len())];
            self.ornaments.push(Tile {
                kind: TileKind::Ornament,
                texture: name.clone(),
                position: wall.position,
            });
        }
    }

    pub fn dimensions(&self) -> RoomDimensions {
        self.dimensions
    }

    pub fn floor_type(&self) -> &str {
        &self.floor_type
    }

    pub fn wall_type(&self) -> &str {
        &self.wall_type
    }

    pub fn doors(&self) -> DoorFlags {
        self.doors
    }

    pub fn ornament_names(&self) -> &[String] {
        &self.ornament_names
    }

    pub fn floor_tiles(&self) -> &[Tile] {
        &self.floor_tiles
    }

    pub fn wall_tiles(&self) -> &[Tile] {
        &self.wall_tiles
    }

    pub fn door_markers(&self) -> &[DoorMarker] {
        &self.door_markers
    }

    pub fn ornaments(&self) -> &[Tile] {
        &self.ornaments
    }

    pub fn door(&self, direction: Direction) -> Option<&DoorMarker> {
        self.door_markers.iter().find(|d| d.direction == direction)
    }

    /// The first door the hitbox overlaps, if any.
    pub fn door_at(&self, hitbox: &PixelRect) -> Option<Direction> {
        self.door_markers
            .iter()
            .find(|door| door.rect().intersects(hitbox))
            .map(|door| door.direction)
    }

    /// Whether a hitbox is outside the room or overlapping a wall.
    pub fn blocks(&self, hitbox: &PixelRect) -> bool {
        !self.dimensions.bounds().contains_rect(hitbox)
            || self.wall_tiles.iter().any(|wall| wall.rect().intersects(hitbox))
    }

    pub fn feature_at(&self, x: usize, y: usize) -> Option<Feature> {
        let dims = self.dimensions;
        if x >= dims.width || y >= dims.height {
            return None;
        }
        if !dims.is_border(x, y) {
            return Some(Feature::Floor);
        }
        let origin = tile_origin(x, y);
        Some(
            self.door_markers
                .iter()
                .find(|door| door.tile == origin)
                .map_or(Feature::Wall, |door| Feature::Door(door.direction)),
        )
    }

    pub fn ornament_at(&self, x: usize, y: usize) -> Option<&Tile> {
        let origin = tile_origin(x, y);
        self.ornaments.iter().find(|o| o.position == origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ScriptedRandom, SeededRandom};

    fn all_doors() -> DoorFlags {
        DoorFlags {
            up: true,
            down: true,
            left: true,
            right: true,
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn build(width: usize, height: usize, doors: DoorFlags, rng: &mut dyn RandomSource) -> Hall {
        let dims = RoomDimensions::new(width, height).unwrap();
        Hall::generate(dims, "grass", "brick", doors, &names(&["baum_tile", "torch"]), rng)
    }

    #[test]
    fn rooms_below_three_tiles_are_rejected() {
        assert_eq!(
            RoomDimensions::new(2, 5),
            Err(ConfigError::RoomTooSmall {
                width: 2,
                height: 5
            })
        );
        assert!(RoomDimensions::new(3, 3).is_ok());
    }

    #[test]
    fn rooms_too_wide_for_pixel_space_are_rejected() {
        assert_eq!(
            RoomDimensions::new(40_000_000, 11),
            Err(ConfigError::RoomTooLarge {
                width: 40_000_000,
                height: 11
            })
        );
        assert_eq!(
            RoomDimensions::new(20, usize::MAX),
            Err(ConfigError::RoomTooLarge {
                width: 20,
                height: usize::MAX
            })
        );
        let widest = (i32::MAX / TILE_SIZE) as usize;
        assert_eq!(RoomDimensions::new(widest, 3).unwrap().pixel_width(), widest as i32 * TILE_SIZE);
    }

    #[test]
    fn floor_covers_every_tile() {
        let hall = build(5, 4, DoorFlags::default(), &mut ScriptedRandom::exhausted());
        assert_eq!(hall.floor_tiles().len(), 20);
        assert_eq!(hall.floor_tiles()[0].position, PixelPos::new(0, 0));
        assert_eq!(hall.floor_tiles()[6].position, PixelPos::new(64, 64));
        assert_eq!(hall.floor_tiles()[0].asset_path(), "map/floors/grass");
    }

    #[test]
    fn sealed_room_has_a_full_border() {
        let hall = build(5, 4, DoorFlags::default(), &mut ScriptedRandom::exhausted());
        assert_eq!(hall.wall_tiles().len(), 2 * 5 + 2 * 4 - 4);
        assert!(hall.door_markers().is_empty());
        assert_eq!(hall.wall_tiles()[0].asset_path(), "map/walls/brick");
    }

    #[test]
    fn doors_replace_centred_wall_tiles() {
        let hall = build(20, 11, all_doors(), &mut ScriptedRandom::exhausted());
        assert_eq!(hall.wall_tiles().len(), 2 * 20 + 2 * 11 - 4 - 4);

        let up = hall.door(Direction::Up).unwrap();
        assert_eq!(up.tile, PixelPos::new(640, 0));
        assert_eq!(up.anchor, PixelPos::new(672, 32));
        assert_eq!(up.asset_path(), "map/doors/door_up");

        let right = hall.door(Direction::Right).unwrap();
        assert_eq!(right.anchor, PixelPos::new(19 * 64 + 32, 5 * 64 + 32));

        for door in hall.door_markers() {
            assert!(hall.wall_tiles().iter().all(|w| w.position != door.tile));
        }
    }

    #[test]
    fn only_flagged_sides_get_doors() {
        let doors = DoorFlags {
            down: true,
            ..DoorFlags::default()
        };
        let hall = build(3, 3, doors, &mut ScriptedRandom::exhausted());
        let sides: Vec<_> = hall.door_markers().iter().map(|d| d.direction).collect();
        assert_eq!(sides, vec![Direction::Down]);
        assert_eq!(hall.feature_at(1, 2), Some(Feature::Door(Direction::Down)));
        assert_eq!(hall.feature_at(1, 0), Some(Feature::Wall));
        assert_eq!(hall.feature_at(1, 1), Some(Feature::Floor));
        assert_eq!(hall.feature_at(3, 1), None);
    }

    #[test]
    fn ornaments_sit_on_walls_only() {
        let mut rng = ScriptedRandom::new(std::iter::repeat_n(true, 64), [1, 0, 1]);
        let hall = build(6, 5, all_doors(), &mut rng);

        assert_eq!(hall.ornaments().len(), hall.wall_tiles().len());
        assert_eq!(hall.ornaments()[0].texture, "torch");
        assert_eq!(hall.ornaments()[1].texture, "baum_tile");
        assert_eq!(hall.ornaments()[0].asset_path(), "map/wall_ornaments/torch");
        for ornament in hall.ornaments() {
            assert!(hall.wall_tiles().iter().any(|w| w.position == ornament.position));
            for door in hall.door_markers() {
                assert_ne!(ornament.center(), door.anchor);
            }
        }
    }

    #[test]
    fn no_ornament_names_means_no_draws() {
        let dims = RoomDimensions::new(4, 4).unwrap();
        let mut rng = ScriptedRandom::new([true; 8], [0; 8]);
        let hall = Hall::generate(dims, "chess", "rock", all_doors(), &[], &mut rng);
        assert!(hall.ornaments().is_empty());
        assert_eq!(rng.bools_drawn(), 0);
    }

    #[test]
    fn repeated_ornament_names_count_once() {
        let dims = RoomDimensions::new(4, 4).unwrap();
        let names = names(&["torch", "torch", "torch", "baum_tile"]);
        let mut rng = ScriptedRandom::new([true], [1]);
        let hall = Hall::generate(dims, "chess", "rock", DoorFlags::default(), &names, &mut rng);
        assert_eq!(hall.ornament_names(), ["torch", "baum_tile"]);
        assert_eq!(hall.ornaments()[0].texture, "baum_tile");
    }

    #[test]
    fn ornament_pass_is_seed_stable() {
        let a = build(12, 8, all_doors(), &mut SeededRandom::new(5));
        let b = build(12, 8, all_doors(), &mut SeededRandom::new(5));
        assert_eq!(a, b);
    }

    #[test]
    fn door_collision_and_wall_blocking() {
        let hall = build(5, 5, all_doors(), &mut ScriptedRandom::exhausted());
        // Standing in the up door gap.
        let in_gap = PixelRect::centered(PixelPos::new(160, 32), 48);
        assert_eq!(hall.door_at(&in_gap), Some(Direction::Up));
        assert!(!hall.blocks(&in_gap));

        let centre = PixelRect::centered(hall.dimensions().center(), 48);
        assert_eq!(hall.door_at(&centre), None);
        assert!(!hall.blocks(&centre));

        let into_wall = PixelRect::centered(PixelPos::new(96, 40), 48);
        assert!(hall.blocks(&into_wall));

        let outside = PixelRect::centered(PixelPos::new(160, 10), 48);
        assert!(hall.blocks(&outside));
    }
}
