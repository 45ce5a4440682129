use hall_world_core::{
    Direction, GridCoord, PixelPos, TILE_SIZE,
    config::WorldConfig,
    explorer::DoorSeeker,
    game::{GameState, Step},
    hall::{Feature, Hall, RoomDimensions},
    transition::{SlideOffsets, TransitionState, slide_offsets},
};
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    fs::File,
    io::{self, Stdout},
    path::PathBuf,
    time::{Duration, Instant},
};

/// Pixels the player moves per key press.
const PLAYER_SPEED: i32 = 16;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON world configuration
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Seed for a reproducible world
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of room rows
    #[arg(long)]
    rows: Option<usize>,

    /// Number of room columns
    #[arg(long)]
    cols: Option<usize>,

    /// Start with the door-seeking autopilot enabled
    #[arg(short, long)]
    autopilot: bool,

    /// Where log output goes; the terminal is busy drawing
    #[arg(long, value_name = "LOG_FILE", default_value = "hall_world.log")]
    log_file: PathBuf,
}

struct App {
    /// The core game state.
    state: GameState,
    /// Step queued by the last key press, consumed on the next tick.
    pending: Step,
    /// Steers the player when enabled.
    autopilot: Option<DoorSeeker>,
    seed: u64,
    /// Last transition, for the status panel.
    last_event: Option<String>,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(config: &WorldConfig, autopilot: bool) -> Result<Self> {
        let state = GameState::generate(config).context("Failed to generate the world")?;
        let seed = config.seed.unwrap_or_default();
        Ok(App {
            state,
            pending: Step::Wait,
            autopilot: autopilot.then(|| DoorSeeker::new(seed, PLAYER_SPEED / 2)),
            seed,
            last_event: None,
            should_quit: false,
        })
    }

    /// Handles one fixed-rate update.
    fn tick(&mut self) {
        let step = std::mem::take(&mut self.pending);
        let completed = match self.autopilot.as_mut() {
            Some(seeker) => self.state.process_explorer(seeker),
            None => self.state.update(step),
        };
        if let Some(done) = completed {
            self.last_event = Some(format!(
                "Went {} into {}",
                done.direction, done.room_key
            ));
        }
    }

    fn queue_move(&mut self, direction: Direction) {
        if self.state.is_frozen() {
            return;
        }
        let (dr, dc) = direction.offset();
        self.pending = Step::Move {
            dx: dc as i32 * PLAYER_SPEED,
            dy: dr as i32 * PLAYER_SPEED,
        };
    }

    fn toggle_autopilot(&mut self) {
        self.autopilot = match self.autopilot {
            Some(_) => None,
            None => Some(DoorSeeker::new(self.seed, PLAYER_SPEED / 2)),
        };
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    init_logging(&args)?;

    let config = load_config(&args)?;
    info!(
        "Generating a {}x{} world of {}x{} tile rooms",
        config.grid_rows, config.grid_cols, config.room_width, config.room_height
    );

    // Build the world before touching the terminal so errors print normally
    let mut app = App::new(&config, args.autopilot)?;

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    // Run the main application loop
    let result = run_app(&mut terminal, &mut app);

    // Restore the terminal state
    restore_terminal(&mut terminal)?;

    result
}

/// Sends log output to a file so it does not tear the alternate screen.
fn init_logging(args: &Args) -> Result<()> {
    let file = File::create(&args.log_file)
        .with_context(|| format!("Cannot create log file {}", args.log_file.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Reads the optional JSON config and applies command line overrides.
fn load_config(args: &Args) -> Result<WorldConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read config file {}", path.display()))?;
            WorldConfig::from_json_str(&json)?
        }
        None => WorldConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(rows) = args.rows {
        config.grid_rows = rows;
    }
    if let Some(cols) = args.cols {
        config.grid_cols = cols;
    }
    config.validate()?;
    Ok(config)
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop at a fixed 60 ticks per second.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_micros(1_000_000 / 60);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                        KeyCode::Char('a') => app.toggle_autopilot(),
                        KeyCode::Up => app.queue_move(Direction::Up),
                        KeyCode::Down => app.queue_move(Direction::Down),
                        KeyCode::Left => app.queue_move(Direction::Left),
                        KeyCode::Right => app.queue_move(Direction::Right),
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(layout::Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(frame.area());

    let side_layout = Layout::default()
        .direction(layout::Direction::Vertical)
        .constraints([
            Constraint::Min(8),
            Constraint::Percentage(50),
            Constraint::Length(4),
        ])
        .split(main_layout[1]);

    render_room(frame, main_layout[0], &app.state);
    render_status(frame, side_layout[0], app);
    render_minimap(frame, side_layout[1], &app.state);

    let help_text = Paragraph::new("Arrows move, 'a' autopilot, 'q'/'Esc' quit.")
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, side_layout[2]);
}

/// Two-character glyph and style for one tile of a hall.
fn tile_span(hall: &Hall, x: usize, y: usize) -> Span<'static> {
    if hall.ornament_at(x, y).is_some() {
        return Span::styled("**", Style::default().fg(Color::Magenta));
    }
    match hall.feature_at(x, y) {
        Some(Feature::Floor) => Span::styled(". ", floor_style(hall.floor_type())),
        Some(Feature::Wall) => Span::styled("##", wall_style(hall.wall_type())),
        Some(Feature::Door(direction)) => {
            let glyph = match direction {
                Direction::Up => "^^",
                Direction::Down => "vv",
                Direction::Left => "<<",
                Direction::Right => ">>",
            };
            Span::styled(glyph, Style::default().fg(Color::Yellow).bold())
        }
        None => Span::raw("  "),
    }
}

fn floor_style(floor_type: &str) -> Style {
    match floor_type {
        "grass" => Style::default().fg(Color::Green),
        "chess" => Style::default().fg(Color::White),
        _ => Style::default().fg(Color::Gray),
    }
}

fn wall_style(wall_type: &str) -> Style {
    match wall_type {
        "brick" => Style::default().fg(Color::Red),
        "rock" => Style::default().fg(Color::DarkGray),
        _ => Style::default().fg(Color::Gray),
    }
}

/// Which hall a screen cell shows during a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlideSide {
    Source,
    Target,
}

/// Tile offset of a hall drawn at `offset` pixels, floored so source and
/// target stay exactly one room apart.
fn to_tiles(offset: PixelPos) -> (i32, i32) {
    (
        offset.x.div_euclid(TILE_SIZE),
        offset.y.div_euclid(TILE_SIZE),
    )
}

/// Resolves screen cell `(x, y)` of a sliding view to a tile of one hall.
fn slide_tile(
    x: i32,
    y: i32,
    dims: RoomDimensions,
    offsets: SlideOffsets,
) -> Option<(SlideSide, usize, usize)> {
    let (width, height) = (dims.width() as i32, dims.height() as i32);
    let (sx, sy) = to_tiles(offsets.source);
    let (tx, ty) = to_tiles(offsets.target);
    [
        (SlideSide::Source, x - sx, y - sy),
        (SlideSide::Target, x - tx, y - ty),
    ]
    .into_iter()
    .find(|(_, ux, uy)| (0..width).contains(ux) && (0..height).contains(uy))
    .map(|(side, ux, uy)| (side, ux as usize, uy as usize))
}

/// Renders the current hall, or both halls while sliding.
fn render_room(frame: &mut Frame, area: Rect, state: &GameState) {
    let dims = state.map().dimensions();
    let slide = state.slide();

    let player = state.player_position();
    let player_tile = (player.x / TILE_SIZE, player.y / TILE_SIZE);

    let mut lines: Vec<Line> = Vec::with_capacity(dims.height());
    for y in 0..dims.height() as i32 {
        let mut spans: Vec<Span> = Vec::with_capacity(dims.width());
        for x in 0..dims.width() as i32 {
            let span = match &slide {
                Some(slide) => match slide_tile(x, y, dims, slide.offsets) {
                    Some((SlideSide::Source, ux, uy)) => tile_span(slide.source, ux, uy),
                    Some((SlideSide::Target, ux, uy)) => tile_span(slide.target, ux, uy),
                    None => Span::raw("  "),
                },
                None if (x, y) == player_tile => {
                    Span::styled("@ ", Style::default().fg(Color::Cyan).bold())
                }
                None => tile_span(state.current_hall(), x as usize, y as usize),
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let title = format!("Hall World - {}", state.current_room_key());
    let room = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(room, area);
}

/// Renders details about the current room and the slide.
fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let state = &app.state;
    let hall = state.current_hall();
    let doors: Vec<&str> = hall.doors().open_directions().map(|d| d.as_str()).collect();
    let player = state.player_position();
    let transition = match state.transition().state() {
        TransitionState::Idle => "idle".to_string(),
        TransitionState::Sliding {
            direction,
            progress,
            target,
            ..
        } => format!("sliding {} to {} ({}px)", direction, target.room_key(), progress),
    };

    let items = vec![
        ListItem::new(format!("Room: {}", state.current_room_key())),
        ListItem::new(format!("Floor: {}", hall.floor_type())),
        ListItem::new(format!("Walls: {}", hall.wall_type())),
        ListItem::new(format!("Doors: {}", doors.join(", "))),
        ListItem::new(format!("Ornaments: {}", hall.ornaments().len())),
        ListItem::new(format!("Player: ({}, {})", player.x, player.y)),
        ListItem::new(format!("Transition: {}", transition)),
        ListItem::new(format!(
            "Autopilot: {}",
            if app.autopilot.is_some() { "on" } else { "off" }
        )),
        ListItem::new(app.last_event.clone().unwrap_or_default()),
    ];

    let status = List::new(items).block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status, area);
}

/// Renders the door grid with the current room highlighted.
fn render_minimap(frame: &mut Frame, area: Rect, state: &GameState) {
    let door_grid = state.map().door_grid();
    let current = state.current_coord();
    let mut lines: Vec<Line> = Vec::with_capacity(door_grid.rows() * 2);

    for row in 0..door_grid.rows() {
        let mut rooms: Vec<Span> = Vec::new();
        let mut links: Vec<Span> = Vec::new();
        for col in 0..door_grid.cols() {
            let coord = GridCoord::new(row, col);
            let flags = door_grid.get(coord).unwrap_or_default();
            rooms.push(if coord == current {
                Span::styled("@", Style::default().fg(Color::Cyan).bold())
            } else {
                Span::raw("o")
            });
            rooms.push(Span::raw(if flags.right { "-" } else { " " }));
            links.push(Span::raw(if flags.down { "| " } else { "  " }));
        }
        lines.push(Line::from(rooms));
        lines.push(Line::from(links));
    }

    let minimap = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Map"))
        .alignment(Alignment::Center);
    frame.render_widget(minimap, area);
}
