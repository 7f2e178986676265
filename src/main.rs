//! Tilequest - Entry Point
//!
//! Sets up logging and the terminal, loads settings and content, then
//! runs the frame loop.

use std::fs::{File, OpenOptions};
use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};

use tilequest::data::DataManager;
use tilequest::game::{Game, GameSettings, GameState};
use tilequest::ui::App;

/// Target frames per second for the game loop
const TARGET_FPS: u64 = 60;
const FRAME_TIME: Duration = Duration::from_millis(1000 / TARGET_FPS);

fn open_log_file() -> Result<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("tilequest.log")
        .or_else(|_| OpenOptions::new().write(true).open("/dev/null"))
        .context("no writable log target")
}

fn main() -> Result<()> {
    // Log to a file so output does not tear the terminal UI
    let log_file = open_log_file()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    log::info!("Starting Tilequest v{}", env!("CARGO_PKG_VERSION"));

    let settings = GameSettings::load();
    let data = DataManager::load_from(&settings.data_dir);
    let mut game = Game::new(settings, data);
    let mut app = App::default();
    log::info!("Saves live in {:?}", app.saves().dir());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_game_loop(&mut terminal, &mut app, &mut game);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        log::error!("Game exited with error: {}", e);
        eprintln!("Error: {}", e);
    }

    if let Err(e) = game.settings().save_settings() {
        log::warn!("Could not write settings: {}", e);
    }

    log::info!("Tilequest shut down cleanly");
    result
}

/// Main game loop
fn run_game_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    game: &mut Game,
) -> Result<()> {
    let mut last_frame = Instant::now();

    loop {
        let frame_start = Instant::now();
        let delta = frame_start.duration_since(last_frame);
        last_frame = frame_start;

        if event::poll(Duration::from_millis(0))? {
            match event::read()? {
                // Only handle key press events, not releases
                Event::Key(key) if key.kind == KeyEventKind::Press => match app.handle_input(key, game) {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(e) => log::warn!("Input handling error: {}", e),
                },
                Event::Mouse(mouse) => {
                    let size = terminal.size()?;
                    app.handle_mouse(mouse, game, Rect::new(0, 0, size.width, size.height));
                }
                _ => {}
            }
        }

        game.update(delta.as_secs_f32());

        terminal.draw(|frame| {
            app.render(frame, game);
        })?;

        if matches!(game.state(), GameState::Quit) {
            break;
        }

        // Frame rate limiting
        let frame_time = frame_start.elapsed();
        if frame_time < FRAME_TIME {
            std::thread::sleep(FRAME_TIME - frame_time);
        }
    }

    Ok(())
}
