/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::io;
use std::time::Duration;

use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};
use log::{error, info};

use config::GameConfig;
use sim::clock::{Clock, SystemClock};
use sim::flow::{FlowOutcome, Game};
use sim::level;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = GameConfig::load();
    let stages = level::load_stages(&config.stages_dir);
    info!("{} stages loaded", stages.len());

    let mut game = Game::new(config, stages);
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        let _ = renderer.cleanup();
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let enhanced = enable_key_release_events();

    let result = game_loop(&mut game, &mut renderer, enhanced);

    if enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Jungle Ladder!");
    if let Some(session) = &game.session {
        println!("Final Score: {}", session.score());
    }
}

/// Ask the terminal for key Release events. Returns whether they will arrive.
fn enable_key_release_events() -> bool {
    if !matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
        return false;
    }
    execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok()
}

fn game_loop(
    game: &mut Game,
    renderer: &mut Renderer,
    honor_release: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let clock = SystemClock::new();
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&game.config.gamepad);
    if gp.connected {
        info!("gamepad detected");
    }

    let frame_sleep = Duration::from_millis(game.config.timing.frame_sleep_ms);
    let mut events = Vec::new();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            info!("interrupted");
            break;
        }

        let input = kb.frame().merge(gp.frame());
        let now = clock.now_ms();

        events.clear();
        let outcome = game.update(&input, now, &mut events);

        renderer.render(game, &events, now)?;

        if outcome == FlowOutcome::Quit {
            break;
        }
        std::thread::sleep(frame_sleep);
    }

    Ok(())
}
