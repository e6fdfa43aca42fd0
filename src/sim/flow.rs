/// Top-level game flow.
///
/// ```text
///   MainMenu ──Start──► Playing ◄──Start── Paused
///      ▲  │               │  │  ──Start──►   │ │
///      │  Quit            │  │               │ Restart → Playing (stage entry values)
///      │  ▼               │  │               Quit → MainMenu
///     exit           lose │  │ win
///      ▲                  ▼  ▼
///      │           GameOver  StageCleared ──► Playing (next stage)
///      │              │            │
///      │              └─► MainMenu └─► GameWon ──A──► exit
/// ```
///
/// Banners (`StageCleared`, `GameOver`) leave after `banner_ms` or on A.

use log::{info, warn};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::GameConfig;
use crate::domain::buttons::{Button, FrameInput};
use super::event::GameEvent;
use super::level::StageTemplate;
use super::step;
use super::world::{Session, StageEntry};

/// Throw / confirm and pause buttons. Keyboard and gamepad both feed these slots.
pub const CONFIRM: Button = Button::A;
pub const PAUSE: Button = Button::Start;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MenuChoice {
    Start,
    Quit,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PauseChoice {
    Restart,
    Quit,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    MainMenu { cursor: MenuChoice },
    Playing,
    Paused { cursor: PauseChoice },
    StageCleared { since: u64 },
    GameOver { since: u64 },
    GameWon,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FlowOutcome {
    Continue,
    Quit,
}

pub struct Game {
    pub phase: Phase,
    pub session: Option<Session>,
    pub stages: Vec<StageTemplate>,
    pub config: GameConfig,
}

impl Game {
    pub fn new(config: GameConfig, stages: Vec<StageTemplate>) -> Self {
        Game {
            phase: Phase::MainMenu { cursor: MenuChoice::Start },
            session: None,
            stages,
            config,
        }
    }

    /// Advance one frame. Gameplay events are appended to `events`.
    pub fn update(&mut self, input: &FrameInput, now: u64, events: &mut Vec<GameEvent>) -> FlowOutcome {
        let before = self.phase;
        let outcome = match self.phase {
            Phase::MainMenu { cursor } => self.update_menu(cursor, input, now),
            Phase::Playing => self.update_playing(input, now, events),
            Phase::Paused { cursor } => self.update_paused(cursor, input, now),
            Phase::StageCleared { since } => self.update_cleared(since, input, now),
            Phase::GameOver { since } => self.update_game_over(since, input, now),
            Phase::GameWon => {
                if input.was_pressed(CONFIRM) {
                    FlowOutcome::Quit
                } else {
                    FlowOutcome::Continue
                }
            }
        };
        if std::mem::discriminant(&before) != std::mem::discriminant(&self.phase) {
            info!("phase: {before:?} -> {:?}", self.phase);
        }
        outcome
    }

    // ── MainMenu ──

    fn update_menu(&mut self, cursor: MenuChoice, input: &FrameInput, now: u64) -> FlowOutcome {
        let cursor = if input.was_pressed(Button::Up) {
            MenuChoice::Start
        } else if input.was_pressed(Button::Down) {
            MenuChoice::Quit
        } else {
            cursor
        };
        self.phase = Phase::MainMenu { cursor };

        if !input.was_pressed(CONFIRM) {
            return FlowOutcome::Continue;
        }
        match cursor {
            MenuChoice::Quit => FlowOutcome::Quit,
            MenuChoice::Start => self.start_new_game(now),
        }
    }

    fn start_new_game(&mut self, now: u64) -> FlowOutcome {
        let template = match self.stages.first() {
            Some(t) => t,
            None => {
                warn!("no stages available; nothing to play");
                return FlowOutcome::Quit;
            }
        };
        let seed = self.config.rules.seed.unwrap_or_else(rand::random);
        info!("new game: {} stages, rng seed {seed}", self.stages.len());
        let entry = StageEntry::fresh(&self.config);
        self.session = Some(Session::new(template, 0, entry, &self.config, Pcg32::seed_from_u64(seed), now));
        info!("stage 1: {}", template.name);
        self.phase = Phase::Playing;
        FlowOutcome::Continue
    }

    // ── Playing ──

    fn update_playing(&mut self, input: &FrameInput, now: u64, events: &mut Vec<GameEvent>) -> FlowOutcome {
        let session = match self.session.as_mut() {
            Some(s) => s,
            None => {
                self.phase = Phase::MainMenu { cursor: MenuChoice::Start };
                return FlowOutcome::Continue;
            }
        };

        if input.was_pressed(PAUSE) {
            self.phase = Phase::Paused { cursor: PauseChoice::Restart };
            return FlowOutcome::Continue;
        }

        events.extend(step::step(session, input, CONFIRM, now));

        if session.lose {
            self.phase = Phase::GameOver { since: now };
        } else if session.win {
            info!("stage {} cleared, score {}", session.stage_index + 1, session.score());
            self.phase = Phase::StageCleared { since: now };
        }
        FlowOutcome::Continue
    }

    // ── Paused ──

    fn update_paused(&mut self, cursor: PauseChoice, input: &FrameInput, now: u64) -> FlowOutcome {
        if input.was_pressed(PAUSE) {
            if let Some(s) = self.session.as_mut() {
                s.resume(now);
            }
            self.phase = Phase::Playing;
            return FlowOutcome::Continue;
        }

        let cursor = if input.was_pressed(Button::Up) {
            PauseChoice::Restart
        } else if input.was_pressed(Button::Down) {
            PauseChoice::Quit
        } else {
            cursor
        };
        self.phase = Phase::Paused { cursor };

        if !input.was_pressed(CONFIRM) {
            return FlowOutcome::Continue;
        }
        match cursor {
            PauseChoice::Restart => {
                if let Some(s) = self.session.as_mut() {
                    if let Some(t) = self.stages.get(s.stage_index) {
                        s.restart(t, now);
                        info!("stage {} restarted", s.stage_index + 1);
                    }
                }
                self.phase = Phase::Playing;
            }
            PauseChoice::Quit => {
                self.session = None;
                self.phase = Phase::MainMenu { cursor: MenuChoice::Start };
            }
        }
        FlowOutcome::Continue
    }

    // ── Banners ──

    fn banner_done(&self, since: u64, input: &FrameInput, now: u64) -> bool {
        input.was_pressed(CONFIRM) || now.saturating_sub(since) >= self.config.timing.banner_ms
    }

    fn update_cleared(&mut self, since: u64, input: &FrameInput, now: u64) -> FlowOutcome {
        if !self.banner_done(since, input, now) {
            return FlowOutcome::Continue;
        }
        let session = match self.session.as_mut() {
            Some(s) => s,
            None => {
                self.phase = Phase::MainMenu { cursor: MenuChoice::Start };
                return FlowOutcome::Continue;
            }
        };
        let next = session.stage_index + 1;
        match self.stages.get(next) {
            Some(template) => {
                session.advance(template, next, now);
                info!("stage {}: {}", next + 1, template.name);
                self.phase = Phase::Playing;
            }
            None => {
                info!("all stages cleared, final score {}", session.score());
                self.phase = Phase::GameWon;
            }
        }
        FlowOutcome::Continue
    }

    fn update_game_over(&mut self, since: u64, input: &FrameInput, now: u64) -> FlowOutcome {
        if self.banner_done(since, input, now) {
            self.session = None;
            self.phase = Phase::MainMenu { cursor: MenuChoice::Start };
        }
        FlowOutcome::Continue
    }
}
