//! Application selection, key translation and the running-app state.

use core::fmt::Write;

use heapless::String;

use crate::apps::lander::{Lander, LanderPhase};
use crate::apps::life::Life;
use crate::apps::mandelbrot::Mandelbrot;
use crate::config::{
    APP_KEY_BACK, APP_KEY_DOWN, APP_KEY_LEFT, APP_KEY_RIGHT, APP_KEY_SELECT, APP_KEY_UP,
};
use crate::matrix::KeySnapshot;
use crate::ui::anim::Frame;

/// Full-screen applications reachable from the apps menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum App {
    Life,
    Lander,
    Mandelbrot,
}

impl App {
    pub fn name(self) -> &'static str {
        match self {
            App::Life => "game of life",
            App::Lander => "lander",
            App::Mandelbrot => "mandelbrot",
        }
    }
}

/// Logical input for applications.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppKey {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
    Select,
    Back,
    /// The wake button.
    Exit,
}

impl AppKey {
    /// Translate a snapshot. Wake wins over everything; otherwise only the
    /// first key in scan order counts.
    pub fn from_snapshot(snapshot: &KeySnapshot) -> Self {
        if snapshot.wake_down {
            return AppKey::Exit;
        }
        match snapshot.first() {
            Some(key) if key == APP_KEY_SELECT => AppKey::Select,
            Some(key) if key == APP_KEY_BACK => AppKey::Back,
            Some(key) if key == APP_KEY_LEFT => AppKey::Left,
            Some(key) if key == APP_KEY_RIGHT => AppKey::Right,
            Some(key) if key == APP_KEY_UP => AppKey::Up,
            Some(key) if key == APP_KEY_DOWN => AppKey::Down,
            _ => AppKey::None,
        }
    }
}

/// Result of one application update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppStep {
    /// Nothing changed on screen.
    Idle,
    Redraw,
    /// Give the display back.
    Exit,
}

/// Text drawn over an application's frame.
pub type Caption = String<48>;

enum AppState {
    Life(Life),
    Lander(Lander),
    Mandelbrot(Mandelbrot),
}

/// A launched application.
///
/// Applications are launched with a wake chord, so wake counts as held
/// until the first snapshot says otherwise, and exit is only honoured after
/// wake has been seen released once.
pub struct RunningApp {
    state: AppState,
    held: AppKey,
    armed: bool,
}

impl RunningApp {
    pub fn start(app: App, seed: u32) -> Self {
        let state = match app {
            App::Life => AppState::Life(Life::random(seed)),
            App::Lander => AppState::Lander(Lander::new(seed)),
            App::Mandelbrot => AppState::Mandelbrot(Mandelbrot::new()),
        };
        Self {
            state,
            held: AppKey::Exit,
            armed: false,
        }
    }

    pub fn app(&self) -> App {
        match self.state {
            AppState::Life(_) => App::Life,
            AppState::Lander(_) => App::Lander,
            AppState::Mandelbrot(_) => App::Mandelbrot,
        }
    }

    /// Update period (ms) while running.
    pub fn period_ms(&self) -> u64 {
        match self.state {
            AppState::Life(_) => 100,
            AppState::Lander(_) => 16,
            AppState::Mandelbrot(_) => 20,
        }
    }

    /// Advance one period.  `input` is the key from a snapshot that arrived
    /// since the last period; without one the previous key is still held.
    pub fn tick(&mut self, input: Option<AppKey>) -> AppStep {
        if let Some(key) = input {
            self.held = key;
        }
        self.update(self.held)
    }

    /// Advance one period with `key` currently held.
    pub fn update(&mut self, key: AppKey) -> AppStep {
        if key == AppKey::Exit {
            if self.armed {
                return AppStep::Exit;
            }
            return AppStep::Idle;
        }
        self.armed = true;

        match &mut self.state {
            AppState::Life(life) => {
                life.step();
                AppStep::Redraw
            }
            AppState::Lander(lander) => {
                if lander.update(key) {
                    AppStep::Redraw
                } else {
                    AppStep::Idle
                }
            }
            AppState::Mandelbrot(view) => {
                if view.on_key(key) {
                    AppStep::Redraw
                } else {
                    AppStep::Idle
                }
            }
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        match &self.state {
            AppState::Life(life) => life.render(frame),
            AppState::Lander(lander) => lander.render(frame),
            AppState::Mandelbrot(view) => view.render(frame),
        }
    }

    /// Text to draw over the frame, if any.
    pub fn caption(&self) -> Option<Caption> {
        let AppState::Lander(lander) = &self.state else {
            return None;
        };
        let mut text = Caption::new();
        match lander.phase() {
            LanderPhase::Landed => {
                let _ = write!(text, "landed! {} pts\nA: next stage", lander.points());
            }
            LanderPhase::Crashed => {
                let _ = write!(text, "crashed!\ngame over\n{} points", lander.points());
            }
            LanderPhase::Ready | LanderPhase::Flying => return None,
        }
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::KeyCoord;

    #[test]
    fn wake_is_exit() {
        let snapshot = KeySnapshot::from_keys(&[APP_KEY_UP], true);
        assert_eq!(AppKey::from_snapshot(&snapshot), AppKey::Exit);
    }

    #[test]
    fn first_key_decides() {
        let snapshot = KeySnapshot::from_keys(&[APP_KEY_LEFT, APP_KEY_RIGHT], false);
        assert_eq!(AppKey::from_snapshot(&snapshot), AppKey::Left);
        let snapshot = KeySnapshot::from_keys(&[KeyCoord::new(3, 10), APP_KEY_RIGHT], false);
        assert_eq!(AppKey::from_snapshot(&snapshot), AppKey::None);
        assert_eq!(AppKey::from_snapshot(&KeySnapshot::new()), AppKey::None);
    }

    #[test]
    fn exit_needs_wake_release_first() {
        let mut app = RunningApp::start(App::Mandelbrot, 1);
        assert_eq!(app.app(), App::Mandelbrot);
        // Launch chord still held.
        assert_eq!(app.update(AppKey::Exit), AppStep::Idle);
        assert_eq!(app.update(AppKey::None), AppStep::Idle);
        assert_eq!(app.update(AppKey::Exit), AppStep::Exit);
    }

    #[test]
    fn launch_chord_still_held_does_not_exit() {
        // Fast app, slower scanner: the first snapshot lands after a few
        // periods and still shows the launch chord.
        const SCAN_MS: u64 = 50;
        let mut app = RunningApp::start(App::Mandelbrot, 1);
        let period = app.period_ms();
        let chord = KeySnapshot::from_keys(&[crate::config::APP_MANDELBROT_KEY], true);

        let mut next_scan = SCAN_MS;
        let mut t = 0;
        while t < 300 {
            t += period;
            let input = if t >= next_scan {
                next_scan += SCAN_MS;
                Some(AppKey::from_snapshot(&chord))
            } else {
                None
            };
            assert_ne!(app.tick(input), AppStep::Exit, "exited at {t} ms");
        }

        // Released, then pressed again.
        assert_ne!(app.tick(Some(AppKey::None)), AppStep::Exit);
        assert_eq!(app.tick(None), AppStep::Idle);
        assert_eq!(app.tick(Some(AppKey::Exit)), AppStep::Exit);
    }

    #[test]
    fn held_key_repeats_between_snapshots() {
        let mut app = RunningApp::start(App::Life, 3);
        assert_eq!(app.tick(None), AppStep::Idle);
        assert_eq!(app.tick(Some(AppKey::Up)), AppStep::Redraw);
        assert_eq!(app.tick(None), AppStep::Redraw);
    }

    #[test]
    fn lander_caption_after_crash() {
        let mut app = RunningApp::start(App::Lander, 4);
        assert_eq!(app.app(), App::Lander);
        assert_eq!(app.caption(), None);
        app.tick(Some(AppKey::Down));
        for _ in 0..1_000 {
            app.tick(Some(AppKey::None));
        }
        let caption = app.caption().expect("crash caption");
        assert!(caption.starts_with("crashed!"));
        assert!(caption.ends_with("0 points"));
        assert_eq!(app.tick(Some(AppKey::Exit)), AppStep::Exit);
    }

    #[test]
    fn life_redraws_every_period() {
        let mut app = RunningApp::start(App::Life, 7);
        assert_eq!(app.update(AppKey::None), AppStep::Redraw);
        assert_eq!(app.update(AppKey::Up), AppStep::Redraw);
    }
}
