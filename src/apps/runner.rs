//! Exclusive-mode execution of an application on the UI task.

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::info;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker};

use crate::apps::{App, AppKey, AppStep, RunningApp};
use crate::matrix::KeySnapshot;
use crate::ui::anim::{Frame, BLANK_FRAME};
use crate::ui::Panel;

/// Set while an application owns the display.  Written only by the UI task.
pub static APP_RUNNING: AtomicBool = AtomicBool::new(false);

/// Latest matrix snapshot, forwarded by the dispatcher instead of encoding.
pub static APP_INPUT: Signal<CriticalSectionRawMutex, KeySnapshot> = Signal::new();

pub fn is_running() -> bool {
    APP_RUNNING.load(Ordering::Relaxed)
}

fn draw<P: Panel>(running: &RunningApp, frame: &mut Frame, panel: &mut P) {
    running.render(frame);
    panel.put_bitmap(frame);
    if let Some(caption) = running.caption() {
        panel.goto(0, 0);
        panel.put_text(&caption);
    }
    panel.present();
}

/// Run `app` until the user exits it, then blank the panel.
pub async fn run<P: Panel>(app: App, panel: &mut P) {
    APP_INPUT.reset();
    APP_RUNNING.store(true, Ordering::Relaxed);
    info!("app {} started", app.name());

    let seed = Instant::now().as_ticks() as u32;
    let mut running = RunningApp::start(app, seed);
    let mut frame = BLANK_FRAME;
    draw(&running, &mut frame, panel);

    let mut ticker = Ticker::every(Duration::from_millis(running.period_ms()));
    loop {
        ticker.next().await;
        let input = APP_INPUT
            .try_take()
            .map(|snapshot| AppKey::from_snapshot(&snapshot));
        match running.tick(input) {
            AppStep::Idle => {}
            AppStep::Redraw => draw(&running, &mut frame, panel),
            AppStep::Exit => break,
        }
    }

    panel.clear();
    panel.present();
    APP_RUNNING.store(false, Ordering::Relaxed);
    info!("app {} exited", app.name());
}
