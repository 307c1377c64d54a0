//! The UI page state machine.
//!
//! [`Ui::step`] is called by the UI task for every received message and on
//! every tick while a page is showing.  It owns the page state and draws
//! through a [`Panel`]; everything else it needs comes from [`UiServices`].

use core::fmt::Write;

use heapless::String;

use crate::apps::App;
use crate::config::{
    APPS_EXIT_KEY, APP_LANDER_KEY, APP_LIFE_KEY, APP_MANDELBROT_KEY, PASSKEY_ACCEPT_KEY,
    PASSKEY_REJECT_KEY, SWAP_PAGE_HOLD_MS, UI_TIMEOUT_MS,
};
use crate::power_logic::PowerSample;
use crate::ui::anim::{self, AnimState, Animation, Frame, BLANK_FRAME};
use crate::ui::message::UiMessage;
use crate::ui::page::{Page, UiPage};

/// Display operations used by pages and applications.
///
/// Text positions are a pixel column and an 8-pixel text line.  `put_text`
/// continues on the next line at column 0 after a `'\n'`.  Nothing is
/// visible until `present`.
pub trait Panel {
    fn clear(&mut self);
    fn goto(&mut self, x: u8, line: u8);
    fn put_text(&mut self, text: &str);
    fn put_text_inverted(&mut self, text: &str);
    fn put_bitmap(&mut self, frame: &Frame);
    fn present(&mut self);
    fn set_power(&mut self, on: bool);
}

/// Radio link state as shown to the user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkState {
    pub advertising: bool,
    pub connected: bool,
}

/// Collaborators read or driven by the pages.
pub trait UiServices {
    fn power(&self) -> PowerSample;
    fn link(&self) -> LinkState;
    /// A numeric-comparison pairing is waiting for the user.
    fn passkey_pending(&self) -> bool;
    fn reply_passkey(&mut self, accept: bool);
    /// Flip the Ctrl/GUI swap and return the new setting.
    fn toggle_modifier_swap(&mut self) -> bool;
    fn modifiers_swapped(&self) -> bool;
    fn boot_count(&self) -> u16;
}

/// What the UI task should do after a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    Continue,
    /// Hand the display to an application and wait for it to exit.
    Launch(App),
    /// Shutdown animation done; power off.
    ShipMode,
}

/// Text formatted for one page. Overlong text is cut off.
type PageText = String<160>;

fn format_text(args: core::fmt::Arguments<'_>) -> PageText {
    let mut text = PageText::new();
    let _ = text.write_fmt(args);
    text
}

/// UI state: current page, its state, time of the last real message.
pub struct Ui {
    page: Page,
    last_msg_ms: u64,
    frame: Frame,
}

impl Default for Ui {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Ui {
    pub const fn new(now_ms: u64) -> Self {
        Self {
            page: Page::Disabled,
            last_msg_ms: now_ms,
            frame: BLANK_FRAME,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn current(&self) -> UiPage {
        self.page.kind()
    }

    /// A page is showing (display on).
    pub fn is_active(&self) -> bool {
        self.current() != UiPage::Disabled
    }

    /// Whether the task must also step on the periodic tick. When `false`
    /// it can block on the message queue indefinitely.
    pub fn wants_tick(&self) -> bool {
        self.is_active()
    }

    /// Called when an application returns the display.
    pub fn resume(&mut self, now_ms: u64) {
        self.last_msg_ms = now_ms;
    }

    /// Process one message (or a tick, as `UiMessage::NoMessage`).
    pub fn step<P: Panel, S: UiServices>(
        &mut self,
        msg: UiMessage,
        now_ms: u64,
        panel: &mut P,
        services: &mut S,
    ) -> Step {
        if msg.is_message() {
            self.last_msg_ms = now_ms;
            if self.current().is_navigable() {
                let was_disabled = !self.is_active();
                self.navigate(&msg);
                if was_disabled && self.is_active() {
                    panel.set_power(true);
                }
            }
        }

        if self.timed_out(now_ms) {
            self.switch_off(panel);
            return Step::Continue;
        }

        self.render(msg, now_ms, panel, services)
    }

    fn navigate(&mut self, msg: &UiMessage) {
        if let Some(target) = UiPage::for_message(msg) {
            if target != self.current() {
                self.open(target);
            }
        }
    }

    fn open(&mut self, kind: UiPage) {
        self.page = Page::open(kind);
    }

    fn timed_out(&self, now_ms: u64) -> bool {
        // Shutdown never comes back, so it is left to finish.
        match self.current() {
            UiPage::Disabled | UiPage::Shutdown => false,
            _ => now_ms.saturating_sub(self.last_msg_ms) > UI_TIMEOUT_MS,
        }
    }

    fn switch_off<P: Panel>(&mut self, panel: &mut P) {
        panel.clear();
        panel.present();
        panel.set_power(false);
        self.page = Page::Disabled;
    }

    fn render<P: Panel, S: UiServices>(
        &mut self,
        msg: UiMessage,
        now_ms: u64,
        panel: &mut P,
        services: &mut S,
    ) -> Step {
        match self.page {
            Page::Disabled => {}
            Page::Startup(mut anim) => {
                let running = self.show_animation(&mut anim, &anim::WAKE, now_ms, panel, None);
                self.page = if running {
                    Page::Startup(anim)
                } else {
                    Page::open(UiPage::Idle)
                };
            }
            Page::Shutdown(mut anim) => {
                let running = self.show_animation(&mut anim, &anim::SLEEP, now_ms, panel, None);
                self.page = Page::Shutdown(anim);
                if !running {
                    return Step::ShipMode;
                }
            }
            Page::Debug => show_debug(now_ms, panel, services),
            Page::ConfirmPasskey { mut passkey } => {
                if let UiMessage::ConfirmPasskeyRequested(p) = msg {
                    passkey = p;
                }
                panel.clear();
                if services.passkey_pending() {
                    if msg.is_key_press(PASSKEY_ACCEPT_KEY) {
                        services.reply_passkey(true);
                    } else if msg.is_key_press(PASSKEY_REJECT_KEY) {
                        services.reply_passkey(false);
                    }
                    let text = format_text(format_args!(
                        "pairing request\nkey: {:06}\n\npress y/n",
                        passkey
                    ));
                    panel.goto(0, 2);
                    panel.put_text(&text);
                    panel.present();
                    self.page = Page::ConfirmPasskey { passkey };
                } else {
                    self.open(UiPage::Idle);
                }
            }
            Page::DisplayPasskey { mut passkey } => {
                if let UiMessage::DisplayPasskeyRequested(p) = msg {
                    passkey = p;
                }
                let text = format_text(format_args!("pairing request\nkey: {:06}", passkey));
                panel.clear();
                panel.goto(0, 2);
                panel.put_text(&text);
                panel.present();
                self.page = Page::DisplayPasskey { passkey };
            }
            Page::SwapModifiers { shown_at_ms } => match shown_at_ms {
                None => {
                    let swapped = services.toggle_modifier_swap();
                    panel.clear();
                    panel.goto(15, 3);
                    panel.put_text(if swapped {
                        "[ctrl]     [cmd]"
                    } else {
                        "[cmd]     [ctrl]"
                    });
                    panel.present();
                    self.page = Page::SwapModifiers {
                        shown_at_ms: Some(now_ms),
                    };
                }
                Some(at) if now_ms.saturating_sub(at) >= SWAP_PAGE_HOLD_MS => {
                    self.open(UiPage::Idle);
                }
                Some(_) => {}
            },
            Page::Help => {
                panel.clear();
                panel.goto(0, 0);
                panel.put_text(
                    "wake + <key>\nH: this page\nS: shutdown\nD: debug info\n\
                     W: swap ctrl & cmd\nA: apps menu\n",
                );
                panel.present();
            }
            Page::AppsMenu => {
                if msg.is_chord(APP_LIFE_KEY) {
                    return Step::Launch(App::Life);
                }
                if msg.is_chord(APP_LANDER_KEY) {
                    return Step::Launch(App::Lander);
                }
                if msg.is_chord(APP_MANDELBROT_KEY) {
                    return Step::Launch(App::Mandelbrot);
                }
                if msg.is_chord(APPS_EXIT_KEY) {
                    self.open(UiPage::Idle);
                    return Step::Continue;
                }
                panel.clear();
                panel.goto(0, 0);
                panel.put_text(
                    "wake + <key> to start\nG: game of life\nL: lander\nM: mandelbrot\n",
                );
                panel.goto(0, 6);
                panel.put_text("X: exit");
                panel.present();
            }
            Page::Idle(mut anim) => {
                let soc = format_text(format_args!("{:.0}%", services.power().soc));
                self.show_animation(&mut anim, &anim::IDLE, now_ms, panel, Some(&soc));
                self.page = Page::Idle(anim);
            }
        }
        Step::Continue
    }

    /// Draw the current frame of `animation`, optionally with a corner
    /// label, and advance it.  Returns `false` once a one-shot animation is
    /// done.
    fn show_animation<P: Panel>(
        &mut self,
        state: &mut AnimState,
        animation: &Animation,
        now_ms: u64,
        panel: &mut P,
        label: Option<&str>,
    ) -> bool {
        let idx = state.current(animation, now_ms);
        animation.render(idx, &mut self.frame);
        panel.put_bitmap(&self.frame);
        if let Some(label) = label {
            panel.goto(110, 0);
            panel.put_text_inverted(label);
        }
        panel.present();
        state.advance(animation, now_ms)
    }
}

fn show_debug<P: Panel, S: UiServices>(now_ms: u64, panel: &mut P, services: &S) {
    let power = services.power();
    let link = services.link();
    let uptime_s = now_ms / 1000;

    let mut text = format_text(format_args!(
        "usb {} chg {}\n{:.0}mA {:.3}V conn {}\nup {}m {}s adv {}\nswap {} boots {}\nsoc {:.1}%\n",
        u8::from(power.vbus_present),
        power.charger.as_str(),
        power.current_ma,
        power.voltage,
        u8::from(link.connected),
        uptime_s / 60,
        uptime_s % 60,
        u8::from(link.advertising),
        u8::from(services.modifiers_swapped()),
        services.boot_count(),
        power.soc,
    ));
    match power.tte_s {
        Some(tte) => {
            let _ = write!(text, "tte {}.{}h ", tte / 3600, tte % 3600 / 360);
        }
        None => {
            let _ = text.push_str("tte - ");
        }
    }
    match power.ttf_s {
        Some(ttf) => {
            let _ = write!(text, "ttf {}m", ttf / 60);
        }
        None => {
            let _ = text.push_str("ttf -");
        }
    }

    panel.clear();
    panel.goto(0, 0);
    panel.put_text(&text);
    panel.present();
}
