//! Full-screen frames and the frame-sequenced animations.
//!
//! Frames use the SSD1306 page layout: `frame[line][x]`, bit `y % 8` of
//! the byte in line `y / 8` is the pixel at (x, y).  Animation frames are
//! drawn procedurally instead of being stored as bitmaps.

use crate::config::{ANIM_TICK_MS, DISPLAY_HEIGHT, DISPLAY_LINES, DISPLAY_WIDTH};

/// One 128×64 monochrome frame.
pub type Frame = [[u8; DISPLAY_WIDTH]; DISPLAY_LINES];

pub const BLANK_FRAME: Frame = [[0; DISPLAY_WIDTH]; DISPLAY_LINES];

pub fn clear_frame(frame: &mut Frame) {
    *frame = BLANK_FRAME;
}

/// Set or clear one pixel. Out-of-range coordinates are ignored.
pub fn set_pixel(frame: &mut Frame, x: i32, y: i32, on: bool) {
    if x < 0 || y < 0 || x >= DISPLAY_WIDTH as i32 || y >= DISPLAY_HEIGHT as i32 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    let mask = 1u8 << (y % 8);
    if on {
        frame[y / 8][x] |= mask;
    } else {
        frame[y / 8][x] &= !mask;
    }
}

pub fn get_pixel(frame: &Frame, x: usize, y: usize) -> bool {
    x < DISPLAY_WIDTH && y < DISPLAY_HEIGHT && frame[y / 8][x] & (1 << (y % 8)) != 0
}

/// Fill or clear every pixel within `r` of (cx, cy) whose row is within
/// `half_open` of the centre.
fn disc(frame: &mut Frame, cx: i32, cy: i32, r: i32, half_open: i32, on: bool) {
    for dy in -r..=r {
        if dy.abs() > half_open {
            continue;
        }
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                set_pixel(frame, cx + dx, cy + dy, on);
            }
        }
    }
}

const EYE_Y: i32 = 32;
const EYE_LEFT_X: i32 = 40;
const EYE_RIGHT_X: i32 = 88;
const EYE_RADIUS: i32 = 14;
const PUPIL_RADIUS: i32 = 5;

/// A pair of eyes opened `open` rows above and below the centre line,
/// pupils shifted by `look` pixels.
fn draw_eyes(frame: &mut Frame, open: i32, look: i32) {
    clear_frame(frame);
    for cx in [EYE_LEFT_X, EYE_RIGHT_X] {
        if open == 0 {
            for dx in -EYE_RADIUS..=EYE_RADIUS {
                set_pixel(frame, cx + dx, EYE_Y, true);
            }
            continue;
        }
        disc(frame, cx, EYE_Y, EYE_RADIUS, open, true);
        disc(frame, cx + look, EYE_Y, PUPIL_RADIUS, open, false);
    }
}

const EYE_FRAMES: usize = 8;

fn eyes_opening(idx: usize, frame: &mut Frame) {
    let open = (idx as i32 * EYE_RADIUS) / (EYE_FRAMES as i32 - 1);
    draw_eyes(frame, open, 0);
}

const IDLE_LOOK: [i32; 12] = [0, 0, -3, -6, -6, -3, 0, 0, 3, 6, 6, 3];

fn eyes_idle(idx: usize, frame: &mut Frame) {
    match IDLE_LOOK.get(idx) {
        Some(&look) => draw_eyes(frame, EYE_RADIUS, look),
        // Blink.
        None => draw_eyes(frame, 0, 0),
    }
}

/// A frame-sequenced animation.
///
/// `frame_counts[i]` is the time frame `i` stays up, in units of
/// `ANIM_TICK_MS`.  Playback starts at `init_idx`, moves by `frame_step`
/// and either wraps from `end_idx` back to `start_idx` or stops there.
pub struct Animation {
    pub frame_counts: &'static [u8],
    pub start_idx: usize,
    pub end_idx: usize,
    pub init_idx: usize,
    pub frame_step: isize,
    pub looped: bool,
    draw: fn(usize, &mut Frame),
}

impl Animation {
    pub fn render(&self, idx: usize, frame: &mut Frame) {
        (self.draw)(idx, frame)
    }

    fn frame_ms(&self, idx: usize) -> u64 {
        ANIM_TICK_MS * u64::from(self.frame_counts.get(idx).copied().unwrap_or(1))
    }
}

/// Eyes open, played once at boot.
pub static WAKE: Animation = Animation {
    frame_counts: &[3, 1, 1, 1, 1, 1, 1, 3],
    start_idx: 0,
    end_idx: EYE_FRAMES - 1,
    init_idx: 0,
    frame_step: 1,
    looped: false,
    draw: eyes_opening,
};

/// Eyes close, played once before ship mode.
pub static SLEEP: Animation = Animation {
    frame_counts: &[5, 1, 1, 1, 1, 1, 1, 3],
    start_idx: EYE_FRAMES - 1,
    end_idx: 0,
    init_idx: EYE_FRAMES - 1,
    frame_step: -1,
    looped: false,
    draw: eyes_opening,
};

/// Looking around with a blink at the end, looped while idle.
pub static IDLE: Animation = Animation {
    frame_counts: &[20, 2, 2, 2, 10, 2, 2, 20, 2, 2, 10, 2, 1],
    start_idx: 0,
    end_idx: IDLE_LOOK.len(),
    init_idx: 0,
    frame_step: 1,
    looped: true,
    draw: eyes_idle,
};

/// Playback position of an [`Animation`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnimState {
    frame_idx: usize,
    frame_start_ms: Option<u64>,
}

impl AnimState {
    pub const fn new() -> Self {
        Self {
            frame_idx: 0,
            frame_start_ms: None,
        }
    }

    /// Frame to show now; starts playback on first use.
    pub fn current(&mut self, anim: &Animation, now_ms: u64) -> usize {
        if self.frame_start_ms.is_none() {
            self.frame_start_ms = Some(now_ms);
            self.frame_idx = anim.init_idx;
        }
        self.frame_idx
    }

    /// Move on once the current frame has been up long enough.
    /// Returns `false` when a one-shot animation has finished.
    pub fn advance(&mut self, anim: &Animation, now_ms: u64) -> bool {
        let start = *self.frame_start_ms.get_or_insert(now_ms);
        if now_ms.saturating_sub(start) <= anim.frame_ms(self.frame_idx) {
            return true;
        }
        if self.frame_idx == anim.end_idx {
            if !anim.looped {
                return false;
            }
            self.frame_idx = anim.start_idx;
        } else {
            self.frame_idx = self.frame_idx.saturating_add_signed(anim.frame_step);
        }
        self.frame_start_ms = Some(now_ms);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(anim: &Animation, step_ms: u64, limit_ms: u64) -> (std::vec::Vec<usize>, Option<u64>) {
        let mut state = AnimState::new();
        let mut shown = std::vec::Vec::new();
        let mut now = 0;
        while now <= limit_ms {
            let idx = state.current(anim, now);
            if shown.last() != Some(&idx) {
                shown.push(idx);
            }
            if !state.advance(anim, now) {
                return (shown, Some(now));
            }
            now += step_ms;
        }
        (shown, None)
    }

    #[test]
    fn wake_plays_forward_once() {
        let (shown, finished) = play(&WAKE, 50, 10_000);
        assert_eq!(shown, (0..EYE_FRAMES).collect::<std::vec::Vec<_>>());
        assert!(finished.is_some());
    }

    #[test]
    fn sleep_plays_backward_once() {
        let (shown, finished) = play(&SLEEP, 50, 10_000);
        assert_eq!(shown, (0..EYE_FRAMES).rev().collect::<std::vec::Vec<_>>());
        assert!(finished.is_some());
    }

    #[test]
    fn idle_loops() {
        let (shown, finished) = play(&IDLE, 50, 30_000);
        assert!(finished.is_none());
        // Wrapped back to the first frame at least once.
        let wrap = shown.iter().skip(1).position(|&i| i == 0);
        assert!(wrap.is_some());
    }

    #[test]
    fn frame_held_for_its_count() {
        let mut state = AnimState::new();
        assert_eq!(state.current(&WAKE, 1_000), 0);
        assert!(state.advance(&WAKE, 1_000 + 3 * ANIM_TICK_MS));
        assert_eq!(state.current(&WAKE, 1_000 + 3 * ANIM_TICK_MS), 0);
        assert!(state.advance(&WAKE, 1_001 + 3 * ANIM_TICK_MS));
        assert_eq!(state.current(&WAKE, 1_001 + 3 * ANIM_TICK_MS), 1);
    }

    #[test]
    fn closed_and_open_eyes_differ() {
        let mut closed = BLANK_FRAME;
        let mut open = BLANK_FRAME;
        WAKE.render(0, &mut closed);
        WAKE.render(EYE_FRAMES - 1, &mut open);
        assert!(get_pixel(&closed, EYE_LEFT_X as usize, EYE_Y as usize));
        assert!(!get_pixel(&closed, EYE_LEFT_X as usize, (EYE_Y - 10) as usize));
        assert!(get_pixel(&open, EYE_LEFT_X as usize, (EYE_Y - 10) as usize));
        // Pupil is cut out.
        assert!(!get_pixel(&open, EYE_LEFT_X as usize, EYE_Y as usize));
    }

    #[test]
    fn pixels_outside_are_ignored() {
        let mut frame = BLANK_FRAME;
        set_pixel(&mut frame, -1, 0, true);
        set_pixel(&mut frame, 0, DISPLAY_HEIGHT as i32, true);
        assert_eq!(frame, BLANK_FRAME);
        set_pixel(&mut frame, 3, 9, true);
        assert_eq!(frame[1][3], 0b10);
        assert!(get_pixel(&frame, 3, 9));
    }
}
