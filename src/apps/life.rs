//! Conway's game of life on a 64×32 torus, drawn with 2×2 pixel cells.

use crate::ui::anim::{clear_frame, set_pixel, Frame};

pub const LIFE_WIDTH: usize = 64;
pub const LIFE_HEIGHT: usize = 32;

const CELL_PX: i32 = 2;

pub struct Life {
    /// One row per entry, bit `x` is column `x`.
    rows: [u64; LIFE_HEIGHT],
}

/// xorshift32; `state` must be non-zero.
pub fn next_random(state: &mut u32) -> u32 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    *state = x;
    x
}

impl Life {
    pub const fn empty() -> Self {
        Self {
            rows: [0; LIFE_HEIGHT],
        }
    }

    /// Random soup from `seed`.
    pub fn random(seed: u32) -> Self {
        let mut state = if seed == 0 { 0x2545_f491 } else { seed };
        let mut life = Self::empty();
        for row in life.rows.iter_mut() {
            let hi = u64::from(next_random(&mut state));
            let lo = u64::from(next_random(&mut state));
            *row = (hi << 32) | lo;
        }
        life
    }

    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        x < LIFE_WIDTH && y < LIFE_HEIGHT && self.rows[y] & (1 << x) != 0
    }

    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        if x >= LIFE_WIDTH || y >= LIFE_HEIGHT {
            return;
        }
        if alive {
            self.rows[y] |= 1 << x;
        } else {
            self.rows[y] &= !(1 << x);
        }
    }

    pub fn population(&self) -> u32 {
        self.rows.iter().map(|row| row.count_ones()).sum()
    }

    fn neighbours(&self, x: usize, y: usize) -> u8 {
        let mut count = 0;
        for dy in [LIFE_HEIGHT - 1, 0, 1] {
            for dx in [LIFE_WIDTH - 1, 0, 1] {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = (x + dx) % LIFE_WIDTH;
                let ny = (y + dy) % LIFE_HEIGHT;
                if self.is_alive(nx, ny) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Advance one generation.
    pub fn step(&mut self) {
        let mut next = Self::empty();
        for y in 0..LIFE_HEIGHT {
            for x in 0..LIFE_WIDTH {
                let n = self.neighbours(x, y);
                let alive = matches!((self.is_alive(x, y), n), (true, 2) | (_, 3));
                next.set(x, y, alive);
            }
        }
        *self = next;
    }

    pub fn render(&self, frame: &mut Frame) {
        clear_frame(frame);
        for y in 0..LIFE_HEIGHT {
            for x in 0..LIFE_WIDTH {
                if !self.is_alive(x, y) {
                    continue;
                }
                let (px, py) = (x as i32 * CELL_PX, y as i32 * CELL_PX);
                for d in 0..CELL_PX * CELL_PX {
                    set_pixel(frame, px + d % CELL_PX, py + d / CELL_PX, true);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::anim::{get_pixel, BLANK_FRAME};

    #[test]
    fn blinker_oscillates() {
        let mut life = Life::empty();
        for x in 10..13 {
            life.set(x, 5, true);
        }
        life.step();
        assert!(life.is_alive(11, 4) && life.is_alive(11, 5) && life.is_alive(11, 6));
        assert!(!life.is_alive(10, 5) && !life.is_alive(12, 5));
        life.step();
        assert!(life.is_alive(10, 5) && life.is_alive(11, 5) && life.is_alive(12, 5));
        assert_eq!(life.population(), 3);
    }

    #[test]
    fn board_wraps_around() {
        let mut life = Life::empty();
        // Vertical blinker across the left/right edge.
        life.set(LIFE_WIDTH - 1, 0, true);
        life.set(0, 0, true);
        life.set(1, 0, true);
        life.step();
        assert!(life.is_alive(0, LIFE_HEIGHT - 1));
        assert!(life.is_alive(0, 1));
        assert_eq!(life.population(), 3);
    }

    #[test]
    fn block_is_still() {
        let mut life = Life::empty();
        for (x, y) in [(3, 3), (4, 3), (3, 4), (4, 4)] {
            life.set(x, y, true);
        }
        life.step();
        assert_eq!(life.population(), 4);
        assert!(life.is_alive(4, 4));
    }

    #[test]
    fn random_is_seeded() {
        assert_eq!(Life::random(5).rows, Life::random(5).rows);
        assert_ne!(Life::random(5).rows, Life::random(6).rows);
        assert!(Life::random(0).population() > 0);
    }

    #[test]
    fn cells_are_two_pixels() {
        let mut life = Life::empty();
        life.set(3, 2, true);
        let mut frame = BLANK_FRAME;
        life.render(&mut frame);
        assert!(get_pixel(&frame, 6, 4) && get_pixel(&frame, 7, 5));
        assert!(!get_pixel(&frame, 8, 4));
    }
}
