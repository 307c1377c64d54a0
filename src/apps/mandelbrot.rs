//! Mandelbrot set viewer with pan and zoom.

use crate::apps::app::AppKey;
use crate::config::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::ui::anim::{clear_frame, set_pixel, Frame};

/// Pixels per unit at startup.
const INITIAL_SCALE: f32 = 32.0;
const MIN_SCALE: f32 = 8.0;
const MAX_SCALE: f32 = 32.0 * 65_536.0;

/// Whether `c = re + im·i` stays bounded for `max_iter` iterations.
pub fn point_in_set(re: f32, im: f32, max_iter: u8) -> bool {
    let (mut z_re, mut z_im) = (0.0f32, 0.0f32);
    for _ in 0..max_iter {
        let (re_sq, im_sq) = (z_re * z_re, z_im * z_im);
        if re_sq + im_sq > 4.0 {
            return false;
        }
        z_im = 2.0 * z_re * z_im + im;
        z_re = re_sq - im_sq + re;
    }
    true
}

/// More iterations as the view zooms in.
pub fn max_iter(scale: f32) -> u8 {
    if scale <= INITIAL_SCALE * 4.0 {
        20
    } else if scale <= INITIAL_SCALE * 8.0 {
        30
    } else {
        40
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mandelbrot {
    pub center_re: f32,
    pub center_im: f32,
    /// Pixels per unit.
    pub scale: f32,
    last_key: AppKey,
}

impl Default for Mandelbrot {
    fn default() -> Self {
        Self::new()
    }
}

impl Mandelbrot {
    pub const fn new() -> Self {
        Self {
            center_re: 0.0,
            center_im: 0.0,
            scale: INITIAL_SCALE,
            last_key: AppKey::None,
        }
    }

    /// Complex coordinate of a screen pixel.
    pub fn pixel_to_complex(&self, x: usize, y: usize) -> (f32, f32) {
        (
            (x as f32 - (DISPLAY_WIDTH / 2) as f32) / self.scale + self.center_re,
            (y as f32 - (DISPLAY_HEIGHT / 2) as f32) / self.scale + self.center_im,
        )
    }

    /// React to a newly pressed key; holding a key acts once.
    /// Returns whether the view changed.
    pub fn on_key(&mut self, key: AppKey) -> bool {
        let pressed = key != self.last_key;
        self.last_key = key;
        if !pressed {
            return false;
        }
        match key {
            AppKey::Select if self.scale < MAX_SCALE => self.scale *= 2.0,
            AppKey::Back if self.scale > MIN_SCALE => self.scale /= 2.0,
            AppKey::Up => self.center_im -= 16.0 / self.scale,
            AppKey::Down => self.center_im += 16.0 / self.scale,
            AppKey::Left => self.center_re -= 32.0 / self.scale,
            AppKey::Right => self.center_re += 32.0 / self.scale,
            _ => return false,
        }
        true
    }

    pub fn render(&self, frame: &mut Frame) {
        clear_frame(frame);
        let iterations = max_iter(self.scale);
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                let (re, im) = self.pixel_to_complex(x, y);
                if point_in_set(re, im, iterations) {
                    set_pixel(frame, x as i32, y as i32, true);
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
    fn known_points() {
        assert!(point_in_set(0.0, 0.0, 40));
        assert!(point_in_set(-1.0, 0.0, 40));
        assert!(!point_in_set(1.0, 1.0, 40));
        assert!(!point_in_set(-2.5, 0.0, 40));
    }

    #[test]
    fn iterations_grow_with_zoom() {
        assert_eq!(max_iter(INITIAL_SCALE), 20);
        assert_eq!(max_iter(INITIAL_SCALE * 8.0), 30);
        assert_eq!(max_iter(INITIAL_SCALE * 16.0), 40);
    }

    #[test]
    fn held_key_acts_once() {
        let mut view = Mandelbrot::new();
        assert!(view.on_key(AppKey::Select));
        assert!(!view.on_key(AppKey::Select));
        assert_eq!(view.scale, INITIAL_SCALE * 2.0);
        assert!(!view.on_key(AppKey::None));
        assert!(view.on_key(AppKey::Back));
        assert_eq!(view.scale, INITIAL_SCALE);
    }

    #[test]
    fn panning_moves_by_screen_fraction() {
        let mut view = Mandelbrot::new();
        view.on_key(AppKey::Right);
        assert_eq!(view.center_re, 1.0);
        view.on_key(AppKey::Down);
        assert_eq!(view.center_im, 0.5);
    }

    #[test]
    fn origin_is_drawn_at_centre() {
        let view = Mandelbrot::new();
        assert_eq!(view.pixel_to_complex(DISPLAY_WIDTH / 2, DISPLAY_HEIGHT / 2), (0.0, 0.0));
        let mut frame = BLANK_FRAME;
        view.render(&mut frame);
        assert!(get_pixel(&frame, DISPLAY_WIDTH / 2, DISPLAY_HEIGHT / 2));
        assert!(!get_pixel(&frame, DISPLAY_WIDTH - 1, 0));
    }
}
