//! Lunar lander.  Rotate with left/right, thrust with up and set down
//! upright and slow on the pad at the right edge.

use crate::apps::app::AppKey;
use crate::apps::life::next_random;
use crate::config::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::ui::anim::{clear_frame, set_pixel, Frame};

const GRAVITY: f32 = 0.005;
const THRUST: f32 = 0.01;
const PAD_WIDTH: i32 = 14;
const WIDTH: i32 = DISPLAY_WIDTH as i32;
const HEIGHT: i32 = DISPLAY_HEIGHT as i32;

/// Degrees turned per period while left or right is held.
const TURN_DEG: i32 = 4;

const COS_1DEG: f32 = 0.999_848;
const SIN_1DEG: f32 = 0.017_452_4;

fn abs(v: f32) -> f32 {
    if v < 0.0 {
        -v
    } else {
        v
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }

    fn scale(self, k: f32) -> Vec2 {
        Vec2::new(self.x * k, self.y * k)
    }

    /// Rotate clockwise on screen (y grows downwards) in one-degree steps.
    pub fn rotated(self, degrees: i32) -> Vec2 {
        let sin = if degrees > 0 { SIN_1DEG } else { -SIN_1DEG };
        let mut v = self;
        for _ in 0..degrees.unsigned_abs() {
            v = Vec2::new(COS_1DEG * v.x - sin * v.y, sin * v.x + COS_1DEG * v.y);
        }
        v
    }

    fn to_px(self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Ship {
    pos: Vec2,
    v: Vec2,
    /// Unit vector the nose points along.
    dir: Vec2,
    /// Hull outline relative to `pos`: nose, right foot, left foot, notch.
    nose: Vec2,
    right: Vec2,
    left: Vec2,
    notch: Vec2,
    thrust_on: bool,
}

impl Ship {
    const fn on_launch_pad() -> Self {
        Self {
            pos: Vec2::new(7.0, (HEIGHT - 1 - 5) as f32),
            v: Vec2::new(0.0, 0.0),
            dir: Vec2::new(0.0, -1.0),
            nose: Vec2::new(0.0, -10.0),
            right: Vec2::new(5.0, 5.0),
            left: Vec2::new(-5.0, 5.0),
            notch: Vec2::new(0.0, -1.0),
            thrust_on: false,
        }
    }

    fn rotate(&mut self, degrees: i32) {
        self.dir = self.dir.rotated(degrees);
        self.nose = self.nose.rotated(degrees);
        self.right = self.right.rotated(degrees);
        self.left = self.left.rotated(degrees);
        self.notch = self.notch.rotated(degrees);
    }

    fn render(&self, frame: &mut Frame) {
        let at = |p: Vec2| p.add(self.pos).to_px();
        fill_triangle(frame, at(self.nose), at(self.right), at(self.left), true);
        fill_triangle(frame, at(self.left), at(self.right), at(self.notch), false);

        if self.thrust_on {
            let origin = at(self.notch);
            let mut plume = self.dir.scale(-8.0).rotated(-35);
            for _ in 0..5 {
                plume = plume.rotated(10);
                let tip = self.notch.add(self.pos).add(plume).to_px();
                draw_line(frame, origin, tip, true);
            }
        }
    }
}

/// Ground profile: launch pad on the left, three random peaks, landing pad
/// on the right at `landing_y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Terrain {
    pub peaks: [(i32, i32); 3],
    pub landing_y: i32,
}

/// Uniform-ish integer in `min..=max`.
fn randint(state: &mut u32, min: i32, max: i32) -> i32 {
    let span = (max - min + 1).max(1) as u32;
    min + (next_random(state) % span) as i32
}

impl Terrain {
    fn random(state: &mut u32) -> Self {
        let x1 = randint(state, PAD_WIDTH + 4, 44);
        let y1 = randint(state, 20, HEIGHT - 1);
        let x2 = randint(state, x1, 74);
        let y2 = randint(state, 20, HEIGHT - 1);
        let x3 = randint(state, x2, 104);
        let y3 = randint(state, 20, HEIGHT - 1);
        Self {
            peaks: [(x1, y1), (x2, y2), (x3, y3)],
            landing_y: randint(state, 20, HEIGHT - 2),
        }
    }

    /// Outline from left to right.
    fn outline(&self) -> [(i32, i32); 7] {
        let [p1, p2, p3] = self.peaks;
        [
            (0, HEIGHT - 1),
            (PAD_WIDTH, HEIGHT - 1),
            p1,
            p2,
            p3,
            (WIDTH - 1 - PAD_WIDTH, self.landing_y),
            (WIDTH - 1, self.landing_y),
        ]
    }

    fn render(&self, frame: &mut Frame) {
        let outline = self.outline();
        for pair in outline.windows(2) {
            draw_line(frame, pair[0], pair[1], true);
        }
        // Thicker landing pad.
        draw_line(
            frame,
            (WIDTH - 1 - PAD_WIDTH, self.landing_y + 1),
            (WIDTH - 1, self.landing_y + 1),
            true,
        );
    }

    /// Whether `p` is below the ground line, with a two pixel margin
    /// because the filled hull does not reach its corner points.
    fn hits(&self, p: Vec2) -> bool {
        let outline = self.outline();
        for pair in outline.windows(2) {
            let ((x1, y1), (x2, y2)) = (pair[0], pair[1]);
            if p.x > x1 as f32 && p.x <= x2 as f32 {
                let ground = 2.0
                    + (y2 - y1) as f32 / (x2 - x1) as f32 * (p.x - x1 as f32)
                    + y1 as f32;
                return p.y > ground;
            }
        }
        if p.x > 0.0 {
            // Past the right edge of the pad.
            return p.y > (2 + self.landing_y) as f32;
        }
        p.y > (1 + HEIGHT) as f32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LanderPhase {
    /// Stage drawn, waiting for any key.
    Ready,
    Flying,
    /// Touched down; select starts the next stage.
    Landed,
    /// Game over; wake leaves.
    Crashed,
}

pub struct Lander {
    ship: Ship,
    terrain: Terrain,
    phase: LanderPhase,
    points: u16,
    rng: u32,
}

impl Lander {
    pub fn new(seed: u32) -> Self {
        let mut rng = if seed == 0 { 0x9e37_79b9 } else { seed };
        let terrain = Terrain::random(&mut rng);
        Self {
            ship: Ship::on_launch_pad(),
            terrain,
            phase: LanderPhase::Ready,
            points: 0,
            rng,
        }
    }

    pub fn phase(&self) -> LanderPhase {
        self.phase
    }

    pub fn points(&self) -> u16 {
        self.points
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    fn next_stage(&mut self) {
        self.ship = Ship::on_launch_pad();
        self.terrain = Terrain::random(&mut self.rng);
        self.phase = LanderPhase::Ready;
    }

    fn landed(&self) -> bool {
        let pad_center = (WIDTH - 1 - PAD_WIDTH / 2) as f32;
        let ship = &self.ship;
        ship.pos.x >= pad_center - 5.0
            && ship.pos.x <= pad_center + 5.0
            && ship.pos.y > (self.terrain.landing_y - 5) as f32
            && ship.dir.y < -0.97
            && abs(ship.v.x) < 0.1
            && abs(ship.v.y) < 0.1
    }

    fn crashed(&self) -> bool {
        let pos = self.ship.pos;
        if pos.x < -14.0 || pos.x >= (WIDTH + 14) as f32 || pos.y <= -14.0 || pos.y >= HEIGHT as f32
        {
            return true;
        }
        [self.ship.nose, self.ship.right, self.ship.left]
            .iter()
            .any(|p| self.terrain.hits(p.add(pos)))
    }

    /// Advance one period with `key` held.  Returns whether to redraw.
    pub fn update(&mut self, key: AppKey) -> bool {
        match self.phase {
            LanderPhase::Ready => {
                if key == AppKey::None {
                    return false;
                }
                self.phase = LanderPhase::Flying;
                true
            }
            LanderPhase::Flying => {
                let ship = &mut self.ship;
                ship.pos = ship.pos.add(ship.v);
                ship.v.y += GRAVITY;
                ship.thrust_on = false;
                match key {
                    AppKey::Left => ship.rotate(-TURN_DEG),
                    AppKey::Right => ship.rotate(TURN_DEG),
                    AppKey::Up => {
                        ship.v = ship.v.add(ship.dir.scale(THRUST));
                        ship.thrust_on = true;
                    }
                    _ => {}
                }

                if self.landed() {
                    self.points = self.points.saturating_add(1);
                    self.phase = LanderPhase::Landed;
                } else if self.crashed() {
                    self.phase = LanderPhase::Crashed;
                }
                true
            }
            LanderPhase::Landed => {
                if key != AppKey::Select {
                    return false;
                }
                self.next_stage();
                true
            }
            LanderPhase::Crashed => false,
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        clear_frame(frame);
        self.ship.render(frame);
        self.terrain.render(frame);
    }
}

fn draw_line(frame: &mut Frame, (x0, y0): (i32, i32), (x1, y1): (i32, i32), on: bool) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let (mut x, mut y, mut err) = (x0, y0, dx + dy);
    loop {
        set_pixel(frame, x, y, on);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn fill_triangle(frame: &mut Frame, a: (i32, i32), b: (i32, i32), c: (i32, i32), on: bool) {
    let edge = |p: (i32, i32), q: (i32, i32), x: i32, y: i32| {
        (q.0 - p.0) * (y - p.1) - (q.1 - p.1) * (x - p.0)
    };
    let min_x = a.0.min(b.0).min(c.0).max(0);
    let max_x = a.0.max(b.0).max(c.0).min(WIDTH - 1);
    let min_y = a.1.min(b.1).min(c.1).max(0);
    let max_y = a.1.max(b.1).max(c.1).min(HEIGHT - 1);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let (e0, e1, e2) = (edge(a, b, x, y), edge(b, c, x, y), edge(c, a, x, y));
            let inside = (e0 >= 0 && e1 >= 0 && e2 >= 0) || (e0 <= 0 && e1 <= 0 && e2 <= 0);
            if inside {
                set_pixel(frame, x, y, on);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::anim::{get_pixel, BLANK_FRAME};

    fn flying(seed: u32) -> Lander {
        let mut lander = Lander::new(seed);
        assert!(lander.update(AppKey::Up));
        assert_eq!(lander.phase(), LanderPhase::Flying);
        lander
    }

    #[test]
    fn terrain_stays_on_screen_and_ordered() {
        for seed in 1..50 {
            let terrain = Lander::new(seed).terrain;
            let [p1, p2, p3] = terrain.peaks;
            assert!(p1.0 >= PAD_WIDTH + 4 && p1.0 <= p2.0 && p2.0 <= p3.0 && p3.0 <= 104);
            for (_, y) in terrain.peaks {
                assert!((20..HEIGHT).contains(&y));
            }
            assert!((20..HEIGHT - 1).contains(&terrain.landing_y));
        }
    }

    #[test]
    fn waits_for_a_key_before_flying() {
        let mut lander = Lander::new(3);
        assert!(!lander.update(AppKey::None));
        assert_eq!(lander.phase(), LanderPhase::Ready);
        assert!(lander.update(AppKey::Left));
        assert_eq!(lander.phase(), LanderPhase::Flying);
    }

    #[test]
    fn falling_without_thrust_crashes() {
        let mut lander = flying(11);
        for _ in 0..1_000 {
            lander.update(AppKey::None);
            if lander.phase() == LanderPhase::Crashed {
                break;
            }
        }
        assert_eq!(lander.phase(), LanderPhase::Crashed);
        assert_eq!(lander.points(), 0);
        // Only wake gets out of a crash.
        assert!(!lander.update(AppKey::Select));
        assert_eq!(lander.phase(), LanderPhase::Crashed);
    }

    #[test]
    fn slow_upright_touchdown_on_pad_scores() {
        let mut lander = flying(5);
        let pad_y = lander.terrain.landing_y;
        lander.ship.pos = Vec2::new((WIDTH - 1 - PAD_WIDTH / 2) as f32, (pad_y - 4) as f32);
        lander.ship.v = Vec2::new(0.0, 0.0);
        lander.update(AppKey::None);
        assert_eq!(lander.phase(), LanderPhase::Landed);
        assert_eq!(lander.points(), 1);

        assert!(!lander.update(AppKey::Up));
        assert!(lander.update(AppKey::Select));
        assert_eq!(lander.phase(), LanderPhase::Ready);
        assert_eq!(lander.points(), 1);
    }

    #[test]
    fn tilted_touchdown_does_not_score() {
        let mut lander = flying(5);
        let pad_y = lander.terrain.landing_y;
        lander.ship.pos = Vec2::new((WIDTH - 1 - PAD_WIDTH / 2) as f32, (pad_y - 4) as f32);
        lander.ship.v = Vec2::new(0.0, 0.0);
        lander.ship.rotate(20);
        lander.update(AppKey::None);
        assert_ne!(lander.phase(), LanderPhase::Landed);
    }

    #[test]
    fn thrust_pushes_along_the_nose() {
        let mut lander = flying(9);
        let before = lander.ship.v.y;
        lander.update(AppKey::Up);
        // Gravity adds 0.005, thrust removes 0.01.
        assert!(lander.ship.v.y < before);
        assert!(lander.ship.thrust_on);
    }

    #[test]
    fn turning_back_restores_heading() {
        let dir = Vec2::new(0.0, -1.0).rotated(TURN_DEG).rotated(-TURN_DEG);
        assert!(abs(dir.x) < 1e-3);
        assert!(abs(dir.y + 1.0) < 1e-3);
        let right = Vec2::new(0.0, -1.0).rotated(90);
        assert!(abs(right.x - 1.0) < 1e-2);
    }

    #[test]
    fn render_draws_ship_and_ground() {
        let lander = Lander::new(2);
        let mut frame = BLANK_FRAME;
        lander.render(&mut frame);
        // Launch pad line and the hull above it.
        assert!(get_pixel(&frame, 3, DISPLAY_HEIGHT - 1));
        assert!(get_pixel(&frame, 7, (HEIGHT - 1 - 8) as usize));
    }
}
