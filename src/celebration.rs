use rand::seq::SliceRandom;
use rand::Rng;
use std::time::{Duration, Instant};

const CONFETTI: [char; 6] = ['*', '+', '.', 'o', '✦', '✧'];
const HEADLINES: [&str; 3] = ["NEW BEST!", "HIGH SCORE!", "RECORD!"];
const GRAVITY: f64 = 12.0;
const STEP_SECS: f64 = 0.1;

/// One glyph in the new-high-score animation
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
    /// Part of the headline: glides to its slot instead of falling
    pub is_text: bool,
    pub target_x: f64,
    pub target_y: f64,
}

impl Particle {
    fn confetti<R: Rng>(x: f64, y: f64, rng: &mut R) -> Self {
        Self {
            x,
            y,
            vel_x: rng.gen_range(-3.0..3.0),
            vel_y: rng.gen_range(-5.0..-1.5),
            symbol: *CONFETTI.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(1.5..3.0),
            is_text: false,
            target_x: x,
            target_y: y,
        }
    }

    fn letter(from: (f64, f64), to: (f64, f64), symbol: char, color_index: usize) -> Self {
        Self {
            x: from.0,
            y: from.1,
            vel_x: to.0 - from.0,
            vel_y: to.1 - from.1,
            symbol,
            color_index,
            age: 0.0,
            max_age: 4.0,
            is_text: true,
            target_x: to.0,
            target_y: to.1,
        }
    }

    /// Advance by `dt` seconds; returns false once the particle has expired
    fn update(&mut self, dt: f64) -> bool {
        if self.is_text {
            let dist = ((self.target_x - self.x).powi(2) + (self.target_y - self.y).powi(2)).sqrt();
            if dist > 0.5 {
                self.x += self.vel_x * dt * 2.0;
                self.y += self.vel_y * dt * 2.0;
                self.vel_x *= 0.9;
                self.vel_y *= 0.9;
            } else {
                self.x = self.target_x;
                self.y = self.target_y;
            }
        } else {
            self.x += self.vel_x * dt;
            self.y += self.vel_y * dt;
            self.vel_y += GRAVITY * dt;
        }

        self.age += dt;
        self.age < self.max_age
    }
}

/// Confetti and a headline shown when a session beats the previous best
#[derive(Debug)]
pub struct Celebration {
    pub particles: Vec<Particle>,
    pub headline: String,
    started: Instant,
    duration: Duration,
    pub is_active: bool,
    width: f64,
    height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            headline: String::new(),
            started: Instant::now(),
            duration: Duration::from_secs(3),
            is_active: false,
            width: 80.0,
            height: 24.0,
        }
    }

    pub fn start(&mut self, width: u16, height: u16, wpm: u32) {
        let mut rng = rand::thread_rng();

        self.particles.clear();
        self.started = Instant::now();
        self.is_active = true;
        self.width = width as f64;
        self.height = height as f64;

        let center = (self.width / 2.0, self.height / 2.0);
        let headline = HEADLINES.choose(&mut rng).unwrap_or(&HEADLINES[0]);
        self.headline = format!("{headline} {wpm} WPM");

        let spacing = 2.0;
        let left = center.0 - (self.headline.chars().count() as f64 - 1.0) * spacing / 2.0;
        for (i, ch) in self.headline.chars().enumerate().filter(|(_, c)| *c != ' ') {
            let from = (
                center.0 + rng.gen_range(-10.0..10.0),
                center.1 + rng.gen_range(-5.0..5.0),
            );
            let to = (left + i as f64 * spacing, center.1 - 2.0);
            self.particles
                .push(Particle::letter(from, to, ch, rng.gen_range(0..7)));
        }

        for _ in 0..30 {
            let x = center.0 + rng.gen_range(-15.0..15.0);
            let y = center.1 + rng.gen_range(-6.0..6.0);
            self.particles.push(Particle::confetti(x, y, &mut rng));
        }
    }

    /// Advance one animation frame
    pub fn update(&mut self) {
        if !self.is_active {
            return;
        }

        if self.started.elapsed() >= self.duration {
            self.stop();
            return;
        }

        let (width, height) = (self.width, self.height);
        self.particles.retain_mut(|p| {
            let alive = p.update(STEP_SECS);
            let margin = 5.0;
            let off_screen = !p.is_text && (p.y > height + margin || p.x < -margin || p.x > width + margin);
            alive && !off_screen
        });
    }

    pub fn stop(&mut self) {
        self.is_active = false;
        self.particles.clear();
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new()
    }
}
