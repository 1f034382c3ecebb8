//! Bird and pipe physics primitives

use rand::Rng;

/// Logical playfield dimensions. The engine always works in this fixed
/// coordinate space; display scaling belongs to the view layer.
pub const PLAYFIELD_WIDTH: f32 = 288.0;
pub const PLAYFIELD_HEIGHT: f32 = 512.0;
/// Height of the ground band at the bottom of the playfield
pub const GROUND_HEIGHT: f32 = 112.0;

/// Bird physics constants
pub const BIRD_X: f32 = 60.0;
pub const BIRD_SIZE: f32 = 38.0;
pub const GRAVITY: f32 = 0.3;
pub const JUMP_IMPULSE: f32 = -6.0;

/// Pipe constants
pub const PIPE_WIDTH: f32 = 52.0;
pub const PIPE_GAP: f32 = 140.0;
pub const PIPE_SPEED: f32 = 1.5;
/// A new pipe spawns every this many frames
pub const PIPE_SPAWN_INTERVAL: u64 = 120;
/// Reserved space below the gap so it never overlaps the ground
const GAP_MARGIN: f32 = 100.0;

/// The player-controlled bird. Horizontal position is fixed at [`BIRD_X`];
/// only the vertical axis is simulated.
#[derive(Debug, Clone)]
pub struct Bird {
    pub y: f32,
    pub velocity: f32,
}

impl Bird {
    pub fn new() -> Self {
        Self {
            y: PLAYFIELD_HEIGHT / 2.0,
            velocity: 0.0,
        }
    }

    /// Jump impulse overrides the current velocity, it is not additive
    pub fn jump(&mut self) {
        self.velocity = JUMP_IMPULSE;
    }

    /// Apply gravity for one frame and clamp to the playfield
    pub fn update(&mut self) {
        self.velocity += GRAVITY;
        self.y += self.velocity;

        let floor = PLAYFIELD_HEIGHT - GROUND_HEIGHT - BIRD_SIZE;
        if self.y < 0.0 {
            self.y = 0.0;
        }
        if self.y > floor {
            self.y = floor;
        }
    }
}

impl Default for Bird {
    fn default() -> Self {
        Self::new()
    }
}

/// A pipe pair scrolling right-to-left with a vertical gap
#[derive(Debug, Clone)]
pub struct Pipe {
    /// Left edge of the pipe
    pub x: f32,
    /// Top boundary of the gap
    pub top: f32,
    /// Set exactly once when the bird clears the pipe
    pub passed: bool,
}

impl Pipe {
    /// Spawn at the right edge with a randomized gap position
    pub fn spawn<R: Rng>(rng: &mut R) -> Self {
        Self {
            x: PLAYFIELD_WIDTH,
            top: rng.gen_range(0.0..PLAYFIELD_HEIGHT - PIPE_GAP - GAP_MARGIN),
            passed: false,
        }
    }

    /// Bottom boundary of the gap
    pub fn bottom(&self) -> f32 {
        self.top + PIPE_GAP
    }

    /// Advance one frame of horizontal scroll
    pub fn update(&mut self) {
        self.x -= PIPE_SPEED;
    }

    /// The pipe's trailing edge has scrolled past the left screen edge
    pub fn off_screen(&self) -> bool {
        self.x + PIPE_WIDTH <= 0.0
    }

    /// The pipe's trailing edge has scrolled past the bird's leading edge
    pub fn cleared_by_bird(&self) -> bool {
        self.x + PIPE_WIDTH < BIRD_X
    }

    /// Collision requires horizontal overlap and the bird strictly
    /// exceeding a gap boundary; exactly touching a boundary is safe.
    pub fn collides(&self, bird: &Bird) -> bool {
        let in_pipe_x = BIRD_X + BIRD_SIZE > self.x && BIRD_X < self.x + PIPE_WIDTH;
        let hit_top = bird.y < self.top;
        let hit_bottom = bird.y + BIRD_SIZE > self.bottom();
        in_pipe_x && (hit_top || hit_bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn bird_clamps_to_playfield_bounds() {
        let mut bird = Bird::new();
        bird.y = 1.0;
        bird.velocity = -100.0;
        bird.update();
        assert_eq!(bird.y, 0.0);

        let floor = PLAYFIELD_HEIGHT - GROUND_HEIGHT - BIRD_SIZE;
        bird.y = floor - 1.0;
        bird.velocity = 100.0;
        bird.update();
        assert_eq!(bird.y, floor);
    }

    #[test]
    fn jump_overrides_velocity() {
        let mut bird = Bird::new();
        bird.velocity = 7.5;
        bird.jump();
        assert_eq!(bird.velocity, JUMP_IMPULSE);
        bird.jump();
        assert_eq!(bird.velocity, JUMP_IMPULSE);
    }

    #[test]
    fn gap_is_always_fully_on_screen() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let pipe = Pipe::spawn(&mut rng);
            assert!(pipe.top >= 0.0);
            assert!(pipe.bottom() < PLAYFIELD_HEIGHT - GAP_MARGIN);
            assert_eq!(pipe.bottom() - pipe.top, PIPE_GAP);
        }
    }

    #[test]
    fn touching_a_gap_boundary_is_not_a_collision() {
        let mut pipe = Pipe {
            x: BIRD_X,
            top: 200.0,
            passed: false,
        };
        let mut bird = Bird::new();

        // Exactly on the top boundary: safe
        bird.y = pipe.top;
        assert!(!pipe.collides(&bird));
        // Strictly above it: hit
        bird.y = pipe.top - 0.1;
        assert!(pipe.collides(&bird));

        // Exactly on the bottom boundary: safe
        bird.y = pipe.bottom() - BIRD_SIZE;
        assert!(!pipe.collides(&bird));
        // Strictly below it: hit
        bird.y = pipe.bottom() - BIRD_SIZE + 0.1;
        assert!(pipe.collides(&bird));

        // No horizontal overlap: never a hit
        pipe.x = BIRD_X + BIRD_SIZE;
        bird.y = 0.0;
        assert!(!pipe.collides(&bird));
    }

    #[test]
    fn pipe_scrolls_left_and_despawns() {
        let mut pipe = Pipe {
            x: PIPE_SPEED,
            top: 100.0,
            passed: false,
        };
        pipe.update();
        assert_eq!(pipe.x, 0.0);
        assert!(!pipe.off_screen());

        pipe.x = -PIPE_WIDTH;
        assert!(pipe.off_screen());
    }
}
