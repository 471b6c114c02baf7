use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{config::GameConfig, error::GameError, types::PixelPoint};

const COLOR_CHANNEL_MIN: u8 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Target {
    pub center: PixelPoint,
    pub radius: i32,
    pub color: [u8; 3],
}

/// Playfield dimensions plus the band targets must stay inside.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arena {
    width: u32,
    height: u32,
    radius: u32,
    margin: u32,
}

impl Arena {
    pub fn new(width: u32, height: u32, radius: u32, margin: u32) -> Result<Self, GameError> {
        let inset = radius.saturating_add(margin);
        let required = inset.saturating_mul(2);
        if width < required || height < required {
            return Err(GameError::ArenaTooSmall {
                width,
                height,
                required,
            });
        }
        Ok(Self {
            width,
            height,
            radius,
            margin,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Distance from any border a target center must keep.
    pub fn inset(&self) -> u32 {
        self.radius + self.margin
    }

    /// Inclusive range of valid center x coordinates.
    pub fn x_range(&self) -> (i32, i32) {
        (self.inset() as i32, (self.width - self.inset()) as i32)
    }

    /// Inclusive range of valid center y coordinates.
    pub fn y_range(&self) -> (i32, i32) {
        (self.inset() as i32, (self.height - self.inset()) as i32)
    }

    pub fn contains_center(&self, center: PixelPoint) -> bool {
        let (x_lo, x_hi) = self.x_range();
        let (y_lo, y_hi) = self.y_range();
        (x_lo..=x_hi).contains(&center.x) && (y_lo..=y_hi).contains(&center.y)
    }
}

/// Owns the single live target and the running score.
pub struct TargetManager<R: Rng = StdRng> {
    arena: Arena,
    target: Target,
    score: u32,
    rng: R,
}

impl TargetManager<StdRng> {
    pub fn from_config(width: u32, height: u32, config: &GameConfig) -> Result<Self, GameError> {
        let arena = Arena::new(width, height, config.target_radius, config.target_margin)?;
        Ok(Self::new(arena, StdRng::from_entropy()))
    }
}

impl<R: Rng> TargetManager<R> {
    pub fn new(arena: Arena, mut rng: R) -> Self {
        let target = random_target(&arena, &mut rng);
        Self {
            arena,
            target,
            score: 0,
            rng,
        }
    }

    pub fn place_new_target(&mut self) {
        self.target = random_target(&self.arena, &mut self.rng);
    }

    pub fn register_hit(&mut self) {
        self.score = self.score.saturating_add(1);
        self.place_new_target();
    }

    pub fn reset_score(&mut self) {
        self.score = 0;
        self.place_new_target();
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn center(&self) -> PixelPoint {
        self.target.center
    }

    pub fn radius(&self) -> i32 {
        self.target.radius
    }

    pub fn color(&self) -> [u8; 3] {
        self.target.color
    }

    pub fn score(&self) -> u32 {
        self.score
    }
}

fn random_target<R: Rng>(arena: &Arena, rng: &mut R) -> Target {
    let (x_lo, x_hi) = arena.x_range();
    let (y_lo, y_hi) = arena.y_range();
    let center = PixelPoint::new(rng.gen_range(x_lo..=x_hi), rng.gen_range(y_lo..=y_hi));
    let color = [
        rng.gen_range(COLOR_CHANNEL_MIN..=u8::MAX),
        rng.gen_range(COLOR_CHANNEL_MIN..=u8::MAX),
        rng.gen_range(COLOR_CHANNEL_MIN..=u8::MAX),
    ];
    Target {
        center,
        radius: arena.radius as i32,
        color,
    }
}
