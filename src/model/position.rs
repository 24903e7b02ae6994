use crate::model::constants::{
    AWAY_TARGET_X, D8_COMPASS, HOME_TARGET_X, PITCH_HEIGHT, PITCH_WIDTH, WIDE_ZONE_DEPTH,
};
use crate::model::enums::Side;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize, Hash, Default,
)]
pub struct Square {
    pub x: i32,
    pub y: i32,
}

impl Square {
    pub fn new(x: i32, y: i32) -> Self {
        Square { x, y }
    }

    /// Chebyshev distance (king move).
    pub fn distance(&self, other: &Square) -> u32 {
        (self.x - other.x).abs().max((self.y - other.y).abs()) as u32
    }

    /// Manhattan distance (sum of x and y differences).
    pub fn manhattan_distance(&self, other: &Square) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    /// Returns true if the square is adjacent (distance = 1).
    pub fn is_adjacent(&self, other: &Square) -> bool {
        self.distance(other) == 1
    }

    pub fn is_on_pitch(&self) -> bool {
        (0..PITCH_WIDTH).contains(&self.x) && (0..PITCH_HEIGHT).contains(&self.y)
    }

    /// The endzone column `side` scores in: x = 25 for home, x = 0 for away.
    pub fn is_endzone(&self, side: Side) -> bool {
        match side {
            Side::Home => self.x == HOME_TARGET_X,
            Side::Away => self.x == AWAY_TARGET_X,
        }
    }

    pub fn is_wide_zone(&self) -> bool {
        self.y < WIDE_ZONE_DEPTH || self.y >= PITCH_HEIGHT - WIDE_ZONE_DEPTH
    }

    /// Offset by a D8 compass roll (1..=8).
    pub fn compass_neighbour(&self, d8_roll: u8) -> Square {
        let (dx, dy) = D8_COMPASS[(d8_roll - 1) as usize];
        Square::new(self.x + dx, self.y + dy)
    }

    /// Up to 8 on-pitch neighbours, in lexicographic order.
    pub fn adjacent_squares(&self) -> Vec<Square> {
        let mut adjacent = Vec::with_capacity(8);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let square = Square::new(self.x + dx, self.y + dy);
                if square.is_on_pitch() {
                    adjacent.push(square);
                }
            }
        }
        adjacent
    }

    /// Squares at exactly Chebyshev distance 2, on pitch, in lexicographic
    /// order. Used for leap destinations.
    pub fn squares_at_distance_two(&self) -> Vec<Square> {
        let mut squares = Vec::new();
        for dx in -2..=2i32 {
            for dy in -2..=2i32 {
                if dx.abs().max(dy.abs()) != 2 {
                    continue;
                }
                let square = Square::new(self.x + dx, self.y + dy);
                if square.is_on_pitch() {
                    squares.push(square);
                }
            }
        }
        squares
    }

    /// Nearest on-pitch sideline square to an off-pitch ball, used as the
    /// origin for throw-ins. Clamps into the pitch rectangle.
    pub fn clamped_to_pitch(&self) -> Square {
        Square::new(
            self.x.clamp(0, PITCH_WIDTH - 1),
            self.y.clamp(0, PITCH_HEIGHT - 1),
        )
    }

    /// Squares crossed by a pass from `self` to `to`, inclusive of both
    /// ends, following a Bresenham line.
    pub fn pass_path(&self, to: &Square) -> Vec<Square> {
        let (mut x1, mut y1) = (self.x, self.y);
        let (mut x2, mut y2) = (to.x, to.y);

        let is_steep = (y2 - y1).abs() > (x2 - x1).abs();
        if is_steep {
            std::mem::swap(&mut x1, &mut y1);
            std::mem::swap(&mut x2, &mut y2);
        }

        let swapped = if x1 > x2 {
            std::mem::swap(&mut x1, &mut x2);
            std::mem::swap(&mut y1, &mut y2);
            true
        } else {
            false
        };

        let dx = x2 - x1;
        let dy = y2 - y1;
        let mut error = dx / 2;
        let ystep = if y1 < y2 { 1 } else { -1 };

        let mut y = y1;
        let mut path = vec![];
        for x in x1..=x2 {
            if is_steep {
                path.push(Square::new(y, x));
            } else {
                path.push(Square::new(x, y));
            }
            error -= dy.abs();
            if error < 0 {
                y += ystep;
                error += dx;
            }
        }

        if swapped {
            path.reverse();
        }

        path
    }
}
