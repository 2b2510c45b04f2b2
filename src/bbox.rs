/// Axis-aligned bounding box accumulated from points.
///
/// An empty box is invalid and has no meaningful extent. Once a point was added,
/// `min_x <= max_x` and `min_y <= max_y` hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub is_valid: bool,
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
            is_valid: false,
        }
    }
}

impl BoundingBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extends the box to contain `(x, y)`.
    pub fn update(&mut self, x: f64, y: f64) {
        if !self.is_valid {
            self.min_x = x;
            self.max_x = x;
            self.min_y = y;
            self.max_y = y;
            self.is_valid = true;
            return;
        }
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    /// Extends the box to contain `other`.
    pub fn expand(&mut self, other: &BoundingBox) {
        if other.is_valid {
            self.update(other.min_x, other.min_y);
            self.update(other.max_x, other.max_y);
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Area in square kilometers, with coordinates taken as meters. 0 for an invalid box.
    pub fn area_km2(&self) -> f64 {
        if !self.is_valid {
            return 0.0;
        }
        self.width() * self.height() / 1_000_000.0
    }
}
