use derive_more::{Add, Display, From, Into, Sub};

/// Absolute screen coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Add, Sub, From, Into, Display)]
#[display("({x}, {y})")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Multiplies both axes by `factor`, truncating toward zero.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self {
            x: (f64::from(self.x) * factor) as i32,
            y: (f64::from(self.y) * factor) as i32,
        }
    }
}

/// Screen region of a matched template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    top_left: Point,
    width: i32,
    height: i32,
}

impl Rect {
    pub const fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            top_left: Point::new(x, y),
            width,
            height,
        }
    }

    pub fn top_left(&self) -> Point {
        self.top_left
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Half sizes are rounded down.
    pub fn center(&self) -> Point {
        self.top_left + Point::new(self.width / 2, self.height / 2)
    }
}

#[test]
fn center_and_scale() {
    let region = Rect::from_xywh(100, 100, 20, 20);
    assert_eq!(region.center(), Point::new(110, 110));
    assert_eq!(region.center().scale(0.5), Point::new(55, 55));
}

#[test]
fn odd_sizes_round_down() {
    let region = Rect::from_xywh(10, 20, 5, 7);
    assert_eq!(region.center(), Point::new(12, 23));
    assert_eq!(region.center().scale(0.5), Point::new(6, 11));
}

#[test]
fn point_display() {
    assert_eq!(Point::new(55, -3).to_string(), "(55, -3)");
}
