use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, heading: Heading) -> Self {
        let (dx, dy) = heading.unit();
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned facing. Screen coordinates: `y` grows downwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

impl Heading {
    pub const ALL: [Heading; 4] = [Heading::Right, Heading::Left, Heading::Down, Heading::Up];

    pub fn unit(self) -> (i32, i32) {
        match self {
            Heading::Up => (0, -1),
            Heading::Down => (0, 1),
            Heading::Left => (-1, 0),
            Heading::Right => (1, 0),
        }
    }

    /// `(x, y) -> (-y, x)`, a quarter turn clockwise on screen.
    pub fn clockwise(self) -> Self {
        match self {
            Heading::Up => Heading::Right,
            Heading::Right => Heading::Down,
            Heading::Down => Heading::Left,
            Heading::Left => Heading::Up,
        }
    }

    /// `(x, y) -> (y, -x)`, a quarter turn counter-clockwise on screen.
    pub fn counter_clockwise(self) -> Self {
        match self {
            Heading::Up => Heading::Left,
            Heading::Left => Heading::Down,
            Heading::Down => Heading::Right,
            Heading::Right => Heading::Up,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// Relative move chosen by a policy. Output index `i` of the policy maps to
/// the `i`-th variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Straight,
    TurnClockwise,
    TurnCounterClockwise,
    /// Fourth output; currently keeps the heading.
    Reserved,
}

impl Action {
    pub const COUNT: usize = 4;

    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Action::Straight,
            1 => Action::TurnClockwise,
            2 => Action::TurnCounterClockwise,
            _ => Action::Reserved,
        }
    }

    pub fn apply(self, heading: Heading) -> Heading {
        match self {
            Action::Straight | Action::Reserved => heading,
            Action::TurnClockwise => heading.clockwise(),
            Action::TurnCounterClockwise => heading.counter_clockwise(),
        }
    }
}
