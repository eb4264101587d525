use std::fmt;
use std::str::FromStr;
use serde::ser::{Serialize, Serializer};
use serde::de::{self, Deserialize, Deserializer, Visitor};

/// One of the two marble piles. A move removes a single marble from one pile.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Pile {
    Red,
    Blue,
}

impl Pile {
    // enumeration order decides ties in the computer's choice
    pub const ALL: [Pile; 2] = [Pile::Red, Pile::Blue];

    pub fn name(self) -> &'static str {
        match self {
            Pile::Red => "red",
            Pile::Blue => "blue",
        }
    }
}

impl fmt::Display for Pile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParsePileError(String);

impl fmt::Display for ParsePileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown pile {:?}, expected \"red\" or \"blue\"", self.0)
    }
}

impl std::error::Error for ParsePileError {}

impl FromStr for Pile {
    type Err = ParsePileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "red" => Ok(Pile::Red),
            "blue" => Ok(Pile::Blue),
            _ => Err(ParsePileError(s.to_string())),
        }
    }
}

impl Serialize for Pile {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
        serializer.serialize_str(self.name())
    }
}

struct PileVisitor;
impl<'de> Visitor<'de> for PileVisitor {
    type Value = Pile;
    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("the string \"red\" or \"blue\"")
    }
    fn visit_str<E>(self, value: &str) -> Result<Pile, E> where E: de::Error {
        value.parse().map_err(|_| E::unknown_variant(value, &["red", "blue"]))
    }
}

impl<'de> Deserialize<'de> for Pile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        deserializer.deserialize_str(PileVisitor)
    }
}

/// Marbles left in each pile. Boards are values: moves return a new board.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, serde::Serialize, serde::Deserialize)]
pub struct Board {
    pub red: u32,
    pub blue: u32,
}

impl Board {
    pub fn new(red: u32, blue: u32) -> Self {
        Self { red, blue }
    }

    pub fn count(&self, pile: Pile) -> u32 {
        match pile {
            Pile::Red => self.red,
            Pile::Blue => self.blue,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.red == 0 || self.blue == 0
    }

    pub fn is_legal(&self, pile: Pile) -> bool {
        self.count(pile) > 0
    }

    /// Piles that still hold marbles, in `Pile::ALL` order.
    pub fn legal_moves(&self) -> Vec<Pile> {
        Pile::ALL.into_iter().filter(|&pile| self.is_legal(pile)).collect()
    }

    /// Removes one marble from `pile`. Taking from an empty pile leaves the board unchanged.
    pub fn take(&self, pile: Pile) -> Self {
        let mut board = *self;
        match pile {
            Pile::Red if self.red > 0 => board.red -= 1,
            Pile::Blue if self.blue > 0 => board.blue -= 1,
            _ => {}
        }
        board
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "red = {}, blue = {}", self.red, self.blue)
    }
}
