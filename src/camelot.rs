//! Camelot wheel key notation.
//!
//! A key is a position on a 12-step ring plus a mode: `A` for minor, `B` for
//! major. Neighbouring positions are a perfect fifth apart, so harmonic
//! relationships reduce to ring arithmetic.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::FlowError;

/// Number of positions on the wheel.
pub const RING_SIZE: u8 = 12;

/// Major key roots indexed by ring position - 1 (1B = B major ... 12B = E major).
const MAJOR_ROOTS: [&str; 12] = [
    "B", "F#", "C#", "G#", "D#", "A#", "F", "C", "G", "D", "A", "E",
];

/// Minor key roots indexed by ring position - 1 (1A = G# minor ... 12A = C# minor).
const MINOR_ROOTS: [&str; 12] = [
    "G#", "D#", "A#", "F", "C", "G", "D", "A", "E", "B", "F#", "C#",
];

// Camelot code: "8A", "12b", " 08A "
static CAMELOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(\d{1,2})\s*([ab])\s*$").unwrap());

// Conventional name: "Am", "F#m", "Db", "Bbmaj", "A minor", "C major"
static KEY_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-G])\s*([#♯b♭]?)\s*(?i:(m|min|minor|maj|major))?\s*$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mode {
    /// Minor.
    A,
    /// Major.
    B,
}

impl Mode {
    pub fn opposite(self) -> Self {
        match self {
            Mode::A => Mode::B,
            Mode::B => Mode::A,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Mode::A => 'A',
            Mode::B => 'B',
        }
    }
}

/// A key on the Camelot wheel. The position is always in `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CamelotKey {
    position: u8,
    mode: Mode,
}

impl CamelotKey {
    /// Returns `None` if `position` is outside `1..=12`.
    pub fn new(position: u8, mode: Mode) -> Option<Self> {
        (1..=RING_SIZE)
            .contains(&position)
            .then_some(Self { position, mode })
    }

    pub fn position(self) -> u8 {
        self.position
    }

    pub fn mode(self) -> Mode {
        self.mode
    }

    /// Lenient parse: Camelot code first, then a conventional key name.
    /// Anything unrecognised is `None`, never an error.
    pub fn parse(s: &str) -> Option<Self> {
        Self::from_camelot(s).or_else(|| Self::from_key_name(s))
    }

    /// Parse Camelot notation (`"8A"`, `"12b"`, `"08A"`).
    pub fn from_camelot(s: &str) -> Option<Self> {
        let caps = CAMELOT_RE.captures(s)?;
        let position: u8 = caps[1].parse().ok()?;
        let mode = if caps[2].eq_ignore_ascii_case("a") {
            Mode::A
        } else {
            Mode::B
        };
        Self::new(position, mode)
    }

    /// Parse a conventional key name (`"Am"`, `"F#m"`, `"Db"`, `"C major"`).
    pub fn from_key_name(s: &str) -> Option<Self> {
        let caps = KEY_NAME_RE.captures(s)?;
        let root = sharp_spelling(&caps[1], &caps[2])?;
        let minor = caps
            .get(3)
            .map(|q| q.as_str() == "m" || q.as_str().to_lowercase().starts_with("min"))
            .unwrap_or(false);

        let (roots, mode) = if minor {
            (&MINOR_ROOTS, Mode::A)
        } else {
            (&MAJOR_ROOTS, Mode::B)
        };
        let idx = roots.iter().position(|r| *r == root)?;
        Self::new(idx as u8 + 1, mode)
    }

    /// Conventional name in sharp spelling, e.g. `"Am"` for 8A, `"F#"` for 2B.
    pub fn key_name(self) -> String {
        let idx = usize::from(self.position - 1);
        match self.mode {
            Mode::A => format!("{}m", MINOR_ROOTS[idx]),
            Mode::B => MAJOR_ROOTS[idx].to_string(),
        }
    }

    /// Same position, opposite mode.
    pub fn relative(self) -> Self {
        Self {
            position: self.position,
            mode: self.mode.opposite(),
        }
    }

    /// Move `steps` positions around the ring (negative = counter-clockwise),
    /// keeping the mode.
    pub fn shifted(self, steps: i32) -> Self {
        let zero_based = (i32::from(self.position) - 1 + steps).rem_euclid(i32::from(RING_SIZE));
        Self {
            position: zero_based as u8 + 1,
            mode: self.mode,
        }
    }

    pub fn with_mode(self, mode: Mode) -> Self {
        Self {
            position: self.position,
            mode,
        }
    }

    /// All 24 keys, minor before major at each position.
    pub fn all() -> impl Iterator<Item = CamelotKey> {
        (1..=RING_SIZE).flat_map(|p| {
            [Mode::A, Mode::B]
                .into_iter()
                .map(move |mode| CamelotKey { position: p, mode })
        })
    }
}

/// Normalise a root plus accidental to the sharp spelling used in the tables.
fn sharp_spelling(letter: &str, accidental: &str) -> Option<&'static str> {
    let flat = matches!(accidental, "b" | "♭");
    let sharp = matches!(accidental, "#" | "♯");
    let name = match (letter, sharp, flat) {
        ("C", false, false) | ("B", true, false) => "C",
        ("C", true, false) | ("D", false, true) => "C#",
        ("D", false, false) => "D",
        ("D", true, false) | ("E", false, true) => "D#",
        ("E", false, false) | ("F", false, true) => "E",
        ("F", false, false) | ("E", true, false) => "F",
        ("F", true, false) | ("G", false, true) => "F#",
        ("G", false, false) => "G",
        ("G", true, false) | ("A", false, true) => "G#",
        ("A", false, false) => "A",
        ("A", true, false) | ("B", false, true) => "A#",
        ("B", false, false) | ("C", false, true) => "B",
        _ => return None,
    };
    Some(name)
}

impl fmt::Display for CamelotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.position, self.mode.symbol())
    }
}

impl FromStr for CamelotKey {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| FlowError::InvalidKey(s.to_string()))
    }
}

impl Serialize for CamelotKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CamelotKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
