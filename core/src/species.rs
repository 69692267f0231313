//! Species letters and the traits derived from them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of letters sharing a morphology; ranks repeat with this period.
pub const RANKS_PER_MORPHOLOGY: u8 = 13;

const LETTER_COUNT: u8 = 26;

/// Body plan that decides which dynamics integrate an automaton.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Morphology {
    /// Ground-bound walker that follows the terrain surface.
    Lander,
    /// Airborne automaton subject to gravity, drag and liftoff.
    Flyer,
}

/// Sex used to pair mates of the same species.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    /// Female automaton.
    Female,
    /// Male automaton.
    Male,
}

impl Gender {
    /// Returns the complementary gender.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Female => Self::Male,
            Self::Male => Self::Female,
        }
    }
}

/// Species identified by an uppercase letter `A` through `Z`.
///
/// Letters `A`–`M` are landers and `N`–`Z` flyers. Rank restarts at zero for
/// each morphology, so `A` and `N` share the lowest rank while `M` and `Z`
/// share the highest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Species(u8);

impl Species {
    /// Lowest-ranked lander and the only natural photosynthesiser besides `B`.
    pub const A: Self = Self(0);
    /// Second scavenging lander.
    pub const B: Self = Self(1);
    /// Tunneling lander born from `A`.
    pub const C: Self = Self(2);
    /// Tunneling lander born from `B`.
    pub const D: Self = Self(3);
    /// Highest-ranked lander.
    pub const M: Self = Self(12);
    /// Lowest-ranked flyer.
    pub const N: Self = Self(13);
    /// Bombing flyer.
    pub const X: Self = Self(23);
    /// Bombing flyer.
    pub const Y: Self = Self(24);
    /// Asexual bombing flyer and the highest flyer rank.
    pub const Z: Self = Self(25);

    /// Creates a species from its zero-based letter index, if in range.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < LETTER_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Parses an uppercase or lowercase letter.
    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        let upper = letter.to_ascii_uppercase();
        if upper.is_ascii_uppercase() {
            Self::from_index(upper as u8 - b'A')
        } else {
            None
        }
    }

    /// Zero-based letter index.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Uppercase letter naming the species.
    #[must_use]
    pub const fn letter(self) -> char {
        (b'A' + self.0) as char
    }

    /// Body plan implied by the letter.
    #[must_use]
    pub const fn morphology(self) -> Morphology {
        if self.0 < RANKS_PER_MORPHOLOGY {
            Morphology::Lander
        } else {
            Morphology::Flyer
        }
    }

    /// Position in the food chain, shared across morphologies.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self.0 % RANKS_PER_MORPHOLOGY
    }

    /// Whether the species digs through terrain that blocks it.
    #[must_use]
    pub const fn is_tunneler(self) -> bool {
        self.0 == Self::C.0 || self.0 == Self::D.0
    }

    /// Whether the species feeds on sunlight and corpses and fights back when cornered.
    #[must_use]
    pub const fn is_scavenger(self) -> bool {
        self.0 == Self::A.0 || self.0 == Self::B.0
    }

    /// Whether the species drops rocks.
    #[must_use]
    pub const fn is_bomber(self) -> bool {
        self.0 >= Self::X.0
    }

    /// Whether the species reproduces without a mate.
    #[must_use]
    pub const fn is_asexual(self) -> bool {
        self.0 == Self::Z.0
    }

    /// Letter reached after moving `steps` positions up the alphabet.
    #[must_use]
    pub const fn shifted(self, steps: u8) -> Option<Self> {
        match self.0.checked_add(steps) {
            Some(index) => Self::from_index(index),
            None => None,
        }
    }

    /// Tunneling species spawned by a long-idle scavenger.
    #[must_use]
    pub const fn fallback_offspring(self) -> Option<Self> {
        match self.0 {
            0 => Some(Self::C),
            1 => Some(Self::D),
            _ => None,
        }
    }

    /// Iterates every species of the requested morphology in letter order.
    pub fn of_morphology(morphology: Morphology) -> impl Iterator<Item = Self> {
        let start = match morphology {
            Morphology::Lander => 0,
            Morphology::Flyer => RANKS_PER_MORPHOLOGY,
        };
        (start..start + RANKS_PER_MORPHOLOGY).map(Self)
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[cfg(test)]
mod tests {
    use super::{Gender, Morphology, Species};

    #[test]
    fn letters_split_into_landers_and_flyers() {
        assert_eq!(Species::A.morphology(), Morphology::Lander);
        assert_eq!(Species::M.morphology(), Morphology::Lander);
        assert_eq!(Species::N.morphology(), Morphology::Flyer);
        assert_eq!(Species::Z.morphology(), Morphology::Flyer);
    }

    #[test]
    fn ranks_repeat_per_morphology() {
        assert_eq!(Species::A.rank(), 0);
        assert_eq!(Species::N.rank(), 0);
        assert_eq!(Species::M.rank(), 12);
        assert_eq!(Species::Z.rank(), 12);
    }

    #[test]
    fn letters_parse_case_insensitively() {
        assert_eq!(Species::from_letter('c'), Some(Species::C));
        assert_eq!(Species::from_letter('Z'), Some(Species::Z));
        assert_eq!(Species::from_letter('?'), None);
        assert_eq!(Species::Y.letter(), 'Y');
    }

    #[test]
    fn evolution_crosses_into_flyers_and_stops_at_z() {
        let l = Species::from_letter('L').expect("letter");
        assert_eq!(l.shifted(2), Some(Species::N));
        assert_eq!(Species::Y.shifted(2), None);
    }

    #[test]
    fn trait_letters_match_roles() {
        assert!(Species::C.is_tunneler() && Species::D.is_tunneler());
        assert!(!Species::A.is_tunneler());
        assert!(Species::A.is_scavenger() && Species::B.is_scavenger());
        assert!(Species::X.is_bomber() && Species::Z.is_bomber());
        assert!(!Species::N.is_bomber());
        assert!(Species::Z.is_asexual());
        assert_eq!(Species::A.fallback_offspring(), Some(Species::C));
        assert_eq!(Species::B.fallback_offspring(), Some(Species::D));
        assert_eq!(Species::C.fallback_offspring(), None);
    }

    #[test]
    fn gender_opposite_is_involutive() {
        assert_eq!(Gender::Female.opposite(), Gender::Male);
        assert_eq!(Gender::Male.opposite().opposite(), Gender::Male);
    }

    #[test]
    fn morphology_iteration_covers_thirteen_letters() {
        assert_eq!(Species::of_morphology(Morphology::Lander).count(), 13);
        assert_eq!(
            Species::of_morphology(Morphology::Flyer).next(),
            Some(Species::N)
        );
    }
}
