use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;

/// Which list of a scope a session draws from and how answers touch the
/// wrong-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionMode {
    /// Draws from `all`; incorrect answers are added to the wrong-set.
    Quiz,
    /// Draws from `wrong`; correct answers are removed from the wrong-set.
    Review,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Quiz => "quiz",
            Self::Review => "review",
        })
    }
}

/// Uniform random permutation of `items`.
///
/// The input is consumed and returned reordered; nothing else is touched.
pub fn shuffle<T, R>(mut items: Vec<T>, rng: &mut R) -> Vec<T>
where
    R: Rng + ?Sized,
{
    items.shuffle(rng);
    items
}
