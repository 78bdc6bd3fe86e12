use serde::Serialize;

/// Upper bound used for the open-ended `36+` bracket.
const OPEN_END: u32 = 10_000;

/// The seven fixed age brackets, in months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Bracket {
    UpTo8,
    From9To12,
    From13To18,
    From19To24,
    From25To30,
    From31To36,
    Over36,
}

/// Where the counts of a sex/age column go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketTarget {
    Single(Bracket),
    /// The combined `25–36` column, split by the row's age when known.
    Split25To36,
}

impl Bracket {
    pub const ALL: [Bracket; 7] = [
        Bracket::UpTo8,
        Bracket::From9To12,
        Bracket::From13To18,
        Bracket::From19To24,
        Bracket::From25To30,
        Bracket::From31To36,
        Bracket::Over36,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Bracket::UpTo8 => "0–8",
            Bracket::From9To12 => "9–12",
            Bracket::From13To18 => "13–18",
            Bracket::From19To24 => "19–24",
            Bracket::From25To30 => "25–30",
            Bracket::From31To36 => "31–36",
            Bracket::Over36 => "36+",
        }
    }

    /// Label using a plain hyphen, for fonts without the en dash.
    pub fn ascii_label(self) -> String {
        self.label().replace('–', "-")
    }

    /// Inclusive bounds in months.
    pub fn bounds(self) -> (u32, u32) {
        match self {
            Bracket::UpTo8 => (0, 8),
            Bracket::From9To12 => (9, 12),
            Bracket::From13To18 => (13, 18),
            Bracket::From19To24 => (19, 24),
            Bracket::From25To30 => (25, 30),
            Bracket::From31To36 => (31, 36),
            Bracket::Over36 => (37, OPEN_END),
        }
    }

    fn centre(self) -> f64 {
        let (lo, hi) = self.bounds();
        f64::from(lo + hi) / 2.0
    }

    /// The bracket an age in months falls in, if any.
    ///
    /// Ages between two brackets (for example 36.5) fall in none.
    pub fn for_age(months: f64) -> Option<Bracket> {
        if months >= 37.0 {
            return Some(Bracket::Over36);
        }
        Bracket::ALL.into_iter().find(|b| {
            let (lo, hi) = b.bounds();
            f64::from(lo) <= months && months <= f64::from(hi)
        })
    }

    /// Maps the bounds parsed from a column name to a bracket.
    ///
    /// Exact bounds match directly, `lo ≥ 37` is `36+`, `25–36` is the split
    /// column, and anything else goes to the bracket with the nearest centre
    /// (earlier bracket on ties).
    pub fn target_for_bounds(lo: u32, hi: u32) -> BracketTarget {
        if lo >= 37 {
            return BracketTarget::Single(Bracket::Over36);
        }
        if let Some(exact) = Bracket::ALL.into_iter().find(|b| b.bounds() == (lo, hi)) {
            return BracketTarget::Single(exact);
        }
        if (lo, hi) == (25, 36) {
            return BracketTarget::Split25To36;
        }

        let mid = f64::from(lo + hi) / 2.0;
        let mut best = Bracket::UpTo8;
        let mut best_distance = f64::INFINITY;
        for bracket in Bracket::ALL {
            let distance = (bracket.centre() - mid).abs();
            if distance < best_distance {
                best = bracket;
                best_distance = distance;
            }
        }
        BracketTarget::Single(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_bounds() {
        assert_eq!(
            Bracket::target_for_bounds(0, 8),
            BracketTarget::Single(Bracket::UpTo8)
        );
        assert_eq!(
            Bracket::target_for_bounds(31, 36),
            BracketTarget::Single(Bracket::From31To36)
        );
    }

    #[test]
    fn test_open_end_and_split() {
        assert_eq!(
            Bracket::target_for_bounds(37, OPEN_END),
            BracketTarget::Single(Bracket::Over36)
        );
        assert_eq!(
            Bracket::target_for_bounds(40, 50),
            BracketTarget::Single(Bracket::Over36)
        );
        assert_eq!(Bracket::target_for_bounds(25, 36), BracketTarget::Split25To36);
    }

    #[test]
    fn test_nearest_centre_prefers_earlier_on_tie() {
        // centre 18.5 is 3 away from both 13–18 and 19–24
        assert_eq!(
            Bracket::target_for_bounds(13, 24),
            BracketTarget::Single(Bracket::From13To18)
        );
        assert_eq!(
            Bracket::target_for_bounds(0, 12),
            BracketTarget::Single(Bracket::UpTo8)
        );
    }

    #[test]
    fn test_for_age() {
        assert_eq!(Bracket::for_age(0.0), Some(Bracket::UpTo8));
        assert_eq!(Bracket::for_age(27.0), Some(Bracket::From25To30));
        assert_eq!(Bracket::for_age(36.0), Some(Bracket::From31To36));
        assert_eq!(Bracket::for_age(36.5), None);
        assert_eq!(Bracket::for_age(120.0), Some(Bracket::Over36));
        assert_eq!(Bracket::for_age(-1.0), None);
    }

    #[test]
    fn test_labels() {
        let labels: Vec<&str> = Bracket::ALL.iter().map(|b| b.label()).collect();
        assert_eq!(
            labels,
            vec!["0–8", "9–12", "13–18", "19–24", "25–30", "31–36", "36+"]
        );
        assert_eq!(Bracket::From13To18.ascii_label(), "13-18");
    }
}
