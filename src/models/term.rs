use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};

use crate::error::AppError;

/// Academic session within a calendar year, in calendar order so that
/// `Term` tokens sort chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Session {
    Winter,
    Spring,
    SummerSession1,
    Summer10Week,
    SummerCom,
    SummerSession2,
    Fall,
}

impl Session {
    /// The catalog source's YearTerm code for this session.
    pub fn code(self) -> &'static str {
        match self {
            Session::Winter => "03",
            Session::Spring => "14",
            Session::SummerSession1 => "25",
            Session::Summer10Week => "39",
            Session::SummerCom => "51",
            Session::SummerSession2 => "76",
            Session::Fall => "92",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "03" => Some(Session::Winter),
            "14" => Some(Session::Spring),
            "25" => Some(Session::SummerSession1),
            "39" => Some(Session::Summer10Week),
            "51" => Some(Session::SummerCom),
            "76" => Some(Session::SummerSession2),
            "92" => Some(Session::Fall),
            _ => None,
        }
    }
}

/// A single academic term, e.g. 2024 Fall. Encoded on the wire and in the
/// database as `"{year}-{code}"` (the catalog's own YearTerm format).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Term {
    pub year: i32,
    pub session: Session,
}

impl Term {
    /// Human readable label, used in notification emails.
    pub fn readable(&self) -> String {
        let label = match self.session {
            Session::Winter => "Winter",
            Session::Spring => "Spring",
            Session::SummerSession1 => "Summer Session 1",
            Session::Summer10Week => "10-wk Summer",
            Session::SummerCom => "Summer Qtr (COM)",
            Session::SummerSession2 => "Summer Session 2",
            Session::Fall => "Fall",
        };
        format!("{} {}", self.year, label)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.session.code())
    }
}

impl FromStr for Term {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, code) = s
            .split_once('-')
            .ok_or_else(|| AppError::BadRequest(format!("malformed term: {s}")))?;
        let year: i32 = year
            .parse()
            .map_err(|_| AppError::BadRequest(format!("malformed term year: {s}")))?;
        let session = Session::from_code(code)
            .ok_or_else(|| AppError::BadRequest(format!("unknown term session: {s}")))?;
        Ok(Term { year, session })
    }
}

/// All terms whose enrollment might still change for students at `now`.
///
/// Winter enrollment opens in November, so November/December map to the
/// next calendar year's winter term.
pub fn relevant_terms(now: DateTime<Utc>) -> Vec<Term> {
    let year = now.year();
    let t = |session| Term { year, session };
    match now.month() {
        1 => vec![t(Session::Winter)],
        2 => vec![t(Session::Spring)],
        3 => vec![
            t(Session::Spring),
            t(Session::SummerSession1),
            t(Session::Summer10Week),
            t(Session::SummerCom),
            t(Session::SummerSession2),
        ],
        4 => vec![
            t(Session::SummerSession1),
            t(Session::Summer10Week),
            t(Session::SummerCom),
            t(Session::SummerSession2),
        ],
        5..=7 => vec![
            t(Session::SummerSession1),
            t(Session::Summer10Week),
            t(Session::SummerCom),
            t(Session::SummerSession2),
            t(Session::Fall),
        ],
        8 => vec![t(Session::SummerSession2), t(Session::Fall)],
        9 | 10 => vec![t(Session::Fall)],
        // November, December
        _ => vec![Term {
            year: year + 1,
            session: Session::Winter,
        }],
    }
}

/// The canonical term for a user who has not picked one explicitly.
pub fn default_term(now: DateTime<Utc>) -> Term {
    let year = now.year();
    match now.month() {
        1 => Term {
            year,
            session: Session::Winter,
        },
        2 | 3 => Term {
            year,
            session: Session::Spring,
        },
        11 | 12 => Term {
            year: year + 1,
            session: Session::Winter,
        },
        // April through October
        _ => Term {
            year,
            session: Session::Fall,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(year: i32, month: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, 15, 12, 0, 0).unwrap()
    }

    fn term(year: i32, session: Session) -> Term {
        Term { year, session }
    }

    #[test]
    fn relevant_terms_matches_month_table() {
        let summers = [
            Session::SummerSession1,
            Session::Summer10Week,
            Session::SummerCom,
            Session::SummerSession2,
        ];

        assert_eq!(relevant_terms(at(2024, 2)), vec![term(2024, Session::Spring)]);

        let mut march: Vec<Term> = vec![term(2024, Session::Spring)];
        march.extend(summers.iter().map(|&s| term(2024, s)));
        assert_eq!(relevant_terms(at(2024, 3)), march);

        let april: Vec<Term> = summers.iter().map(|&s| term(2024, s)).collect();
        assert_eq!(relevant_terms(at(2024, 4)), april);

        let mut early_summer: Vec<Term> = summers.iter().map(|&s| term(2024, s)).collect();
        early_summer.push(term(2024, Session::Fall));
        for month in 5..=7 {
            assert_eq!(relevant_terms(at(2024, month)), early_summer);
        }

        assert_eq!(
            relevant_terms(at(2024, 8)),
            vec![term(2024, Session::SummerSession2), term(2024, Session::Fall)]
        );

        for month in [9, 10] {
            assert_eq!(relevant_terms(at(2024, month)), vec![term(2024, Session::Fall)]);
        }

        for month in [11, 12] {
            assert_eq!(relevant_terms(at(2024, month)), vec![term(2025, Session::Winter)]);
        }

        assert_eq!(relevant_terms(at(2024, 1)), vec![term(2024, Session::Winter)]);
    }

    #[test]
    fn default_term_is_always_relevant() {
        for month in 1..=12 {
            let now = at(2024, month);
            let default = default_term(now);
            assert!(
                relevant_terms(now).contains(&default),
                "month {month}: {default:?} not in window"
            );
        }
    }

    #[test]
    fn winter_belongs_to_next_year_after_october() {
        assert_eq!(default_term(at(2024, 11)), term(2025, Session::Winter));
        assert_eq!(default_term(at(2024, 12)), term(2025, Session::Winter));
        assert_eq!(default_term(at(2025, 1)), term(2025, Session::Winter));
    }

    #[test]
    fn display_and_parse_round_trip() {
        let fall = term(2024, Session::Fall);
        assert_eq!(fall.to_string(), "2024-92");
        assert_eq!("2024-92".parse::<Term>().unwrap(), fall);

        let winter = term(2025, Session::Winter);
        assert_eq!(winter.to_string(), "2025-03");
        assert_eq!("2025-03".parse::<Term>().unwrap(), winter);
    }

    #[test]
    fn parse_rejects_malformed_tokens() {
        assert!("2024".parse::<Term>().is_err());
        assert!("banana-92".parse::<Term>().is_err());
        assert!("2024-99".parse::<Term>().is_err());
        assert!("".parse::<Term>().is_err());
    }

    #[test]
    fn terms_sort_chronologically() {
        let mut terms = vec![
            term(2025, Session::Winter),
            term(2024, Session::Fall),
            term(2024, Session::Spring),
            term(2024, Session::SummerSession2),
        ];
        terms.sort();
        assert_eq!(
            terms,
            vec![
                term(2024, Session::Spring),
                term(2024, Session::SummerSession2),
                term(2024, Session::Fall),
                term(2025, Session::Winter),
            ]
        );
    }

    #[test]
    fn readable_labels() {
        assert_eq!(term(2024, Session::Fall).readable(), "2024 Fall");
        assert_eq!(
            term(2024, Session::SummerSession1).readable(),
            "2024 Summer Session 1"
        );
        assert_eq!(term(2024, Session::Summer10Week).readable(), "2024 10-wk Summer");
        assert_eq!(term(2024, Session::SummerCom).readable(), "2024 Summer Qtr (COM)");
    }
}
