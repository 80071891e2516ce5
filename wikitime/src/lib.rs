use std::fmt;
use std::error::Error;
use std::str::FromStr;

pub const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August",
    "September", "October", "November", "December",
];

/// A Wikidata time value, as found in `"+1987-07-14T00:00:00Z"`.
///
/// Month and day are 0 when the stored precision does not reach them.
/// Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WikiTime {
    pub year: i64,
    pub month: u8,
    pub day: u8,
}

impl WikiTime {
    pub fn parse(s: &str) -> Option<WikiTime> {
        let s = s.trim();
        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let date = rest.split('T').next().unwrap_or("");
        let mut parts = date.splitn(3, '-');
        let year: i64 = parts.next()?.parse().ok()?;
        let month: u8 = match parts.next() {
            Some(m) => m.parse().ok()?,
            None => 0,
        };
        let day: u8 = match parts.next() {
            Some(d) => d.parse().ok()?,
            None => 0,
        };
        if month > 12 || day > 31 {
            return None;
        }
        Some(WikiTime { year: if negative { -year } else { year }, month, day })
    }
}

impl fmt::Display for WikiTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sign = if self.year < 0 { '-' } else { '+' };
        write!(f, "{}{:04}-{:02}-{:02}T00:00:00Z", sign, self.year.abs(), self.month, self.day)
    }
}

pub fn year_of(time: &str) -> Option<i64> {
    WikiTime::parse(time).map(|t| t.year)
}

/// True when a date looks like a month/day typed by a user but stored as
/// month/year: "year" in 1..=31, a real month, and no day.
pub fn flag_monthday(time: &str) -> bool {
    match WikiTime::parse(time) {
        Some(t) => (1..=31).contains(&t.year) && (1..=12).contains(&t.month) && t.day == 0,
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePeriodError(pub String);

impl fmt::Display for ParsePeriodError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "improper period expression: {:?}", self.0)
    }
}

impl Error for ParsePeriodError {}

/// A calendar period an item in a "<period> in <topic>" sequence stands for.
pub trait Period: Copy + Eq + Ord + fmt::Display + fmt::Debug + FromStr<Err = ParsePeriodError> {
    /// "year" or "month", used to name configuration keys.
    const UNIT: &'static str;

    fn next(&self) -> Self;
    fn prev(&self) -> Self;
    fn from_time(time: &WikiTime) -> Option<Self>;
    /// Text searched for when looking the period item up by label.
    fn search_term(&self) -> String;
    /// QuickStatements time literal, precision included.
    fn point_in_time(&self) -> String;
}

/// Inclusive range of periods; empty when `from` is after `to`.
pub fn range<P: Period>(from: P, to: P) -> Vec<P> {
    let mut result = vec![];
    let mut current = from;
    while current <= to {
        result.push(current);
        current = current.next();
    }
    result
}

fn signed_year(year: i64) -> String {
    let sign = if year < 0 { '-' } else { '+' };
    format!("{}{:04}", sign, year.abs())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Year(pub i64);

impl Period for Year {
    const UNIT: &'static str = "year";

    fn next(&self) -> Year {
        Year(self.0 + 1)
    }

    fn prev(&self) -> Year {
        Year(self.0 - 1)
    }

    fn from_time(time: &WikiTime) -> Option<Year> {
        Some(Year(time.year))
    }

    fn search_term(&self) -> String {
        self.0.to_string()
    }

    fn point_in_time(&self) -> String {
        format!("{}-01-01T00:00:00Z/9", signed_year(self.0))
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Year {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Year, ParsePeriodError> {
        s.trim().parse().map(Year).map_err(|_| ParsePeriodError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i64,
    /// 1..=12, enforced by `new` and `from_str`.
    month: u8,
}

impl Month {
    pub fn new(year: i64, month: u8) -> Option<Month> {
        if (1..=12).contains(&month) {
            Some(Month { year, month })
        } else {
            None
        }
    }

    pub fn year(&self) -> i64 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn name(&self) -> &'static str {
        MONTHS[(self.month - 1) as usize]
    }
}

impl Period for Month {
    const UNIT: &'static str = "month";

    fn next(&self) -> Month {
        if self.month == 12 {
            Month { year: self.year + 1, month: 1 }
        } else {
            Month { year: self.year, month: self.month + 1 }
        }
    }

    fn prev(&self) -> Month {
        if self.month == 1 {
            Month { year: self.year - 1, month: 12 }
        } else {
            Month { year: self.year, month: self.month - 1 }
        }
    }

    fn from_time(time: &WikiTime) -> Option<Month> {
        Month::new(time.year, time.month)
    }

    fn search_term(&self) -> String {
        self.to_string()
    }

    fn point_in_time(&self) -> String {
        format!("{}-{:02}-01T00:00:00Z/10", signed_year(self.year), self.month)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.year)
    }
}

impl FromStr for Month {
    type Err = ParsePeriodError;

    /// Accepts "July 1987" as well as "1987-07".
    fn from_str(s: &str) -> Result<Month, ParsePeriodError> {
        let err = || ParsePeriodError(s.to_string());
        let words: Vec<&str> = s.split_whitespace().collect();
        if words.len() == 2 {
            let month = MONTHS.iter().position(|m| *m == words[0]).ok_or_else(err)?;
            let year = words[1].parse().map_err(|_| err())?;
            return Ok(Month { year, month: month as u8 + 1 });
        }
        let (year, month) = s.trim().rsplit_once('-').ok_or_else(err)?;
        let year = year.parse().map_err(|_| err())?;
        let month = month.parse().map_err(|_| err())?;
        Month::new(year, month).ok_or_else(err)
    }
}

/// "1987-07" to "July 1987".
pub fn wordify_month(month: &str) -> Option<String> {
    month.parse::<Month>().ok().map(|m| m.to_string())
}

/// "July 1987" to "1987-07".
pub fn dewordify_month(month: &str) -> Option<String> {
    let m = month.parse::<Month>().ok()?;
    Some(format!("{}-{:02}", m.year, m.month))
}

#[test]
fn test_parse_wikitime() {
    assert_eq!(WikiTime::parse("+2014-10-14T00:00:00Z"),
        Some(WikiTime { year: 2014, month: 10, day: 14 }));
    assert_eq!(WikiTime::parse("-0500-00-00T00:00:00Z"),
        Some(WikiTime { year: -500, month: 0, day: 0 }));
    assert_eq!(WikiTime::parse("+13798000000-00-00T00:00:00Z").map(|t| t.year), Some(13798000000));
    assert_eq!(WikiTime::parse("garbage"), None);
    assert_eq!(WikiTime::parse("+2014-13-01T00:00:00Z"), None);
    assert!(WikiTime::parse("-0500-00-00T00:00:00Z") < WikiTime::parse("+0001-01-01T00:00:00Z"));
}

#[test]
fn test_year_of() {
    assert_eq!(year_of("+1987-07-00T00:00:00Z"), Some(1987));
    assert_eq!(year_of("-0044-03-15T00:00:00Z"), Some(-44));
}

#[test]
fn test_flag_monthday() {
    assert!(flag_monthday("+0012-07-00T00:00:00Z"));
    assert!(!flag_monthday("+0012-07-04T00:00:00Z"));
    assert!(!flag_monthday("+1987-07-00T00:00:00Z"));
    assert!(!flag_monthday("+0012-00-00T00:00:00Z"));
    assert!(!flag_monthday("nonsense"));
}

#[test]
fn test_month_arithmetic() {
    let dec: Month = "December 1999".parse().unwrap();
    assert_eq!(dec.next().to_string(), "January 2000");
    assert_eq!(dec.next().prev(), dec);
    assert_eq!("1987-07".parse::<Month>().unwrap().to_string(), "July 1987");
    assert!("Juli 1987".parse::<Month>().is_err());
    assert_eq!(range(Month::new(1999, 11).unwrap(), Month::new(2000, 2).unwrap()).len(), 4);
    assert!(range(Year(2000), Year(1999)).is_empty());
}

#[test]
fn test_month_words() {
    assert_eq!(wordify_month("1987-07").unwrap(), "July 1987");
    assert_eq!(dewordify_month("July 1987").unwrap(), "1987-07");
    assert_eq!(wordify_month("1987-13"), None);
}

#[test]
fn test_point_in_time() {
    assert_eq!(Year(1987).point_in_time(), "+1987-01-01T00:00:00Z/9");
    assert_eq!(Year(-44).point_in_time(), "-0044-01-01T00:00:00Z/9");
    assert_eq!(Month::new(1987, 7).unwrap().point_in_time(), "+1987-07-01T00:00:00Z/10");
}

#[test]
fn test_month_bounds() {
    assert_eq!(Month::new(1999, 0), None);
    assert_eq!(Month::new(1999, 13), None);
    assert!("1999-00".parse::<Month>().is_err());
    assert!("Smarch 1999".parse::<Month>().is_err());
    let dec = Month::new(1999, 12).unwrap();
    assert_eq!((dec.year(), dec.month(), dec.name()), (1999, 12, "December"));
    assert_eq!(dec.next(), Month::new(2000, 1).unwrap());
}
