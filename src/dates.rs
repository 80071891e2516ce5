use std::collections::BTreeMap;

use wikitime::{flag_monthday, year_of};

use crate::constants::{is_time_or_nested_prop, is_time_prop};
use crate::wikidata::Entity;

/// `qid → [(prop, time)]`, as written to `date_claims.json`. Nested claims
/// use `"<prop> <qualifier>"` as prop.
pub type DateClaims = BTreeMap<String, Vec<(String, String)>>;

pub type Years = BTreeMap<String, i64>;

pub fn date_claims(entity: &Entity) -> Vec<(String, String)> {
    let mut result = vec![];
    for (prop, claims) in &entity.claims {
        if !is_time_prop(prop) {
            continue;
        }
        for claim in claims {
            if let Some(tv) = claim.mainsnak.time() {
                result.push((prop.clone(), tv.time));
            }
        }
    }
    result
}

pub fn nested_date_claims(entity: &Entity) -> Vec<(String, String)> {
    let mut result = vec![];
    for (prop, claims) in &entity.claims {
        if !is_time_or_nested_prop(prop) {
            continue;
        }
        for claim in claims {
            for (qualifier, snaks) in &claim.qualifiers {
                if !is_time_prop(qualifier) {
                    continue;
                }
                for snak in snaks {
                    if let Some(tv) = snak.time() {
                        result.push((format!("{} {}", prop, qualifier), tv.time));
                    }
                }
            }
        }
    }
    result
}

/// Earliest year per item. Years outside (-10000, 10000) are astronomical or
/// typos and dropped.
pub fn dates_to_years(claims: &DateClaims) -> Years {
    let mut years = Years::new();
    for (qid, dates) in claims {
        let mut earliest: Option<i64> = None;
        for (prop, time) in dates {
            match year_of(time) {
                Some(y) => earliest = Some(earliest.map_or(y, |e| e.min(y))),
                None => warn!("can not parse {} {} for {}", prop, time, qid),
            }
        }
        if let Some(y) = earliest {
            if -10000 < y && y < 10000 {
                years.insert(qid.clone(), y);
            }
        }
    }
    years
}

pub fn flag_monthdays(claims: &DateClaims) -> Vec<(&str, &str)> {
    let mut flagged = vec![];
    for (qid, dates) in claims {
        for (_, time) in dates {
            if flag_monthday(time) {
                flagged.push((&**qid, &**time));
            }
        }
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wikidata::tests::DOUGLAS;

    #[test]
    fn main_and_nested_claims() {
        let e = Entity::from_json(DOUGLAS).unwrap();
        assert_eq!(date_claims(&e), vec![("P569".to_string(), "+1952-03-11T00:00:00Z".to_string())]);
        assert_eq!(
            nested_date_claims(&e),
            vec![("P69 P582".to_string(), "+1974-00-00T00:00:00Z".to_string())]
        );
    }

    #[test]
    fn earliest_year_in_range() {
        let mut claims = DateClaims::new();
        claims.insert("Q1".into(), vec![
            ("P570".into(), "+2001-01-01T00:00:00Z".into()),
            ("P569".into(), "+1952-03-11T00:00:00Z".into()),
            ("P585".into(), "soon".into()),
        ]);
        claims.insert("Q2".into(), vec![("P580".into(), "-13798000000-00-00T00:00:00Z".into())]);
        claims.insert("Q3".into(), vec![("P580".into(), "-0044-03-15T00:00:00Z".into())]);
        let years = dates_to_years(&claims);
        assert_eq!(years.get("Q1"), Some(&1952));
        assert_eq!(years.get("Q2"), None);
        assert_eq!(years.get("Q3"), Some(&-44));
    }

    #[test]
    fn flags_month_day() {
        let mut claims = DateClaims::new();
        claims.insert("Q5".into(), vec![
            ("P569".into(), "+0012-07-00T00:00:00Z".into()),
            ("P570".into(), "+1912-07-00T00:00:00Z".into()),
        ]);
        assert_eq!(flag_monthdays(&claims), vec![("Q5", "+0012-07-00T00:00:00Z")]);
    }
}
