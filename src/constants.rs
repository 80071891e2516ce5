//! Property tables shared by the batch jobs.

pub type Table = &'static [(&'static str, &'static str)];

/// Label fallback chain: the first language that yields something wins.
pub const LANG_ORDER: &[&str] = &["en", "de", "fr", "es", "it", "pl", "pt", "nl", "sv", "no", "fi", "ro"];

/// Languages whose sitelink titles are extracted from the dump.
pub const LABEL_LANGS: &[&str] = &[
    "en", "de", "fr", "ru", "it", "es", "pl", "ja", "pt", "ar", "nl", "sv", "uk", "ca", "tr",
    "no", "fi", "id", "vi", "zh", "he",
];

pub const CG_RELS: Table = &[
    ("P737", "influenced by"),
    ("P941", "inspired by"),
    ("P2675", "reply to"),
    ("P144", "based on"),
    ("P828", "has cause"),
    ("P1542", "cause of"),
    ("P1478", "has immediate cause"),
    ("P1536", "immediate cause of"),
    ("P1479", "has contributing factor"),
    ("P1537", "contributing factor of"),
    ("P22", "father"),
    ("P25", "mother"),
    ("P40", "child"),
    ("P184", "doctoral advisor"),
    ("P185", "doctoral student"),
    ("P1066", "student of"),
    ("P802", "student"),
];

/// Relations whose claims may carry dates as qualifiers.
pub const NESTED_TIME_RELS: Table = &[
    ("P348", "software version"),
    ("P106", "occupation"),
    ("P108", "employer"),
    ("P69", "educated at"),
    ("P26", "spouse"),
    ("P176", "manufacturer"),
    ("P449", "original network"),
];

pub const STARTS: Table = &[
    ("P580", "start time"),
    ("P571", "inception"),
    ("P569", "date of birth"),
    ("P575", "time of discovery"),
    ("P1191", "first performance"),
    ("P577", "publication date"),
    ("P2031", "work period (start)"),
    ("P1619", "date of official opening"),
    ("P1319", "earliest date"),
    ("P729", "service entry"),
];

pub const ENDS: Table = &[
    ("P582", "end time"),
    ("P576", "dissolved, abolished or demolished"),
    ("P570", "date of death"),
    ("P2032", "work period (end)"),
    ("P2669", "discontinued date"),
    ("P1326", "latest date"),
    ("P730", "service retirement"),
];

pub const OTHERS: Table = &[
    ("P793", "significant event"),
    ("P585", "point in time"),
    ("P1317", "floruit"),
];

pub const ALL_TIMES: &[Table] = &[STARTS, ENDS, OTHERS];
pub const TIMES_PLUS_NESTED: &[Table] = &[STARTS, ENDS, OTHERS, NESTED_TIME_RELS];

/// Statement types whose inverse is the canonical direction.
pub const COMBINED_INVERSES: Table = &[
    ("P22", "P40"),
    ("P25", "P40"),
    ("P737", "P737i"),
    ("P941", "P941i"),
    ("P2675", "P2675i"),
    ("P144", "P144i"),
    ("P828", "P1542"),
    ("P184", "P185"),
    ("P1066", "P802"),
    ("P1478", "P1536"),
    ("P1479", "P1537"),
];

/// Causal relations that are usually generic ("ethanol cause of ethanol
/// exposure") unless one end is dated.
pub const LIKELY_NONSPECIFIC: &[&str] = &["P828", "P1542", "P1478", "P1536", "P1479", "P1537"];

/// "fictional entity" and "mythical entity".
pub const FICTION_ROOTS: &[&str] = &["Q24199478", "Q14897293"];

pub const INSTANCE_OF: &str = "P31";
pub const SUBCLASS_OF: &str = "P279";
pub const FOLLOWS: &str = "P155";
pub const FOLLOWED_BY: &str = "P156";
pub const POINT_IN_TIME: &str = "P585";

/// "events in a specific year or time period"
pub const EVENT_PERIOD_CLASS: &str = "Q18340514";

pub fn contains(table: Table, key: &str) -> bool {
    table.iter().any(|&(k, _)| k == key)
}

pub fn lookup(table: Table, key: &str) -> Option<&'static str> {
    table.iter().find(|&&(k, _)| k == key).map(|&(_, v)| v)
}

pub fn is_cg_rel(prop: &str) -> bool {
    contains(CG_RELS, prop)
}

pub fn is_time_prop(prop: &str) -> bool {
    ALL_TIMES.iter().any(|&table| contains(table, prop))
}

pub fn is_time_or_nested_prop(prop: &str) -> bool {
    TIMES_PLUS_NESTED.iter().any(|&table| contains(table, prop))
}

/// Relations the live graph follows.
pub fn is_watched_rel(prop: &str) -> bool {
    is_cg_rel(prop) || contains(NESTED_TIME_RELS, prop)
}

pub fn inverse_of(prop: &str) -> Option<&'static str> {
    lookup(COMBINED_INVERSES, prop)
}

pub fn is_likely_nonspecific(prop: &str) -> bool {
    LIKELY_NONSPECIFIC.contains(&prop)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables() {
        assert!(is_cg_rel("P737"));
        assert!(!is_cg_rel("P31"));
        assert!(is_time_prop("P585"));
        assert!(!is_time_prop("P106"));
        assert!(is_time_or_nested_prop("P106"));
        assert_eq!(inverse_of("P22"), Some("P40"));
        assert_eq!(inverse_of("P40"), None);
        assert!(is_watched_rel("P26"));
    }
}
