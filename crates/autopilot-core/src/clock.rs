//! UTC timestamps in the three shapes the pipeline writes.

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Record timestamp, e.g. `2026-10-18T09:41:07.123456Z`.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .expect("RFC3339 formatting should not fail")
}

/// File-name stamp, e.g. `20261018_094107`.
pub fn now_compact() -> String {
    compact(OffsetDateTime::now_utc())
}

/// Fix-history stamp, e.g. `2026-10-18 09:41:07`.
pub fn now_human() -> String {
    human(OffsetDateTime::now_utc())
}

fn compact(t: OffsetDateTime) -> String {
    format!(
        "{:04}{:02}{:02}_{:02}{:02}{:02}",
        t.year(),
        u8::from(t.month()),
        t.day(),
        t.hour(),
        t.minute(),
        t.second()
    )
}

fn human(t: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        t.year(),
        u8::from(t.month()),
        t.day(),
        t.hour(),
        t.minute(),
        t.second()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn compact_is_sortable_file_stamp() {
        let t = datetime!(2025-10-13 02:04:39 UTC);
        assert_eq!(compact(t), "20251013_020439");
    }

    #[test]
    fn human_matches_history_format() {
        let t = datetime!(2025-01-02 03:04:05 UTC);
        assert_eq!(human(t), "2025-01-02 03:04:05");
    }

    #[test]
    fn rfc3339_parses_back() {
        let s = now_rfc3339();
        assert!(OffsetDateTime::parse(&s, &Rfc3339).is_ok());
    }
}
