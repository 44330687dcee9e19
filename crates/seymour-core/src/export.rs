//! Text and JSON renderings of exported records

use std::fmt::Write as _;

use crate::error::Result;
use crate::record::Record;

/// One line per piece under a count header
pub fn render_pretty(records: &[Record]) -> String {
    let count = records.len();
    let mut out = format!(
        "Seymour Export - {} piece{}\n\n",
        count,
        if count == 1 { "" } else { "s" }
    );

    for record in records {
        let name = if record.display_name.trim().is_empty() {
            "Unknown"
        } else {
            record.display_name.as_str()
        };
        let hex = if record.hex.is_empty() {
            "??????".to_string()
        } else {
            record.hex.to_ascii_uppercase()
        };
        let top = match &record.best_match {
            Some(best) => format!(
                "{} (ΔE: {:.2} | Abs: {})",
                best.name, best.delta_e, best.absolute_distance
            ),
            None => "N/A".to_string(),
        };

        let _ = write!(out, "{} | #{} | Top: {}", name, hex, top);
        if let Some(pattern) = &record.special_pattern {
            let _ = write!(out, " | Pattern: {}", pattern);
        }
        out.push('\n');
    }
    out
}

/// Pretty JSON array, in the given order
pub fn render_json(records: &[Record]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColorSource;
    use crate::pattern::HexPattern;
    use crate::ranker::MatchCandidate;

    #[test]
    fn test_render_pretty() {
        let mut matched = Record::new("1", "Velvet Top Hat", "fe0000");
        matched.best_match = Some(MatchCandidate {
            name: "Ruby".to_string(),
            target_hex: "FF0000".to_string(),
            delta_e: 0.373,
            absolute_distance: 1,
            tier: 0,
            source: ColorSource::Target,
        });
        matched.special_pattern = Some(HexPattern::AxBxCx('f'));
        let unmatched = Record::new("2", "", "123456");

        let text = render_pretty(&[matched, unmatched]);
        assert_eq!(
            text,
            "Seymour Export - 2 pieces\n\n\
             Velvet Top Hat | #FE0000 | Top: Ruby (ΔE: 0.37 | Abs: 1) | Pattern: axbxcx_f\n\
             Unknown | #123456 | Top: N/A\n"
        );
    }

    #[test]
    fn test_render_pretty_singular_and_empty() {
        assert!(render_pretty(&[Record::new("1", "Oxford Shoes", "000000")])
            .starts_with("Seymour Export - 1 piece\n"));
        assert_eq!(render_pretty(&[]), "Seymour Export - 0 pieces\n\n");
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&[Record::new("1", "Oxford Shoes", "000000")]).unwrap();
        let back: Vec<Record> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0].id, "1");
    }
}
