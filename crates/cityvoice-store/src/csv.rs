//! Legacy CSV import and edge export
//!
//! The import format is `Date,Username,Summary/Quote,Link`, but exports in the
//! wild leave commas in the summary unquoted. The link column is therefore
//! located by its URL scheme rather than by counting commas.

use cityvoice_domain::{Item, ItemId, Relation};

/// Parse a legacy suggestions CSV into committed items
///
/// Ids are the 1-based line numbers after the header, so they stay stable
/// across re-imports of the same file. Blank lines are skipped but still
/// consume an id.
pub fn parse_legacy_csv(contents: &str) -> Vec<Item> {
    contents
        .lines()
        .enumerate()
        .skip(1)
        .filter_map(|(idx, line)| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            Some(parse_line(idx as ItemId, line))
        })
        .collect()
}

fn parse_line(id: ItemId, line: &str) -> Item {
    let url_pos = line.find("https://").or_else(|| line.find("http://"));

    let (date, username, summary, link) = match url_pos {
        Some(pos) => {
            let before = line[..pos].trim_end_matches(',');
            let link = &line[pos..];
            let mut parts = before.splitn(3, ',');
            let date = parts.next().unwrap_or_default();
            let username = parts.next().unwrap_or_default();
            let summary = parts.next().unwrap_or_default();
            (date, username, summary.to_string(), link)
        }
        None => {
            let parts: Vec<&str> = line.split(',').collect();
            let date = parts.first().copied().unwrap_or_default();
            let username = parts.get(1).copied().unwrap_or_default();
            let (summary, link) = match parts.len() {
                n if n > 3 => (parts[2..n - 1].join(","), parts[n - 1]),
                3 => (parts[2].to_string(), ""),
                _ => (String::new(), ""),
            };
            (date, username, summary, link)
        }
    };

    Item::new(id, username.trim(), unquote(summary.trim()))
        .with_date(date.trim())
        .with_link(link.trim())
        .with_source("csv")
}

/// Strip one level of CSV quoting from a field
fn unquote(field: &str) -> String {
    if field.len() >= 2 && field.starts_with('"') && field.ends_with('"') {
        field[1..field.len() - 1].replace("\"\"", "\"")
    } else {
        field.to_string()
    }
}

/// Quote a field when it contains a delimiter, quote or newline
fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render edges as `source_id,target_id,reason` CSV with a header
pub fn connections_to_csv(edges: &[Relation]) -> String {
    let mut out = String::from("source_id,target_id,reason\n");
    for edge in edges {
        out.push_str(&format!(
            "{},{},{}\n",
            edge.source_id,
            edge.target_id,
            quote(&edge.reason)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Date,Username,Summary/Quote,Link
2025-01-10,@nycwalker,Wider sidewalks on 5th Ave, please,https://x.com/nycwalker/status/1
2025-01-11,@busfan,More bus lanes on Staten Island,https://x.com/busfan/status/2

2025-01-12,@quiet,no link here,at all,really
";

    #[test]
    fn test_unquoted_commas_stay_in_summary() {
        let items = parse_legacy_csv(SAMPLE);
        assert_eq!(items.len(), 3);

        let first = &items[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.date, "2025-01-10");
        assert_eq!(first.username, "@nycwalker");
        assert_eq!(first.summary, "Wider sidewalks on 5th Ave, please");
        assert_eq!(first.link, "https://x.com/nycwalker/status/1");
        assert_eq!(first.source, "csv");
    }

    #[test]
    fn test_blank_line_consumes_id() {
        let items = parse_legacy_csv(SAMPLE);
        assert_eq!(items[1].id, 2);
        assert_eq!(items[2].id, 4);
    }

    #[test]
    fn test_fallback_split_without_url() {
        let items = parse_legacy_csv(SAMPLE);
        let last = &items[2];
        assert_eq!(last.username, "@quiet");
        assert_eq!(last.summary, "no link here,at all");
        assert_eq!(last.link, "really");
    }

    #[test]
    fn test_short_rows() {
        let items = parse_legacy_csv("h\n2025-01-01,@a,just text\n2025-01-02\n");
        assert_eq!(items[0].summary, "just text");
        assert_eq!(items[0].link, "");
        assert_eq!(items[1].username, "");
        assert_eq!(items[1].summary, "");
    }

    #[test]
    fn test_quoted_summary() {
        let items = parse_legacy_csv(
            "h\n2025-01-01,@a,\"Say \"\"no\"\" to cars, yes to trees\",https://x.com/a/1\n",
        );
        assert_eq!(items[0].summary, "Say \"no\" to cars, yes to trees");
    }

    #[test]
    fn test_connections_csv_quoting() {
        let csv = connections_to_csv(&[
            Relation::new(1, 2, "Shares keywords: bus, lane"),
            Relation::new(2, 3, "same block"),
        ]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "source_id,target_id,reason");
        assert_eq!(lines[1], "1,2,\"Shares keywords: bus, lane\"");
        assert_eq!(lines[2], "2,3,same block");
    }
}
