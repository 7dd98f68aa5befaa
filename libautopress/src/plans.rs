//! Plan import from outline text files and `category,title` CSV files
//!
//! Outline lines look like `Article 12 (Culture): Title`; the text after the
//! colon is the seed. Headings, notes and any other line without that shape
//! are ignored. CSV rows split at the first comma so titles may contain
//! commas. Plans whose seed
//! already exists are skipped, which makes re-importing a file a no-op.

use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::{AutopressError, Result};
use crate::types::NewPlan;

pub const DEFAULT_CATEGORY: &str = "News";

/// Short CSV category names mapped to the blog's category names
const CATEGORY_MAP: &[(&str, &str)] = &[
    ("Culture", "AI & Culture"),
    ("Society", "AI & Society"),
    ("Practice", "AI Pro Tips / How-To"),
    ("Innovation", "Innovation"),
    ("Review", "Review"),
    ("News", "News"),
    ("History", "History"),
    ("Video", "Video"),
];

/// Map a CSV category to the blog category, defaulting to `News`
pub fn map_category(name: &str) -> &'static str {
    let name = name.trim();
    CATEGORY_MAP
        .iter()
        .find(|(short, _)| *short == name)
        .map(|(_, full)| *full)
        .unwrap_or(DEFAULT_CATEGORY)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub total_rows: usize,
    pub added: usize,
    pub skipped_duplicates: usize,
    pub errors: usize,
}

/// One usable line of an import file, or the reason it was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRow {
    Plan(NewPlan),
    Invalid { line: usize, reason: String },
}

/// Title of an outline line shaped `<label> <number> (<note>): <title>`
fn outline_title(line: &str) -> Option<&str> {
    let (_label, rest) = line.split_once(char::is_whitespace)?;
    let rest = rest.trim_start();

    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits == 0 {
        return None;
    }

    let rest = rest[digits..].trim_start().strip_prefix('(')?;
    let close = rest.find(')')?;
    if close == 0 {
        return None;
    }

    let title = rest[close + 1..].strip_prefix(':')?.trim();
    (!title.is_empty()).then_some(title)
}

/// Parse an outline, keeping only numbered `Label N (Note): Title` lines
pub fn parse_outline(content: &str) -> Vec<ParsedRow> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let title = outline_title(line);
            if title.is_none() {
                debug!("Ignoring outline line: {}", line);
            }
            title
        })
        // The title doubles as the SEO focus for outline imports
        .map(|title| ParsedRow::Plan(NewPlan::new(title).with_seo_focus(title)))
        .collect()
}

/// Parse `category,title` rows; blank lines are ignored
pub fn parse_csv(content: &str) -> Vec<ParsedRow> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let line_no = index + 1;
            let Some((category, title)) = line.trim().split_once(',') else {
                return ParsedRow::Invalid {
                    line: line_no,
                    reason: "missing comma".to_string(),
                };
            };
            let title = title.trim();
            if title.is_empty() {
                return ParsedRow::Invalid {
                    line: line_no,
                    reason: "empty title".to_string(),
                };
            }
            ParsedRow::Plan(NewPlan::new(title).with_category(map_category(category)))
        })
        .collect()
}

/// Insert parsed rows, skipping seeds already in the queue
pub async fn import_rows(db: &Database, rows: Vec<ParsedRow>) -> Result<LoadStats> {
    let mut stats = LoadStats::default();

    for row in rows {
        stats.total_rows += 1;
        let plan = match row {
            ParsedRow::Plan(plan) => plan,
            ParsedRow::Invalid { line, reason } => {
                warn!("Line {}: skipped ({})", line, reason);
                stats.errors += 1;
                continue;
            }
        };

        if db.plan_exists_by_seed(plan.seed.trim()).await? {
            debug!("Skipping duplicate: {}", plan.seed);
            stats.skipped_duplicates += 1;
            continue;
        }

        match db.add_plan(&plan).await {
            Ok(_) => stats.added += 1,
            Err(AutopressError::InvalidInput(msg)) => {
                warn!("Skipped plan: {}", msg);
                stats.errors += 1;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Imported {} plan(s): {} duplicate(s), {} error(s)",
        stats.added, stats.skipped_duplicates, stats.errors
    );
    Ok(stats)
}

/// Read a file and import it as an outline or as CSV
pub async fn import_file(db: &Database, path: &Path, csv: bool) -> Result<LoadStats> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AutopressError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
    })?;

    let rows = if csv {
        parse_csv(&content)
    } else {
        parse_outline(&content)
    };
    import_rows(db, rows).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeds(rows: &[ParsedRow]) -> Vec<&str> {
        rows.iter()
            .filter_map(|r| match r {
                ParsedRow::Plan(p) => Some(p.seed.as_str()),
                ParsedRow::Invalid { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_map_category() {
        assert_eq!(map_category("Culture"), "AI & Culture");
        assert_eq!(map_category(" Practice "), "AI Pro Tips / How-To");
        assert_eq!(map_category("Video"), "Video");
        assert_eq!(map_category("Gossip"), "News");
        assert_eq!(map_category(""), "News");
    }

    #[test]
    fn test_parse_outline() {
        let content = "# Plan for March\n\
                       \n\
                       Article 1 (Culture): How AI Changes Painting\n\
                       Article 2 (Practice, long read):Prompting for Spreadsheets\n\
                       A bare title line\n";
        let rows = parse_outline(content);

        assert_eq!(
            seeds(&rows),
            vec!["How AI Changes Painting", "Prompting for Spreadsheets"]
        );
        match &rows[0] {
            ParsedRow::Plan(plan) => assert_eq!(plan.seo_focus, "How AI Changes Painting"),
            other => panic!("unexpected row: {:?}", other),
        }
    }

    #[test]
    fn test_parse_outline_ignores_headings_and_notes() {
        let content = "Content plan for March 2025\n\
                       Week 1\n\
                       Статья 1 (Culture): How AI Changes Painting\n\
                       Статья 2: no category\n\
                       Статья (Culture): no number\n\
                       Статья 3 (): empty note\n\
                       Статья 4 (News):   \n";
        let rows = parse_outline(content);

        assert_eq!(seeds(&rows), vec!["How AI Changes Painting"]);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_parse_csv_splits_at_first_comma() {
        let rows = parse_csv("Culture,Art, Music, and Machines\nGossip,Celebrity Robots\n");

        match &rows[0] {
            ParsedRow::Plan(plan) => {
                assert_eq!(plan.seed, "Art, Music, and Machines");
                assert_eq!(plan.category.as_deref(), Some("AI & Culture"));
            }
            other => panic!("unexpected row: {:?}", other),
        }
        match &rows[1] {
            ParsedRow::Plan(plan) => assert_eq!(plan.category.as_deref(), Some("News")),
            other => panic!("unexpected row: {:?}", other),
        }
    }

    #[test]
    fn test_parse_csv_invalid_rows() {
        let rows = parse_csv("no comma here\n\nNews,   \n");
        assert_eq!(
            rows,
            vec![
                ParsedRow::Invalid {
                    line: 1,
                    reason: "missing comma".to_string()
                },
                ParsedRow::Invalid {
                    line: 3,
                    reason: "empty title".to_string()
                },
            ]
        );
    }
}
