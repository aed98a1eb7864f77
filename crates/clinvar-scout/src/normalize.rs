//! Map a loosely keyed [`RawRecord`] onto the fixed [`NormalizedRecord`].
//!
//! Table headers vary from page to page, so every lookup compares a
//! canonical form of the key (lowercase, whitespace collapsed, trailing
//! help marker removed) against known candidates. Each output field is
//! computed on its own; a missing input only turns that field into
//! [`NO_DATA`].

use crate::extraction::GENE_KEY;
use crate::types::{NormalizedRecord, RawRecord, Row, NO_DATA};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const CONTRIBUTING_MARKER: &str = "Contributing to aggregate classification";
const ACMG_MARKER: &str = "ACMG Guidelines";
const ACMG_LABEL: &str = "Method: ACMG Guidelines";
const NO_ANNOTATION: &str = "(no annotation)";
const BULLET: &str = "•";

pub fn normalize(raw: &RawRecord) -> NormalizedRecord {
    NormalizedRecord {
        variant_type: variant_type(&raw.submissions).unwrap_or_else(no_data),
        condition: condition(&raw.submissions).unwrap_or_else(no_data),
        classification: classification(&raw.submissions).unwrap_or_else(no_data),
        gene_name: gene_name(&raw.gene_info).unwrap_or_else(no_data),
        molecular_consequences: consequence_bullets(&raw.molecular_consequences),
    }
}

fn no_data() -> String {
    NO_DATA.to_string()
}

/// Lowercase, collapse whitespace, drop a trailing help marker.
pub fn canonical_key(key: &str) -> String {
    let collapsed = key.split_whitespace().collect::<Vec<_>>().join(" ");
    strip_help_suffix(&collapsed).to_lowercase()
}

/// Remove trailing `help` / `(help)` tokens left by tooltip widgets.
pub fn strip_help_suffix(text: &str) -> &str {
    const MARKERS: [&str; 2] = ["(help)", "help"];
    let mut rest = text.trim_end();
    loop {
        let lower = rest.to_ascii_lowercase();
        let cut = MARKERS.iter().find_map(|marker| {
            let head = lower.strip_suffix(marker)?;
            let at_boundary = head.is_empty() || head.ends_with(char::is_whitespace);
            at_boundary.then_some(head.len())
        });
        match cut {
            Some(len) if len < rest.len() => rest = rest[..len].trim_end(),
            _ => return rest,
        }
    }
}

fn field<'r>(row: &'r Row, pred: impl Fn(&str) -> bool) -> Option<&'r str> {
    row.find(|key| pred(&canonical_key(key))).map(str::trim)
}

fn variant_type(submissions: &[Row]) -> Option<String> {
    submissions
        .iter()
        .filter_map(|row| row.get(""))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

fn is_condition_key(key: &str) -> bool {
    key.starts_with("condition")
}

fn condition(submissions: &[Row]) -> Option<String> {
    let values: Vec<&str> = submissions
        .iter()
        .filter_map(|row| field(row, is_condition_key))
        .collect();
    values
        .iter()
        .find(|v| v.contains("Autosomal"))
        .or_else(|| values.first())
        .map(|v| join_lines(v, "; "))
}

fn join_lines(text: &str, sep: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

fn is_short_classification_key(key: &str) -> bool {
    key == "classification" || key == "germline classification"
}

fn is_submission_count_key(key: &str) -> bool {
    key.contains("submission")
}

fn is_detailed_classification_key(key: &str) -> bool {
    key.contains("last evaluated")
}

fn is_review_status_key(key: &str) -> bool {
    key.starts_with("review status")
}

fn year_parenthetical() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\(([^()]*\b\d{4}\b[^()]*)\)").expect("year regex is valid")
    })
}

fn method_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Method:\s*(\w+)").expect("method regex is valid"))
}

/// `<short> (<fragment>; ...)` from a short-form row and a detailed row.
fn classification(submissions: &[Row]) -> Option<String> {
    let short = submissions.iter().find_map(|row| {
        let value = field(row, is_short_classification_key)?;
        Some((value, field(row, is_submission_count_key)))
    });
    let detailed = submissions.iter().find_map(|row| {
        let value = field(row, is_detailed_classification_key)?;
        Some((value, field(row, is_review_status_key)))
    });

    let mut fragments = Vec::new();
    if let Some((_, Some(count))) = short {
        fragments.push(format!("Submissions: {}", join_lines(count, " ")));
    }
    if let Some((evaluated, review)) = detailed {
        let text = match review {
            Some(review) => format!("{evaluated}\n{review}"),
            None => evaluated.to_string(),
        };
        if let Some(date) = year_parenthetical().captures(evaluated) {
            fragments.push(format!("Last evaluated: {}", date[1].trim()));
        }
        if text.contains(CONTRIBUTING_MARKER) {
            fragments.push(CONTRIBUTING_MARKER.to_string());
        }
        if text.contains(ACMG_MARKER) {
            fragments.push(ACMG_LABEL.to_string());
        } else if let Some(method) = method_pattern().captures(&text) {
            fragments.push(format!("Method: {}", &method[1]));
        }
    }

    let head = short.map(|(value, _)| join_lines(value, " "));
    match (head, fragments.is_empty()) {
        (Some(head), true) => Some(head),
        (Some(head), false) => Some(format!("{head} ({})", fragments.join("; "))),
        (None, false) => Some(format!("Unknown ({})", fragments.join("; "))),
        (None, true) => None,
    }
}

fn is_gene_key(key: &str) -> bool {
    matches!(key, "gene" | "genes" | "gene(s)")
}

fn gene_name(genes: &[Row]) -> Option<String> {
    genes
        .iter()
        .find_map(|row| {
            row.get(GENE_KEY)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| field(row, is_gene_key))
        })
        .map(|v| v.trim().to_string())
}

fn is_nucleotide_key(key: &str) -> bool {
    key.starts_with("nucleotide") || key == "hgvs"
}

fn is_consequence_key(key: &str) -> bool {
    key.contains("consequence")
}

/// One bullet per consequence row, first-seen order, duplicates removed.
pub fn consequence_bullets(rows: &[Row]) -> Vec<String> {
    let bullets = rows.iter().filter_map(|row| {
        let nucleotide =
            field(row, is_nucleotide_key).or_else(|| field(row, |k| k == "column_1"))?;
        let nucleotide = strip_help_suffix(nucleotide);
        if nucleotide.is_empty() {
            return None;
        }
        let consequence = field(row, is_consequence_key)
            .map(|c| join_lines(strip_help_suffix(c), ", "))
            .filter(|c| !c.is_empty());
        Some(format!(
            "{BULLET} {nucleotide} – {}",
            consequence.as_deref().unwrap_or(NO_ANNOTATION)
        ))
    });
    let out = dedup_preserving_order(bullets);
    if out.is_empty() {
        vec![format!("{BULLET} {NO_DATA}")]
    } else {
        out
    }
}

pub fn dedup_preserving_order<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
