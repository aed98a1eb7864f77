//! Strategy-agnostic extraction of a [`RawRecord`] from a DOM.
//!
//! Each section (summary, key/value tables, gene links, header-keyed
//! tables) runs independently. A missing element only leaves its own
//! part of the record empty.

use crate::dom::DomQuery;
use crate::types::{RawRecord, Row};

const CLINICAL_SIGNIFICANCE: &str =
    r#"[class*="clinvar_review"], [class*="clinical_significance"]"#;
const GENE_LINKS: &str = r#"a[href*="/gene/"]"#;
const HGVS_TABLE: &str = "table#hgvs-table";
const CONSEQUENCE_TABLES: &str = r#"table[class*="consequence"]"#;
const SUBMISSION_TABLES: &str = r#"table[id*="submission"], table[class*="submission"]"#;
const CONDITION_TABLES: &str = r#"table[id*="condition"], table[class*="condition"]"#;

/// Row key for the gene symbol taken from a gene link.
pub const GENE_KEY: &str = "Gene";
/// Row key for the trailing path segment of a gene link.
pub const GENE_ID_KEY: &str = "Gene ID";

/// Cost caps applied while walking a document. `None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionLimits {
    /// Leading `<table>` elements scanned for key/value rows.
    pub tables: Option<usize>,
    /// Rows read from each key/value table.
    pub rows_per_table: Option<usize>,
    pub gene_links: Option<usize>,
    /// Tables of each header-keyed kind (consequence, submission, condition).
    pub record_tables: Option<usize>,
    /// Rows read from each header-keyed table.
    pub record_rows: Option<usize>,
    /// Keys must be strictly shorter than this many characters.
    pub max_key_len: usize,
}

impl ExtractionLimits {
    /// Caps for a live browser page, where every query costs an IPC round trip.
    pub fn heavy() -> Self {
        Self {
            tables: Some(3),
            rows_per_table: Some(10),
            gene_links: Some(3),
            record_tables: Some(3),
            record_rows: Some(50),
            max_key_len: 100,
        }
    }

    pub fn unbounded() -> Self {
        Self {
            tables: None,
            rows_per_table: None,
            gene_links: None,
            record_tables: None,
            record_rows: None,
            max_key_len: 100,
        }
    }
}

/// Walk `dom` and collect everything recognisable into a fresh record.
pub fn extract<D: DomQuery>(dom: &D, limits: &ExtractionLimits) -> RawRecord {
    let mut raw = RawRecord::default();

    extract_summary(dom, &mut raw);
    extract_identifiers(dom, limits, &mut raw);
    raw.gene_info = extract_genes(dom, limits);

    let mut consequence_tables = dom.select_all(HGVS_TABLE, limits.record_tables);
    if consequence_tables.is_empty() {
        consequence_tables = dom.select_all(CONSEQUENCE_TABLES, limits.record_tables);
    }
    raw.molecular_consequences = consequence_tables
        .into_iter()
        .flat_map(|table| header_keyed_rows(dom, table, limits))
        .collect();

    raw.submissions = dom
        .select_all(SUBMISSION_TABLES, limits.record_tables)
        .into_iter()
        .flat_map(|table| header_keyed_rows(dom, table, limits))
        .collect();
    raw.conditions = dom
        .select_all(CONDITION_TABLES, limits.record_tables)
        .into_iter()
        .flat_map(|table| header_keyed_rows(dom, table, limits))
        .collect();

    tracing::debug!(
        identifiers = raw.identifiers.len(),
        genes = raw.gene_info.len(),
        consequences = raw.molecular_consequences.len(),
        submissions = raw.submissions.len(),
        conditions = raw.conditions.len(),
        "extracted raw record"
    );
    raw
}

fn extract_summary<D: DomQuery>(dom: &D, raw: &mut RawRecord) {
    raw.summary.title = dom.title();
    raw.summary.variant_name = dom
        .select_first("h1")
        .map(|h1| dom.text(h1))
        .filter(|t| !t.is_empty());
    raw.summary.clinical_significance = dom
        .select_first(CLINICAL_SIGNIFICANCE)
        .map(|el| dom.text(el))
        .filter(|t| !t.is_empty());
}

/// Two-cell rows anywhere in the leading tables become identifiers.
fn extract_identifiers<D: DomQuery>(dom: &D, limits: &ExtractionLimits, raw: &mut RawRecord) {
    for table in dom.select_all("table", limits.tables) {
        for row in dom.select_within(table, "tr", limits.rows_per_table) {
            let cells = dom.select_within(row, "td, th", Some(2));
            let [key_cell, value_cell] = cells.as_slice() else {
                continue;
            };
            let key = dom.text(*key_cell);
            let key = key.trim_end_matches(':').trim_end();
            let value = dom.text(*value_cell);
            if key.chars().count() < limits.max_key_len {
                raw.add_identifier(key, value);
            }
        }
    }
}

fn extract_genes<D: DomQuery>(dom: &D, limits: &ExtractionLimits) -> Vec<Row> {
    dom.select_all(GENE_LINKS, limits.gene_links)
        .into_iter()
        .filter_map(|link| {
            let name = dom.text(link);
            if name.is_empty() {
                return None;
            }
            let mut row = Row::new();
            row.insert(GENE_KEY, name);
            if let Some(id) = dom.attr(link, "href").as_deref().and_then(gene_id) {
                row.insert(GENE_ID_KEY, id);
            }
            Some(row)
        })
        .collect()
}

/// Last path segment of a gene link, query string and trailing slash removed.
pub fn gene_id(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|seg| !seg.is_empty())
        .map(str::to_string)
}

/// Rows of a table keyed by its first header row.
///
/// Headers reset per table; cells beyond the header width (or every cell
/// when the table has no header row) are keyed `column_<n>`, 1-based.
fn header_keyed_rows<'a, D: DomQuery>(
    dom: &'a D,
    table: D::Element<'a>,
    limits: &ExtractionLimits,
) -> Vec<Row> {
    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    // One extra row for the header.
    let scan = limits.record_rows.map(|cap| cap.saturating_add(1));
    for tr in dom.select_within(table, "tr", scan) {
        if limits.record_rows.is_some_and(|cap| rows.len() >= cap) {
            break;
        }
        if headers.is_none() {
            let ths = dom.select_within(tr, "th", None);
            if !ths.is_empty() {
                headers = Some(ths.into_iter().map(|th| dom.text(th)).collect());
                continue;
            }
        }

        let names = headers.as_deref().unwrap_or_default();
        let row: Row = dom
            .select_within(tr, "td", None)
            .into_iter()
            .enumerate()
            .map(|(i, td)| {
                let key = names
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("column_{}", i + 1));
                (key, dom.text(td))
            })
            .collect();
        if !row.is_empty() {
            rows.push(row);
        }
    }
    rows
}
