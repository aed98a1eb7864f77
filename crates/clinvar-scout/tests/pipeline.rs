//! End-to-end pipeline scenarios over fixture pages.
//!
//! The renderer, fetcher, and sampler are replaced by in-memory fakes so
//! the full dispatch → extraction → normalization path runs offline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use clinvar_scout::dom::DomSnapshot;
use clinvar_scout::error::kinds;
use clinvar_scout::fetcher::PageFetcher;
use clinvar_scout::monitor::{ResourceSample, ResourceSampler};
use clinvar_scout::renderer::PageRenderer;
use clinvar_scout::{normalize, ExtractError, ExtractResult, Extractor, ExtractorConfig, RawRecord, NO_DATA};

// ─────────────────────── fakes ───────────────────────

struct Roomy;

#[async_trait]
impl ResourceSampler for Roomy {
    async fn sample(&self) -> anyhow::Result<ResourceSample> {
        Ok(ResourceSample {
            available_memory_mb: 1000.0,
            cpu_percent: 5.0,
            in_container: false,
        })
    }
}

/// Serves one fixture page for any URL.
struct Fixture(&'static str);

#[async_trait]
impl PageRenderer for Fixture {
    async fn render(&self, url: &str, _timeout: Duration) -> ExtractResult<DomSnapshot> {
        Ok(DomSnapshot::new(url, self.0))
    }
}

#[async_trait]
impl PageFetcher for Fixture {
    async fn fetch(&self, url: &str, _timeout: Duration) -> ExtractResult<DomSnapshot> {
        Ok(DomSnapshot::new(url, self.0))
    }
}

struct Unreachable;

#[async_trait]
impl PageRenderer for Unreachable {
    async fn render(&self, url: &str, _timeout: Duration) -> ExtractResult<DomSnapshot> {
        Err(ExtractError::LoadFailed(format!("no response from {url}")))
    }
}

#[async_trait]
impl PageFetcher for Unreachable {
    async fn fetch(&self, url: &str, _timeout: Duration) -> ExtractResult<DomSnapshot> {
        Err(ExtractError::HttpError(format!("status 404 from {url}")))
    }
}

struct Crashing;

#[async_trait]
impl PageRenderer for Crashing {
    async fn render(&self, _url: &str, _timeout: Duration) -> ExtractResult<DomSnapshot> {
        Err(ExtractError::EngineFailure("renderer crashed".into()))
    }
}

fn heavy_with<R, F>(renderer: R, fetcher: F) -> Extractor
where
    R: PageRenderer + 'static,
    F: PageFetcher + 'static,
{
    Extractor::with_parts(
        ExtractorConfig::default(),
        Arc::new(Roomy),
        Arc::new(renderer),
        Arc::new(fetcher),
    )
}

const URL: &str = "https://www.ncbi.nlm.nih.gov/clinvar/variation/12345/";

const GENE_PAGE: &str = r#"<html><head><title>ClinVar</title></head><body>
    <h1>NM_000059.3(BRCA2):c.1-tests</h1>
    <table><tr><td>Gene</td><td>BRCA1</td></tr></table>
    <a href="/gene/672">BRCA1</a>
    </body></html>"#;

const CONSEQUENCE_PAGE: &str = r#"<html><body>
    <table id="hgvs-table">
      <tr><th>Nucleotide</th><th>Molecular<br>consequence</th></tr>
      <tr><td>NM_1:c.1A&gt;T</td><td>missense</td></tr>
      <tr><td>NM_1:c.1A&gt;T</td><td>missense</td></tr>
    </table>
    </body></html>"#;

const FULL_PAGE: &str = r#"<html><head><title>VCV000012345.5 - ClinVar - NCBI</title></head><body>
    <h1>NM_007294.4(BRCA1):c.5266dup (p.Gln1756fs)</h1>
    <div class="clinical_significance">Pathogenic</div>
    <table>
      <tr><td>Variation ID:</td><td>12345</td></tr>
      <tr><td>Accession:</td><td>VCV000012345.5</td></tr>
    </table>
    <a href="/gene/672/">BRCA1</a>
    <table id="submissions-table">
      <tr><th></th><th>Classification</th><th>Number of submissions</th><th>Condition(s)</th></tr>
      <tr><td>Duplication</td><td>Pathogenic</td><td>41</td><td>Hereditary breast ovarian cancer syndrome</td></tr>
    </table>
    <table class="submission-details">
      <tr><th>Classification (Last evaluated)</th><th>Review status (Assertion criteria)</th><th>Condition (Inheritance)</th></tr>
      <tr><td>Pathogenic (Jan 04, 2022)</td><td>criteria provided, single submitter<br>Method: clinical testing</td><td>Breast-ovarian cancer, familial 1<br>Autosomal dominant inheritance</td></tr>
    </table>
    <table class="molecular-consequence">
      <tr><th>Nucleotide help</th><th>Protein</th><th>Molecular consequence</th></tr>
      <tr><td>NM_007294.4:c.5266dup</td><td>NP_009225.1:p.Gln1756fs</td><td>frameshift variant</td></tr>
      <tr><td>NM_007297.4:c.5125dup</td><td>NP_009228.2:p.Gln1709fs</td><td></td></tr>
    </table>
    </body></html>"#;

// ─────────────────────── scenarios ───────────────────────

#[tokio::test]
async fn gene_table_and_link_fixture() {
    let ex = heavy_with(Fixture(GENE_PAGE), Unreachable);
    let raw = ex.resolve(URL).await.unwrap();

    assert_eq!(
        raw.summary.variant_name.as_deref(),
        Some("NM_000059.3(BRCA2):c.1-tests")
    );
    assert_eq!(raw.identifiers.len(), 1);
    assert_eq!(raw.identifiers["Gene"], "BRCA1");
    assert_eq!(normalize(&raw).gene_name, "BRCA1");
}

#[tokio::test]
async fn unreachable_page_is_extraction_failed() {
    let ex = heavy_with(Unreachable, Unreachable);
    let err = ex.extract(URL).await.unwrap_err();

    assert_eq!(err.kind(), kinds::EXTRACTION_FAILED);
    assert!(matches!(err.root_cause(), ExtractError::HttpError(_)));
}

#[tokio::test]
async fn engine_failure_never_surfaces() {
    let recovered = heavy_with(Crashing, Fixture(GENE_PAGE)).extract(URL).await;
    assert_eq!(recovered.unwrap().gene_name, "BRCA1");

    let exhausted = heavy_with(Crashing, Unreachable).extract(URL).await.unwrap_err();
    assert_eq!(exhausted.kind(), kinds::EXTRACTION_FAILED);
    assert!(!matches!(exhausted.root_cause(), ExtractError::EngineFailure(_)));
}

#[tokio::test]
async fn consequence_rows_become_deduplicated_bullets() {
    let ex = heavy_with(Fixture(CONSEQUENCE_PAGE), Unreachable);
    let record = ex.extract(URL).await.unwrap();

    assert_eq!(record.molecular_consequences, vec!["• NM_1:c.1A>T – missense"]);
}

#[tokio::test]
async fn full_page_normalizes_every_field() {
    let ex = heavy_with(Unreachable, Fixture(FULL_PAGE));
    let raw = ex.resolve(URL).await.unwrap();

    assert_eq!(raw.summary.clinical_significance.as_deref(), Some("Pathogenic"));
    assert_eq!(raw.identifiers["Variation ID"], "12345");
    assert_eq!(raw.gene_info[0].get("Gene ID"), Some("672"));
    assert_eq!(raw.submissions.len(), 2);

    let record = normalize(&raw);
    assert_eq!(record.variant_type, "Duplication");
    assert_eq!(
        record.condition,
        "Breast-ovarian cancer, familial 1; Autosomal dominant inheritance"
    );
    assert_eq!(
        record.classification,
        "Pathogenic (Submissions: 41; Last evaluated: Jan 04, 2022; Method: clinical)"
    );
    assert_eq!(record.gene_name, "BRCA1");
    assert_eq!(
        record.molecular_consequences,
        vec![
            "• NM_007294.4:c.5266dup – frameshift variant",
            "• NM_007297.4:c.5125dup – (no annotation)",
        ]
    );
}

#[test]
fn empty_record_normalizes_to_sentinels() {
    let record = normalize(&RawRecord::default());
    for field in [
        &record.variant_type,
        &record.condition,
        &record.classification,
        &record.gene_name,
    ] {
        assert_eq!(field, NO_DATA);
    }
    assert_eq!(record.molecular_consequences.len(), 1);
}

#[test]
fn normalized_record_serializes_camel_case() {
    let json = serde_json::to_value(normalize(&RawRecord::default())).unwrap();
    for key in [
        "variantType",
        "condition",
        "classification",
        "geneName",
        "molecularConsequences",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
}
