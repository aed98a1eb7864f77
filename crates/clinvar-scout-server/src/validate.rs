//! Boundary validation of user-supplied page references.

use clinvar_scout::fetcher::variation_url;

/// Shown to callers whose input cannot be used.
pub const EXAMPLE_URL: &str = "https://www.ncbi.nlm.nih.gov/clinvar/variation/12345/";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum InputError {
    #[error("URL parameter is required")]
    Missing,

    #[error("URL must be a valid ClinVar variation page: {0}")]
    InvalidDomain(String),
}

impl InputError {
    pub fn kind(&self) -> &'static str {
        "invalid_url"
    }
}

/// Turn a URL, numeric variation ID, or `VCV` accession into a fetchable URL.
pub fn resolve_input(input: &str) -> Result<String, InputError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(InputError::Missing);
    }
    if let Some(id) = variation_id(input) {
        return Ok(variation_url(id));
    }
    if !input.to_ascii_lowercase().contains("clinvar") {
        return Err(InputError::InvalidDomain(input.to_string()));
    }
    if input.starts_with("http") {
        Ok(input.to_string())
    } else {
        Ok(format!("https://{input}"))
    }
}

/// `12345` or `VCV000012345` / `VCV000012345.5`.
fn variation_id(input: &str) -> Option<u64> {
    let digits = match input.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("vcv") => {
            let rest = &input[3..];
            rest.split('.').next().unwrap_or(rest)
        }
        _ => input,
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing() {
        assert_eq!(resolve_input(""), Err(InputError::Missing));
        assert_eq!(resolve_input("   "), Err(InputError::Missing));
        assert_eq!(InputError::Missing.kind(), "invalid_url");
    }

    #[test]
    fn test_numeric_id_and_accession() {
        let expected = "https://www.ncbi.nlm.nih.gov/clinvar/variation/12345/?oq=12345";
        assert_eq!(resolve_input("12345").unwrap(), expected);
        assert_eq!(resolve_input("VCV000012345").unwrap(), expected);
        assert_eq!(resolve_input("vcv000012345.5").unwrap(), expected);
    }

    #[test]
    fn test_scheme_is_prepended() {
        assert_eq!(
            resolve_input("www.ncbi.nlm.nih.gov/clinvar/variation/1/").unwrap(),
            "https://www.ncbi.nlm.nih.gov/clinvar/variation/1/"
        );
        assert_eq!(
            resolve_input("http://www.ncbi.nlm.nih.gov/clinvar/").unwrap(),
            "http://www.ncbi.nlm.nih.gov/clinvar/"
        );
    }

    #[test]
    fn test_foreign_domain_rejected() {
        let err = resolve_input("https://example.com/variation/1").unwrap_err();
        assert_eq!(err.kind(), "invalid_url");
        assert_eq!(resolve_input("VCV").unwrap_err().kind(), "invalid_url");
    }
}
