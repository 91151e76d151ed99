//! Annotated priors JSON.

use std::path::Path;

use crate::error::Result;
use crate::spider::Priors;

/// Read annotated priors from a JSON file.
pub fn load_priors(path: impl AsRef<Path>) -> Result<Priors> {
    let path = path.as_ref();
    let priors = parse_priors(&std::fs::read_to_string(path)?)?;
    log::info!(
        "Loaded priors {}: {} circles, {} rectangles",
        path.display(),
        priors.circles.len(),
        priors.rectangles.len()
    );
    Ok(priors)
}

/// Parse annotated priors from JSON text.
pub fn parse_priors(json: &str) -> Result<Priors> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Write;

    #[test]
    fn test_parse_priors() {
        let priors = parse_priors(
            r#"{"circles": [[10, 20, 8]], "rectangles": [[30, 20, 1.57, 25, 6], [5, 5, 0, 20, 4]]}"#,
        )
        .unwrap();
        assert_eq!(priors.circles, vec![[10.0, 20.0, 8.0]]);
        assert_eq!(priors.rectangles.len(), 2);
        assert_eq!(priors.rectangles[0][2], 1.57);
    }

    #[test]
    fn test_missing_keys_default_empty() {
        let priors = parse_priors("{}").unwrap();
        assert!(priors.is_empty());
    }

    #[test]
    fn test_wrong_arity_rejected() {
        let err = parse_priors(r#"{"circles": [[1, 2]]}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"rectangles": [[1, 2, 0, 20, 5]]}}"#).unwrap();
        let priors = load_priors(file.path()).unwrap();
        assert!(priors.circles.is_empty());
        assert_eq!(priors.rectangles.len(), 1);
    }
}
