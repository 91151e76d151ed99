//! Annotated part priors used for informed initialization.

use serde::{Deserialize, Serialize};

/// Hand-annotated shapes from the observation.
///
/// Circles are `[x, y, r]`, rectangles `[x, y, theta, w, h]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Priors {
    /// Root annotations
    #[serde(default)]
    pub circles: Vec<[f64; 3]>,
    /// Link annotations
    #[serde(default)]
    pub rectangles: Vec<[f64; 5]>,
}

impl Priors {
    /// True when there is neither a circle nor a rectangle annotation.
    pub fn is_empty(&self) -> bool {
        self.circles.is_empty() && self.rectangles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sections_default_empty() {
        let p: Priors = serde_json::from_str(r#"{"circles": [[1, 2, 3]]}"#).unwrap();
        assert_eq!(p.circles, vec![[1.0, 2.0, 3.0]]);
        assert!(p.rectangles.is_empty());
        assert!(!p.is_empty());
        assert!(Priors::default().is_empty());
    }

    #[test]
    fn test_wrong_arity_rejected() {
        let r: Result<Priors, _> = serde_json::from_str(r#"{"rectangles": [[1, 2, 3]]}"#);
        assert!(r.is_err());
    }
}
