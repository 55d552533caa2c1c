// ============================================================
// Layer 5 — Reference Paths
// ============================================================
// A reference names a value elsewhere in the configuration:
//
//   Experiment:Policy:cuda   absolute, walked from the document root
//   :Vocabulary              scoped, searched from the referring
//                            component outwards to the root
//   Vocabulary               a single segment is scoped too
//   :Vocabulary$             trailing '$' = optional; a miss resolves
//                            to Absent instead of failing

use std::fmt;
use std::str::FromStr;

use crate::domain::error::NmtError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePath {
    segments: Vec<String>,
    scoped:   bool,
    optional: bool,
}

impl ReferencePath {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_scoped(&self) -> bool {
        self.scoped
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

impl FromStr for ReferencePath {
    type Err = NmtError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (body, optional) = match text.strip_suffix('$') {
            Some(body) => (body, true),
            None => (text, false),
        };
        let (body, leading) = match body.strip_prefix(':') {
            Some(body) => (body, true),
            None => (body, false),
        };

        let segments: Vec<String> = body.split(':').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(NmtError::configuration(text, "reference path has an empty segment"));
        }

        Ok(Self {
            scoped: leading || segments.len() == 1,
            segments,
            optional,
        })
    }
}

impl fmt::Display for ReferencePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // single segments are scoped without the marker
        if self.scoped && self.segments.len() > 1 {
            write!(f, ":")?;
        }
        write!(f, "{}", self.segments.join(":"))?;
        if self.optional {
            write!(f, "$")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path() {
        let p: ReferencePath = "Experiment:Policy:cuda".parse().unwrap();
        assert_eq!(p.segments(), ["Experiment", "Policy", "cuda"]);
        assert!(!p.is_scoped());
        assert!(!p.is_optional());
    }

    #[test]
    fn test_scoped_optional_path() {
        let p: ReferencePath = ":Vocabulary$".parse().unwrap();
        assert_eq!(p.segments(), ["Vocabulary"]);
        assert!(p.is_scoped());
        assert!(p.is_optional());

        let single: ReferencePath = "second_vocabulary".parse().unwrap();
        assert!(single.is_scoped());
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["Experiment:Policy:cuda", ":Vocabulary:embedding_size$", "Vocabulary$"] {
            let p: ReferencePath = text.parse().unwrap();
            assert_eq!(p.to_string(), text);
        }
    }

    #[test]
    fn test_empty_segment_rejected() {
        assert!("Experiment::cuda".parse::<ReferencePath>().is_err());
        assert!("$".parse::<ReferencePath>().is_err());
    }
}
