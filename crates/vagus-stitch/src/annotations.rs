//! Ontology annotation terms for stitched structures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stitch::StitchedSegment;

/// Trunk names and their ontology identifiers.
pub const TRUNK_TERMS: &[(&str, &str)] = &[
    ("left vagus nerve", "ILX:0785628"),
    ("left cervical trunk", "ILX:0794142"),
    ("left cervical vagus nerve", "ILX:0794142"),
    ("left thoracic trunk", "ILX:0787543"),
    ("left thoracic vagus nerve", "ILX:0787543"),
    ("right vagus nerve", "ILX:0789705"),
    ("right cervical trunk", "ILX:0794141"),
    ("right cervical vagus nerve", "ILX:0794141"),
    ("right thoracic trunk", "ILX:0786664"),
    ("right thoracic vagus nerve", "ILX:0786664"),
];

/// Ontology identifier for a trunk name.
#[must_use]
pub fn trunk_term(name: &str) -> Option<&'static str> {
    TRUNK_TERMS
        .iter()
        .find(|(term, _)| *term == name)
        .map(|&(_, id)| id)
}

/// A structure name paired with its ontology identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationTerm {
    /// Structure name as used in the stitched tree.
    pub name: String,
    /// Ontology identifier.
    pub id: String,
}

/// Terms for a segment: the trunk's, then each branch with a known term.
///
/// `branch_terms` maps structure names to identifiers and usually comes
/// from an external annotation sheet. An entry for the trunk takes
/// precedence over [`TRUNK_TERMS`]. Branches follow generation order.
#[must_use]
pub fn segment_terms(
    segment: &StitchedSegment,
    branch_terms: &BTreeMap<String, String>,
) -> Vec<AnnotationTerm> {
    let trunk = segment.trunk_name().and_then(|name| {
        branch_terms
            .get(name)
            .map(String::as_str)
            .or_else(|| trunk_term(name))
            .map(|id| AnnotationTerm {
                name: name.to_string(),
                id: id.to_string(),
            })
    });

    trunk
        .into_iter()
        .chain(segment.branches.iter().filter_map(|b| {
            branch_terms.get(&b.name).map(|id| AnnotationTerm {
                name: b.name.clone(),
                id: id.clone(),
            })
        }))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::StitchConfig;
    use crate::stitch::Stitcher;
    use crate::types::{Point, Side, Trace};

    #[test]
    fn trunk_synonyms_share_terms() {
        assert_eq!(trunk_term("left cervical trunk"), trunk_term("left cervical vagus nerve"));
        assert_eq!(trunk_term("right vagus nerve"), Some("ILX:0789705"));
        assert_eq!(trunk_term("vagus nerve"), None);
    }

    #[test]
    fn segment_terms_trunk_then_known_branches() {
        let traces = vec![
            Trace::new(
                "left vagus nerve",
                Side::Left,
                vec![Point::new(0.0, 0.0, 0.0), Point::new(0.0, 0.0, 10.0)],
            ),
            Trace::new(
                "left pulmonary branch A",
                Side::Left,
                vec![Point::new(0.0, 0.0, 0.0), Point::new(1.0, 0.0, 0.0)],
            ),
            Trace::new(
                "left superior laryngeal nerve",
                Side::Left,
                vec![Point::new(0.0, 0.0, 10.0), Point::new(1.0, 0.0, 10.0)],
            ),
        ];
        let segment = Stitcher::new(&StitchConfig::default())
            .unwrap()
            .stitch(Side::Left, traces);
        let branch_terms = BTreeMap::from([(
            "left superior laryngeal nerve".to_string(),
            "ILX:0795095".to_string(),
        )]);

        let terms = segment_terms(&segment, &branch_terms);
        assert_eq!(
            terms,
            vec![
                AnnotationTerm {
                    name: "left vagus nerve".to_string(),
                    id: "ILX:0785628".to_string(),
                },
                AnnotationTerm {
                    name: "left superior laryngeal nerve".to_string(),
                    id: "ILX:0795095".to_string(),
                },
            ]
        );
    }

    #[test]
    fn supplied_trunk_term_overrides_table() {
        let traces = vec![Trace::new(
            "left vagus nerve",
            Side::Left,
            vec![Point::new(0.0, 0.0, 0.0), Point::new(0.0, 0.0, 10.0)],
        )];
        let segment = Stitcher::new(&StitchConfig::default())
            .unwrap()
            .stitch(Side::Left, traces);

        let supplied =
            BTreeMap::from([("left vagus nerve".to_string(), "UBERON:0035020".to_string())]);
        assert_eq!(segment_terms(&segment, &supplied)[0].id, "UBERON:0035020");

        let fallback = segment_terms(&segment, &BTreeMap::new());
        assert_eq!(fallback[0].id, "ILX:0785628");
    }
}
