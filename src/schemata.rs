use serde::{Deserialize, Serialize};

/// Environment variable through which the already-built artifact learns
/// which schema is active. Unset for the baseline.
pub const ACTIVATION_ENV: &str = "MUTOR_ACTIVATION";

/// Operator ids understood by the CLI. The transformer may support fewer;
/// this list only gates argument validation.
pub const KNOWN_OPERATORS: &[&str] = &[
    "logical_operator",
    "relational_operator",
    "arithmetic_operator",
    "remove_side_effects",
    "change_boolean_literal",
    "swap_ternary",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One candidate mutation: where it is and which operator produced it.
/// Immutable once discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationPoint {
    pub operator_id: String,
    pub file_path: String,
    pub position: SourcePosition,
}

/// Before/after source fragment for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationSnapshot {
    pub before: String,
    pub after: String,
}

/// One concretely embedded mutation: a point plus the identifier that
/// activates it at test time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationSchema {
    pub operator_id: String,
    pub file_path: String,
    pub position: SourcePosition,
    pub activation_id: String,
    pub snapshot: MutationSnapshot,
}

impl MutationSchema {
    pub fn mutation_point(&self) -> MutationPoint {
        MutationPoint {
            operator_id: self.operator_id.clone(),
            file_path: self.file_path.clone(),
            position: self.position,
        }
    }
}

/// All schemata embedded into one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationMapping {
    pub file_path: String,
    pub file_name: String,
    pub schemata: Vec<MutationSchema>,
}

impl MutationMapping {
    pub fn total_schemata(mappings: &[MutationMapping]) -> usize {
        mappings.iter().map(|m| m.schemata.len()).sum()
    }
}

/// Activation signal for one test cycle. At most one schema is ever active;
/// `None` is the baseline sentinel and must reproduce original behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    None,
    Schema(String),
}

impl Activation {
    pub fn env_value(&self) -> Option<&str> {
        match self {
            Activation::None => None,
            Activation::Schema(id) => Some(id),
        }
    }
}

/// Deterministic activation id so a plan written by one process activates
/// the same embedded schema in another.
pub fn activation_id(operator_id: &str, file_name: &str, position: SourcePosition) -> String {
    format!("{}_{}_{}_{}", operator_id, file_name, position.line, position.column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_id_is_deterministic() {
        let pos = SourcePosition { line: 12, column: 7 };
        let a = activation_id("logical_operator", "lib.rs", pos);
        let b = activation_id("logical_operator", "lib.rs", pos);
        assert_eq!(a, b);
        assert_eq!(a, "logical_operator_lib.rs_12_7");
    }

    #[test]
    fn baseline_activation_has_no_env_value() {
        assert_eq!(Activation::None.env_value(), None);
        assert_eq!(
            Activation::Schema("id1".into()).env_value(),
            Some("id1")
        );
    }

    #[test]
    fn total_schemata_sums_across_mappings() {
        let schema = |id: &str| MutationSchema {
            operator_id: "logical_operator".into(),
            file_path: "src/a.rs".into(),
            position: SourcePosition { line: 1, column: 1 },
            activation_id: id.into(),
            snapshot: MutationSnapshot { before: "&&".into(), after: "||".into() },
        };
        let mappings = vec![
            MutationMapping {
                file_path: "src/a.rs".into(),
                file_name: "a.rs".into(),
                schemata: vec![schema("a"), schema("b")],
            },
            MutationMapping {
                file_path: "src/b.rs".into(),
                file_name: "b.rs".into(),
                schemata: vec![schema("c")],
            },
        ];
        assert_eq!(MutationMapping::total_schemata(&mappings), 3);
    }
}
