use serde::{Deserialize, Serialize};

/// Composition semantics of a feature's children.
///
/// - `Leaf`: no group semantics (a plain `feature` in the model file)
/// - `And`: mandatory children are required, optional children are independent
/// - `Or`: at least one child must be selected once the group is active
/// - `Alt`: exactly one child must be selected once the group is active
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    #[serde(rename = "feature", alias = "leaf")]
    Leaf,
    And,
    Or,
    Alt,
}

impl FeatureKind {
    /// The tag used for this kind in feature model documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Leaf => "feature",
            Self::And => "and",
            Self::Or => "or",
            Self::Alt => "alt",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "feature" | "leaf" => Some(Self::Leaf),
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "alt" => Some(Self::Alt),
            _ => None,
        }
    }
}

/// A node of the feature model as it is loaded from a document.
///
/// This is the nested, owned input form. The engine works on the flattened
/// [`FeatureTree`](super::FeatureTree) built from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    #[serde(default)]
    pub mandatory: bool,
    /// Presentational only; carries no constraint semantics.
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub children: Vec<FeatureNode>,
}

impl FeatureNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Leaf,
            mandatory: false,
            is_abstract: false,
            children: Vec::new(),
        }
    }

    pub fn group(kind: FeatureKind, name: impl Into<String>, children: Vec<FeatureNode>) -> Self {
        Self {
            name: name.into(),
            kind,
            mandatory: false,
            is_abstract: false,
            children,
        }
    }

    pub fn and(name: impl Into<String>, children: Vec<FeatureNode>) -> Self {
        Self::group(FeatureKind::And, name, children)
    }

    pub fn or(name: impl Into<String>, children: Vec<FeatureNode>) -> Self {
        Self::group(FeatureKind::Or, name, children)
    }

    pub fn alt(name: impl Into<String>, children: Vec<FeatureNode>) -> Self {
        Self::group(FeatureKind::Alt, name, children)
    }

    /// Mark this node mandatory.
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Mark this node abstract.
    pub fn abstract_feature(mut self) -> Self {
        self.is_abstract = true;
        self
    }
}
