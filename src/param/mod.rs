//! Parameter tree: named access to the tunable values of samples and
//! instruments.
//!
//! Every node walks its own `f64` fields and recurses into its children,
//! handing each value to a visitor together with its full path, e.g.
//! `/GISASSimulation/MultiLayer/Layer0/ParticleLayout0/Particle0/FormFactorCylinder/radius`.
//! Fit parameters and parameter distributions address values by glob patterns
//! over these paths.

pub mod distribution;
pub mod pattern;

pub use distribution::{Distribution1D, ParameterDistribution};
pub use pattern::match_pattern;

use thiserror::Error;

/// Errors raised while addressing parameters.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error("no parameter matches pattern '{pattern}'")]
    NoMatch { pattern: String },
    #[error("invalid distribution: {0}")]
    InvalidDistribution(String),
}

/// A node of the parameter tree.
pub trait Parameterized {
    /// Path segment naming this node.
    fn node_name(&self) -> String;

    /// Visit every tunable value below `path` (which already ends with this
    /// node's own segment).
    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64));
}

/// Join a parent path and a child segment.
#[inline]
pub fn child_path(parent: &str, segment: &str) -> String {
    format!("{parent}/{segment}")
}

/// Segment name for the `index`-th child of a kind, numbered only when the
/// parent holds several of them.
pub fn indexed_segment(name: &str, index: usize, count: usize) -> String {
    if count > 1 {
        format!("{name}{index}")
    } else {
        name.to_string()
    }
}

/// Root path of a node.
pub fn root_path<P: Parameterized + ?Sized>(node: &P) -> String {
    format!("/{}", node.node_name())
}

/// Snapshot of every parameter path and its current value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterPool {
    entries: Vec<(String, f64)>,
}

impl ParameterPool {
    /// Collect the parameters of a node.
    pub fn from_node<P: Parameterized + ?Sized>(node: &mut P) -> Self {
        let root = root_path(node);
        let mut entries = Vec::new();
        node.visit_parameters(&root, &mut |name, value| {
            entries.push((name.to_string(), *value));
        });
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All parameter paths in visiting order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Value of an exact path.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Paths matching a glob pattern.
    pub fn matching(&self, pattern: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| match_pattern(pattern, n))
            .map(|(n, _)| n.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }
}

/// Every parameter path of a node.
pub fn parameter_names<P: Parameterized + ?Sized>(node: &mut P) -> Vec<String> {
    let root = root_path(node);
    let mut names = Vec::new();
    node.visit_parameters(&root, &mut |name, _| names.push(name.to_string()));
    names
}

/// Set every parameter matching `pattern` to `value`.
///
/// Returns the number of parameters changed.
pub fn set_parameter_value<P: Parameterized + ?Sized>(
    node: &mut P,
    pattern: &str,
    value: f64,
) -> Result<usize, ParameterError> {
    let root = root_path(node);
    let mut count = 0usize;
    node.visit_parameters(&root, &mut |name, v| {
        if match_pattern(pattern, name) {
            *v = value;
            count += 1;
        }
    });
    if count == 0 {
        return Err(ParameterError::NoMatch {
            pattern: pattern.to_string(),
        });
    }
    Ok(count)
}

/// Count parameters matching `pattern` without modifying them.
pub fn count_matches<P: Parameterized + ?Sized>(node: &mut P, pattern: &str) -> usize {
    let root = root_path(node);
    let mut count = 0usize;
    node.visit_parameters(&root, &mut |name, _| {
        if match_pattern(pattern, name) {
            count += 1;
        }
    });
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf {
        radius: f64,
        height: f64,
    }

    impl Parameterized for Leaf {
        fn node_name(&self) -> String {
            "FormFactorCylinder".into()
        }

        fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
            visitor(&child_path(path, "radius"), &mut self.radius);
            visitor(&child_path(path, "height"), &mut self.height);
        }
    }

    #[test]
    fn test_pool_and_set() {
        let mut leaf = Leaf {
            radius: 5.0,
            height: 10.0,
        };
        let pool = ParameterPool::from_node(&mut leaf);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get("/FormFactorCylinder/radius"), Some(5.0));

        let n = set_parameter_value(&mut leaf, "*/radius", 7.0).unwrap();
        assert_eq!(n, 1);
        assert_eq!(leaf.radius, 7.0);

        let n = set_parameter_value(&mut leaf, "*Cylinder/*", 1.0).unwrap();
        assert_eq!(n, 2);
        assert_eq!(leaf.height, 1.0);
    }

    #[test]
    fn test_no_match() {
        let mut leaf = Leaf {
            radius: 5.0,
            height: 10.0,
        };
        let err = set_parameter_value(&mut leaf, "*/width", 1.0).unwrap_err();
        assert!(matches!(err, ParameterError::NoMatch { .. }));
    }

    #[test]
    fn test_indexed_segment() {
        assert_eq!(indexed_segment("Layer", 0, 1), "Layer");
        assert_eq!(indexed_segment("Layer", 1, 3), "Layer1");
    }
}
