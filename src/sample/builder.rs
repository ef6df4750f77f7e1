//! Sample builders and the registry of named builders.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{standard, MultiLayer, SampleError};

/// Builds a sample from a small set of named parameters.
pub trait SampleBuilder: Send + Sync {
    /// Registry name.
    fn name(&self) -> &'static str;

    /// One-line description.
    fn description(&self) -> &'static str {
        ""
    }

    fn build_sample(&self) -> Result<MultiLayer, SampleError>;

    fn clone_box(&self) -> Box<dyn SampleBuilder>;

    /// Visit the builder's own parameters below `path`.
    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64));

    /// Parameter names (without path prefix) and current values.
    fn parameters(&self) -> Vec<(String, f64)> {
        let mut copy = self.clone_box();
        let mut out = Vec::new();
        copy.visit_parameters("", &mut |name, value| {
            out.push((name.trim_start_matches('/').to_string(), *value));
        });
        out
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), SampleError> {
        let mut found = false;
        self.visit_parameters("", &mut |path, v| {
            if path.trim_start_matches('/') == name {
                *v = value;
                found = true;
            }
        });
        if found {
            Ok(())
        } else {
            Err(SampleError::UnknownParameter {
                builder: self.name().to_string(),
                name: name.to_string(),
            })
        }
    }
}

impl Clone for Box<dyn SampleBuilder> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl fmt::Debug for dyn SampleBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleBuilder")
            .field("name", &self.name())
            .field("parameters", &self.parameters())
            .finish()
    }
}

/// Registry of available sample builders.
pub struct SampleBuilderRegistry {
    builders: HashMap<String, Arc<dyn SampleBuilder>>,
}

impl SampleBuilderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Create a registry with the standard samples registered.
    pub fn new_with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(standard::CylindersInDwbaBuilder::default());
        registry.register(standard::CylindersInBaBuilder::default());
        registry.register(standard::RadialParaCrystalBuilder::default());
        registry.register(standard::TwoTypesCylindersBuilder::default());
        registry.register(standard::CylindersLmaBuilder::default());
        registry.register(standard::CylindersSscaBuilder::default());
        registry.register(standard::BuriedSpheresBuilder::default());
        registry.register(standard::CoreShellBoxesBuilder::default());
        registry.register(standard::SquareLattice2DBuilder::default());
        registry.register(standard::SpheresInBaBuilder::default());
        registry
    }

    pub fn register<B: SampleBuilder + 'static>(&mut self, builder: B) {
        self.builders
            .insert(builder.name().to_string(), Arc::new(builder));
    }

    pub fn register_arc(&mut self, builder: Arc<dyn SampleBuilder>) {
        self.builders.insert(builder.name().to_string(), builder);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SampleBuilder>> {
        self.builders.get(name).cloned()
    }

    /// Independent, mutable copy of a registered builder.
    pub fn create(&self, name: &str) -> Result<Box<dyn SampleBuilder>, SampleError> {
        self.builders
            .get(name)
            .map(|b| b.clone_box())
            .ok_or_else(|| SampleError::UnknownBuilder(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.builders.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn SampleBuilder>> {
        self.builders.remove(name)
    }
}

impl Default for SampleBuilderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
