//! Layers and the multilayer stack.

use serde::{Deserialize, Serialize};

use crate::param::{child_path, indexed_segment, Parameterized};

use super::{HomogeneousMaterial, ParticleLayout, SampleError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub material: HomogeneousMaterial,
    /// Ignored for the ambient and substrate layers.
    #[serde(default)]
    pub thickness: f64,
    #[serde(default)]
    pub layouts: Vec<ParticleLayout>,
}

impl Layer {
    pub fn new(material: HomogeneousMaterial, thickness: f64) -> Self {
        Self {
            material,
            thickness,
            layouts: Vec::new(),
        }
    }

    pub fn with_layout(mut self, layout: ParticleLayout) -> Self {
        self.layouts.push(layout);
        self
    }

    pub fn add_layout(&mut self, layout: ParticleLayout) {
        self.layouts.push(layout);
    }
}

/// Stack of layers from the ambient (index 0) down to the substrate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct MultiLayer {
    pub layers: Vec<Layer>,
}

impl MultiLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layer(&mut self, layer: Layer) -> &mut Self {
        self.layers.push(layer);
        self
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// True if a substrate lies below the ambient.
    pub fn has_substrate(&self) -> bool {
        self.layers.len() > 1
    }

    /// Effective thickness: zero for the semi-infinite outer layers.
    pub fn layer_thickness(&self, index: usize) -> f64 {
        if index == 0 || index + 1 >= self.layers.len() {
            0.0
        } else {
            self.layers[index].thickness
        }
    }

    /// Number of distinct particle species over all layouts.
    pub fn particle_species_count(&self) -> usize {
        self.layers
            .iter()
            .flat_map(|l| l.layouts.iter())
            .map(|layout| layout.particles.len())
            .sum()
    }

    pub fn validate(&self) -> Result<(), SampleError> {
        if self.layers.is_empty() {
            return Err(SampleError::NoLayers);
        }
        let last = self.layers.len() - 1;
        for (index, layer) in self.layers.iter().enumerate() {
            if layer.thickness < 0.0 || !layer.thickness.is_finite() {
                return Err(SampleError::InvalidThickness {
                    layer: index,
                    thickness: layer.thickness,
                });
            }
            for layout in &layer.layouts {
                layout.validate()?;
                for info in &layout.particles {
                    let depth = info.depth;
                    let valid = if self.layers.len() == 1 {
                        depth.is_finite()
                    } else if index == 0 {
                        depth <= 0.0
                    } else if index == last {
                        depth >= 0.0
                    } else {
                        depth >= 0.0 && depth <= layer.thickness
                    };
                    if !valid {
                        return Err(SampleError::InvalidDepth {
                            layer: index,
                            depth,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl Parameterized for MultiLayer {
    fn node_name(&self) -> String {
        "MultiLayer".into()
    }

    fn visit_parameters(&mut self, path: &str, visitor: &mut dyn FnMut(&str, &mut f64)) {
        let count = self.layers.len();
        for (i, layer) in self.layers.iter_mut().enumerate() {
            let layer_path = child_path(path, &indexed_segment("Layer", i, count));
            visitor(&child_path(&layer_path, "thickness"), &mut layer.thickness);
            let layouts = layer.layouts.len();
            for (k, layout) in layer.layouts.iter_mut().enumerate() {
                let layout_path =
                    child_path(&layer_path, &indexed_segment("ParticleLayout", k, layouts));
                layout.visit_parameters(&layout_path, visitor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{parameter_names, set_parameter_value};
    use crate::sample::{FormFactor, Particle};

    fn cylinders_on_substrate(depth: f64) -> MultiLayer {
        let mut layout = ParticleLayout::new();
        layout.add_particle(
            Particle::new(
                HomogeneousMaterial::new("Particle", 6e-4, 2e-8),
                FormFactor::Cylinder {
                    radius: 5.0,
                    height: 5.0,
                },
            ),
            depth,
            1.0,
        );
        MultiLayer::new()
            .with_layer(Layer::new(HomogeneousMaterial::air(), 0.0).with_layout(layout))
            .with_layer(Layer::new(
                HomogeneousMaterial::new("Substrate", 6e-6, 2e-8),
                0.0,
            ))
    }

    #[test]
    fn test_validate() {
        assert!(cylinders_on_substrate(0.0).validate().is_ok());
        assert!(matches!(
            cylinders_on_substrate(3.0).validate(),
            Err(SampleError::InvalidDepth { layer: 0, .. })
        ));
        assert!(matches!(
            MultiLayer::new().validate(),
            Err(SampleError::NoLayers)
        ));
    }

    #[test]
    fn test_negative_thickness() {
        let ml = MultiLayer::new()
            .with_layer(Layer::new(HomogeneousMaterial::air(), 0.0))
            .with_layer(Layer::new(HomogeneousMaterial::air(), -1.0))
            .with_layer(Layer::new(HomogeneousMaterial::air(), 0.0));
        assert!(matches!(
            ml.validate(),
            Err(SampleError::InvalidThickness { layer: 1, .. })
        ));
    }

    #[test]
    fn test_parameter_tree() {
        let mut ml = cylinders_on_substrate(0.0);
        let names = parameter_names(&mut ml);
        assert!(names.contains(
            &"/MultiLayer/Layer0/ParticleLayout/Particle/FormFactorCylinder/radius".to_string()
        ));
        assert!(names.contains(&"/MultiLayer/Layer1/thickness".to_string()));
        set_parameter_value(&mut ml, "*FormFactorCylinder/height", 8.0).unwrap();
        let layout = &ml.layers[0].layouts[0];
        match &layout.particles[0].particle {
            crate::sample::ParticleSpecies::Single(p) => assert_eq!(
                p.form_factor,
                FormFactor::Cylinder {
                    radius: 5.0,
                    height: 8.0
                }
            ),
            other => panic!("unexpected particle {other:?}"),
        }
    }
}
