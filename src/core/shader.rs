//! Shader program loading
//!
//! WGSL is parsed and validated with naga before it ever reaches the device, so a
//! malformed shader surfaces as a [`RenderError::RenderResource`] at startup instead
//! of a device panic mid-frame. Binding slots are reflected once at link time and
//! looked up by name afterwards.

use crate::context::WgpuContext;
use crate::error::{RenderError, Result};
use naga::valid::{Capabilities, ValidationFlags, Validator};
use std::collections::HashMap;

/// Where a named shader input is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSlot {
    /// A module-scope resource at `@group(group) @binding(binding)`.
    Resource { group: u32, binding: u32 },
    /// A vertex stage input at `@location(location)`.
    VertexInput { location: u32 },
}

/// Name-to-slot table reflected from a WGSL module.
#[derive(Debug, Clone, Default)]
pub struct ShaderReflection {
    slots: HashMap<String, BindingSlot>,
    entry_points: Vec<String>,
}

impl ShaderReflection {
    /// Parse, validate and reflect WGSL source.
    pub fn from_wgsl(label: &str, source: &str) -> Result<Self> {
        let module = naga::front::wgsl::parse_str(source).map_err(|e| {
            RenderError::resource(format!(
                "failed to parse shader '{label}': {}",
                e.emit_to_string(source)
            ))
        })?;

        Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .map_err(|e| {
                RenderError::resource(format!(
                    "shader '{label}' failed validation: {}",
                    e.emit_to_string(source)
                ))
            })?;

        Ok(Self::from_module(&module))
    }

    fn from_module(module: &naga::Module) -> Self {
        let mut slots = HashMap::new();

        for (_, var) in module.global_variables.iter() {
            if let (Some(name), Some(binding)) = (&var.name, &var.binding) {
                slots.insert(
                    name.clone(),
                    BindingSlot::Resource {
                        group: binding.group,
                        binding: binding.binding,
                    },
                );
            }
        }

        for ep in &module.entry_points {
            if ep.stage != naga::ShaderStage::Vertex {
                continue;
            }
            for arg in &ep.function.arguments {
                match (&arg.binding, &module.types[arg.ty].inner) {
                    (Some(naga::Binding::Location { location, .. }), _) => {
                        if let Some(name) = &arg.name {
                            slots.insert(
                                name.clone(),
                                BindingSlot::VertexInput {
                                    location: *location,
                                },
                            );
                        }
                    }
                    (None, naga::TypeInner::Struct { members, .. }) => {
                        for member in members {
                            if let (Some(name), Some(naga::Binding::Location { location, .. })) =
                                (&member.name, &member.binding)
                            {
                                slots.insert(
                                    name.clone(),
                                    BindingSlot::VertexInput {
                                        location: *location,
                                    },
                                );
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        Self {
            slots,
            entry_points: module.entry_points.iter().map(|ep| ep.name.clone()).collect(),
        }
    }

    /// Look up any slot by name.
    pub fn slot(&self, name: &str) -> Result<BindingSlot> {
        self.slots
            .get(name)
            .copied()
            .ok_or_else(|| RenderError::resource(format!("shader has no input named '{name}'")))
    }

    /// Look up a resource binding by name, returning `(group, binding)`.
    pub fn resource(&self, name: &str) -> Result<(u32, u32)> {
        match self.slot(name)? {
            BindingSlot::Resource { group, binding } => Ok((group, binding)),
            BindingSlot::VertexInput { .. } => Err(RenderError::resource(format!(
                "'{name}' is a vertex input, not a resource"
            ))),
        }
    }

    /// Look up a vertex input location by name.
    pub fn vertex_input(&self, name: &str) -> Result<u32> {
        match self.slot(name)? {
            BindingSlot::VertexInput { location } => Ok(location),
            BindingSlot::Resource { .. } => Err(RenderError::resource(format!(
                "'{name}' is a resource, not a vertex input"
            ))),
        }
    }

    /// Whether the module declares an entry point with this name.
    pub fn has_entry_point(&self, name: &str) -> bool {
        self.entry_points.iter().any(|ep| ep == name)
    }
}

/// A validated shader module together with its reflected bindings.
pub struct ShaderProgram {
    module: wgpu::ShaderModule,
    reflection: ShaderReflection,
}

impl ShaderProgram {
    /// Validate, reflect and compile WGSL source.
    pub fn new(ctx: &WgpuContext, label: &str, source: &str) -> Result<Self> {
        let reflection = ShaderReflection::from_wgsl(label, source)?;
        let module = ctx.capture(label, |device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        })?;
        tracing::debug!("Linked shader '{}'", label);
        Ok(Self { module, reflection })
    }

    /// Get the compiled module.
    pub fn module(&self) -> &wgpu::ShaderModule {
        &self.module
    }

    /// Get the reflected bindings.
    pub fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
        struct Camera { view_proj: mat4x4<f32> };
        @group(1) @binding(2) var<uniform> camera: Camera;

        struct VertexInput {
            @location(0) position: vec3<f32>,
            @location(3) normal: vec3<f32>,
        };

        @vertex
        fn vs_main(in: VertexInput) -> @builtin(position) vec4<f32> {
            return camera.view_proj * vec4<f32>(in.position + in.normal * 0.0, 1.0);
        }
    "#;

    #[test]
    fn test_reflects_resources_and_inputs() {
        let reflection = ShaderReflection::from_wgsl("test", SOURCE).unwrap();
        assert_eq!(reflection.resource("camera").unwrap(), (1, 2));
        assert_eq!(reflection.vertex_input("position").unwrap(), 0);
        assert_eq!(reflection.vertex_input("normal").unwrap(), 3);
        assert!(reflection.has_entry_point("vs_main"));
    }

    #[test]
    fn test_unknown_name_is_resource_error() {
        let reflection = ShaderReflection::from_wgsl("test", SOURCE).unwrap();
        assert!(matches!(
            reflection.slot("missing"),
            Err(RenderError::RenderResource(_))
        ));
        assert!(reflection.vertex_input("camera").is_err());
    }

    #[test]
    fn test_invalid_source_is_rejected() {
        let err = ShaderReflection::from_wgsl("broken", "fn main( {").unwrap_err();
        assert!(matches!(err, RenderError::RenderResource(_)));
    }

    #[test]
    fn test_type_errors_fail_validation() {
        let source = r#"
            @vertex
            fn vs_main() -> @builtin(position) vec4<f32> {
                let x: f32 = vec2<f32>(1.0, 2.0);
                return vec4<f32>(x);
            }
        "#;
        assert!(ShaderReflection::from_wgsl("typed", source).is_err());
    }
}
