use std::borrow::Cow;
use std::collections::HashMap;

/// Error returned by [`ShaderCache`] lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderError {
    #[error("unknown shader program '{0}'")]
    UnknownProgram(String),
}

/// Named WGSL programs, compiled once per device on first use.
///
/// Renderers register their sources up front and ask for modules by name when
/// building pipelines. Re-registering a name replaces the source and drops the
/// compiled module so the next lookup recompiles.
#[derive(Default)]
pub struct ShaderCache {
    sources: HashMap<String, Cow<'static, str>>,
    modules: HashMap<String, wgpu::ShaderModule>,
}

impl ShaderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `source` under `name`. Returns `true` if a previous source
    /// was replaced.
    pub fn register(&mut self, name: impl Into<String>, source: impl Into<Cow<'static, str>>) -> bool {
        let name = name.into();
        self.modules.remove(&name);
        self.sources.insert(name, source.into()).is_some()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn is_compiled(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn source(&self, name: &str) -> Result<&str, ShaderError> {
        self.sources
            .get(name)
            .map(|s| s.as_ref())
            .ok_or_else(|| ShaderError::UnknownProgram(name.to_string()))
    }

    /// Returns the compiled module for `name`, compiling it on first use.
    pub fn module(&mut self, device: &wgpu::Device, name: &str) -> Result<wgpu::ShaderModule, ShaderError> {
        if let Some(module) = self.modules.get(name) {
            return Ok(module.clone());
        }

        let source = self.source(name)?.to_owned();
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("tableau {name} shader")),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        log::debug!("compiled shader program '{name}'");

        self.modules.insert(name.to_string(), module.clone());
        Ok(module)
    }

    /// Drops every compiled module (e.g. after a device loss). Sources stay registered.
    pub fn clear_compiled(&mut self) {
        self.modules.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_program_is_an_error() {
        let cache = ShaderCache::new();
        assert_eq!(cache.source("mask"), Err(ShaderError::UnknownProgram("mask".into())));
    }

    #[test]
    fn register_then_lookup_source() {
        let mut cache = ShaderCache::new();
        assert!(!cache.register("mask", "@vertex fn vs_main() {}"));
        assert!(cache.is_registered("mask"));
        assert!(!cache.is_compiled("mask"));
        assert_eq!(cache.source("mask"), Ok("@vertex fn vs_main() {}"));
    }

    #[test]
    fn re_register_replaces_source() {
        let mut cache = ShaderCache::new();
        cache.register("layer", "a");
        assert!(cache.register("layer", String::from("b")));
        assert_eq!(cache.source("layer"), Ok("b"));
    }
}
