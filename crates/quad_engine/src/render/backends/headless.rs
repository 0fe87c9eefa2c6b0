//! Headless backend
//!
//! Records every backend call as a [`BackendCommand`] instead of talking to a
//! GPU. Shader setups are executed against an in-memory uniform table so the
//! values they upload can be inspected afterwards.
//!
//! Resource checks are opt-in: once a shader (or texture) has been
//! registered, handles that were never registered are rejected.

use std::collections::{HashMap, HashSet};

use crate::render::api::{
    BackendResult, ClearFlags, Color, RenderBackend, RenderParams, ShaderHandle, ShaderSetup,
    ShaderUniforms, TextureHandle, UniformValue,
};
use crate::render::RenderError;

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    /// `clear` call
    Clear {
        /// Clear color
        color: Color,
        /// Cleared buffers
        flags: ClearFlags,
    },
    /// `bind_shader` call
    BindShader(ShaderHandle),
    /// `set_shader_params` call, with the uniforms the setup wrote
    SetShaderParams(Vec<(String, UniformValue)>),
    /// `render` call
    Render(RenderParams),
    /// `process` call
    Process,
    /// `end_frame` call
    EndFrame,
}

#[derive(Default)]
struct UniformRecorder {
    writes: Vec<(String, UniformValue)>,
}

impl ShaderUniforms for UniformRecorder {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.writes.push((name.to_owned(), value));
    }
}

/// Backend that records calls for inspection
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    commands: Vec<BackendCommand>,
    bound_shader: Option<ShaderHandle>,
    uniforms: HashMap<(ShaderHandle, String), UniformValue>,
    frames: u64,
    fail_renders: bool,
    known_shaders: Option<HashSet<ShaderHandle>>,
    known_textures: Option<HashSet<TextureHandle>>,
}

impl HeadlessBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `render` call fail
    pub fn set_fail_renders(&mut self, fail: bool) {
        self.fail_renders = fail;
    }

    /// Declare a shader as loaded
    ///
    /// After the first registration, binding an unregistered shader fails
    /// with [`RenderError::UnknownShader`].
    pub fn register_shader(&mut self, shader: ShaderHandle) {
        self.known_shaders.get_or_insert_with(HashSet::new).insert(shader);
    }

    /// Declare a texture as loaded
    ///
    /// After the first registration, draw calls sampling an unregistered
    /// texture fail with [`RenderError::UnknownTexture`].
    pub fn register_texture(&mut self, texture: TextureHandle) {
        self.known_textures.get_or_insert_with(HashSet::new).insert(texture);
    }

    /// All commands recorded so far
    pub fn commands(&self) -> &[BackendCommand] {
        &self.commands
    }

    /// Drain the recorded commands
    pub fn take_commands(&mut self) -> Vec<BackendCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of completed frames
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Currently bound shader
    pub fn bound_shader(&self) -> Option<ShaderHandle> {
        self.bound_shader
    }

    /// Last value uploaded to `name` on `shader`
    pub fn uniform(&self, shader: ShaderHandle, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(&(shader, name.to_owned()))
    }

    /// Draw calls recorded so far, in submission order
    pub fn draw_calls(&self) -> impl Iterator<Item = &RenderParams> {
        self.commands.iter().filter_map(|cmd| match cmd {
            BackendCommand::Render(params) => Some(params),
            _ => None,
        })
    }

    /// Number of `bind_shader` calls recorded so far
    pub fn shader_binds(&self) -> usize {
        self.commands
            .iter()
            .filter(|cmd| matches!(cmd, BackendCommand::BindShader(_)))
            .count()
    }
}

impl RenderBackend for HeadlessBackend {
    fn clear(&mut self, color: Color, flags: ClearFlags) -> BackendResult<()> {
        self.commands.push(BackendCommand::Clear { color, flags });
        Ok(())
    }

    fn bind_shader(&mut self, shader: ShaderHandle) -> BackendResult<()> {
        if let Some(known) = &self.known_shaders {
            if !known.contains(&shader) {
                return Err(RenderError::UnknownShader(shader));
            }
        }
        self.bound_shader = Some(shader);
        self.commands.push(BackendCommand::BindShader(shader));
        Ok(())
    }

    fn set_shader_params(&mut self, setup: ShaderSetup) -> BackendResult<()> {
        let shader = self
            .bound_shader
            .ok_or(RenderError::NoShaderBound)?;

        let mut recorder = UniformRecorder::default();
        setup(&mut recorder);

        for (name, value) in &recorder.writes {
            self.uniforms.insert((shader, name.clone()), value.clone());
        }
        self.commands
            .push(BackendCommand::SetShaderParams(recorder.writes));
        Ok(())
    }

    fn render(&mut self, params: &RenderParams) -> BackendResult<()> {
        if self.fail_renders {
            return Err(RenderError::RenderingFailed(
                "headless backend set to fail".to_string(),
            ));
        }
        if let Some(known) = &self.known_textures {
            if let Some(&texture) = params.textures.iter().find(|t| !known.contains(*t)) {
                return Err(RenderError::UnknownTexture(texture));
            }
        }
        self.commands.push(BackendCommand::Render(params.clone()));
        Ok(())
    }

    fn process(&mut self) -> BackendResult<()> {
        self.commands.push(BackendCommand::Process);
        Ok(())
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        self.frames += 1;
        self.commands.push(BackendCommand::EndFrame);
        log::trace!("Headless frame {} finished", self.frames);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_records_commands_in_order() {
        let mut backend = HeadlessBackend::new();
        backend.clear(Color::BLACK, ClearFlags::COLOR).unwrap();
        backend.bind_shader(ShaderHandle(3)).unwrap();
        backend.render(&RenderParams::default()).unwrap();
        backend.process().unwrap();
        backend.end_frame().unwrap();

        assert_eq!(backend.commands().len(), 5);
        assert_eq!(backend.commands()[1], BackendCommand::BindShader(ShaderHandle(3)));
        assert_eq!(backend.draw_calls().count(), 1);
        assert_eq!(backend.frames(), 1);
    }

    #[test]
    fn test_shader_setup_writes_uniforms() {
        let mut backend = HeadlessBackend::new();
        let setup: ShaderSetup = Arc::new(|uniforms: &mut dyn ShaderUniforms| {
            uniforms.set_uniform("time", UniformValue::Float(2.5));
        });

        assert!(backend.set_shader_params(setup.clone()).is_err());

        backend.bind_shader(ShaderHandle(1)).unwrap();
        backend.set_shader_params(setup).unwrap();
        assert_eq!(
            backend.uniform(ShaderHandle(1), "time"),
            Some(&UniformValue::Float(2.5))
        );
        assert!(backend.uniform(ShaderHandle(2), "time").is_none());
    }

    #[test]
    fn test_failing_renders() {
        let mut backend = HeadlessBackend::new();
        backend.set_fail_renders(true);
        assert!(backend.render(&RenderParams::default()).is_err());
        assert_eq!(backend.draw_calls().count(), 0);
    }

    #[test]
    fn test_registered_resources_are_checked() {
        let mut backend = HeadlessBackend::new();
        // Nothing registered: every handle is accepted
        backend.bind_shader(ShaderHandle(9)).unwrap();

        backend.register_shader(ShaderHandle(1));
        backend.register_texture(TextureHandle(4));

        assert_eq!(
            backend.bind_shader(ShaderHandle(2)),
            Err(RenderError::UnknownShader(ShaderHandle(2)))
        );
        // The previous binding survives the rejected one
        assert_eq!(backend.bound_shader(), Some(ShaderHandle(9)));
        backend.bind_shader(ShaderHandle(1)).unwrap();

        let mut params = RenderParams {
            textures: vec![TextureHandle(4), TextureHandle(5)],
            ..RenderParams::default()
        };
        assert_eq!(
            backend.render(&params),
            Err(RenderError::UnknownTexture(TextureHandle(5)))
        );
        params.textures.pop();
        backend.render(&params).unwrap();

        assert_eq!(backend.shader_binds(), 2);
        assert_eq!(backend.draw_calls().count(), 1);
    }
}
