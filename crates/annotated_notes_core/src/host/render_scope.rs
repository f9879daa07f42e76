//! Scoped switch of the render environment into site mode.

use crate::host::{RenderEnvironment, TemplateMode};

/// Puts the host into site template mode with eager transforms for as long
/// as the scope lives, then restores the previous values on drop.
///
/// Restoration runs on every exit path, including early returns and
/// unwinding out of the template evaluator.
pub struct SiteRenderScope<'a, E: RenderEnvironment + ?Sized> {
    env: &'a E,
    previous_mode: TemplateMode,
    previous_eager_transforms: bool,
}

impl<'a, E: RenderEnvironment + ?Sized> SiteRenderScope<'a, E> {
    pub fn enter(env: &'a E) -> Self {
        let previous_mode = env.template_mode();
        let previous_eager_transforms = env.eager_transforms();
        env.set_eager_transforms(true);
        env.set_template_mode(TemplateMode::Site);
        Self {
            env,
            previous_mode,
            previous_eager_transforms,
        }
    }
}

impl<E: RenderEnvironment + ?Sized> Drop for SiteRenderScope<'_, E> {
    fn drop(&mut self) {
        self.env.set_template_mode(self.previous_mode);
        self.env.set_eager_transforms(self.previous_eager_transforms);
    }
}
