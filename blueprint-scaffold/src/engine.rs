//! Tera rendering engine for scaffolded files.

use tera::Tera;

use crate::context::EnvContext;
use crate::error::ScaffoldError;

// ---------------------------------------------------------------------------
// Embedded templates, baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

pub const ENV_TEMPLATE: &str = "env.tera";

const TPLS: &[(&str, &str)] = &[(ENV_TEMPLATE, include_str!("templates/env.tera"))];

fn build_tera() -> Result<Tera, ScaffoldError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TPLS.iter().copied())?;
    Ok(tera)
}

/// Renders the embedded scaffold templates. Create once and reuse.
pub struct Scaffolder {
    tera: Tera,
}

impl Scaffolder {
    pub fn new() -> Result<Self, ScaffoldError> {
        Ok(Scaffolder { tera: build_tera()? })
    }

    /// Render `.env` contents. Output always uses LF line endings.
    pub fn render_env(&self, ctx: &EnvContext) -> Result<String, ScaffoldError> {
        let rendered = self.tera.render(ENV_TEMPLATE, &ctx.to_tera_context()?)?;
        Ok(rendered.replace("\r\n", "\n"))
    }
}

/// Render the placeholder `.env` with the embedded template.
pub fn render_env_template() -> Result<String, ScaffoldError> {
    Scaffolder::new()?.render_env(&EnvContext::placeholders())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
