//! Template rendering behind a narrow interface.
use tera::{Context, Tera};

/// Renders a named template with the given context.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, context: &Context) -> Result<String, tera::Error>;
}

/// Tera-backed renderer, loaded once at startup.
#[derive(Debug)]
pub struct TeraRenderer {
    tera: Tera,
}

impl TeraRenderer {
    pub fn new(tera: Tera) -> Self {
        Self { tera }
    }

    /// Load every template under `dir`.
    pub fn from_dir(dir: &str) -> Result<Self, tera::Error> {
        let glob = format!("{}/**/*", dir.trim_end_matches('/'));
        Ok(Self::new(Tera::new(&glob)?))
    }
}

impl TemplateRenderer for TeraRenderer {
    fn render(&self, template: &str, context: &Context) -> Result<String, tera::Error> {
        self.tera.render(template, context)
    }
}
