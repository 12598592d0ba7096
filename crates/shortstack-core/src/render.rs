//! Template rendering.
//!
//! Stacks render through the [`Renderer`] trait. [`MiniJinjaRenderer`] is the
//! bundled implementation: it loads templates from one or more root
//! directories and ships a built-in `error` view in `html`, `json` and
//! `text` flavors.
//!
//! Lookup for `render("show", Some(json))` tries `show.json`, then `show`.

use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment, ErrorKind};
use thiserror::Error;

use crate::error::HttpError;
use crate::format::Format;

const ERROR_HTML: &str = "<h1>{{ code }} {{ name }}</h1>\n<p>{{ description }}</p>\n";
const ERROR_JSON: &str =
    "{\"status\": {{ code }}, \"name\": {{ name|tojson }}, \"description\": {{ description|tojson }}}\n";
const ERROR_TEXT: &str = "{{ code }} {{ name }}\n\n{{ description }}\n";

/// Template suffixes stripped from file names when loading roots.
const ENGINE_SUFFIXES: [&str; 2] = [".jinja", ".j2"];

/// Errors raised while loading or rendering templates.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No candidate template exists.
    #[error("template not found: {name}")]
    NotFound {
        /// The requested name, without format.
        name: String,
    },

    /// The template exists but failed to compile or render.
    #[error("failed to render template {name}: {message}")]
    Render {
        /// Template that failed.
        name: String,
        /// Engine error message.
        message: String,
    },

    /// A template root could not be read.
    #[error("failed to load templates from {}: {source}", path.display())]
    Load {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl From<RenderError> for HttpError {
    fn from(err: RenderError) -> Self {
        HttpError::server_with_source(err.to_string(), err)
    }
}

/// Renders named templates with JSON bindings.
pub trait Renderer: Send + Sync {
    /// Renders `name`, preferring the `<name>.<format>` variant.
    fn render(
        &self,
        name: &str,
        format: Option<&Format>,
        bindings: &serde_json::Value,
    ) -> Result<String, RenderError>;
}

/// The template names tried for `name` in `format`, in order.
#[must_use]
pub fn candidates(name: &str, format: Option<&Format>) -> Vec<String> {
    let mut names = Vec::with_capacity(2);
    if let Some(format) = format {
        names.push(format!("{name}.{format}"));
    }
    names.push(name.to_string());
    names
}

/// A [`Renderer`] backed by minijinja.
///
/// HTML and XML templates are auto-escaped; layouts must emit their content
/// with `{{ content|safe }}`.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use shortstack_core::{Format, MiniJinjaRenderer, Renderer};
///
/// let mut renderer = MiniJinjaRenderer::new();
/// renderer.add_template("greet.text", "hello {{ who }}").unwrap();
///
/// let out = renderer.render("greet", Some(&Format::TEXT), &json!({"who": "you"})).unwrap();
/// assert_eq!(out, "hello you");
/// ```
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
}

impl std::fmt::Debug for MiniJinjaRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniJinjaRenderer").finish_non_exhaustive()
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MiniJinjaRenderer {
    /// A renderer holding only the built-in views.
    #[must_use]
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|name: &str| {
            if [".html", ".htm", ".xml"].iter().any(|ext| name.ends_with(ext)) {
                AutoEscape::Html
            } else {
                AutoEscape::None
            }
        });

        let mut renderer = Self { env };
        for (name, source) in [
            ("error.html", ERROR_HTML),
            ("error.json", ERROR_JSON),
            ("error.text", ERROR_TEXT),
            ("error", ERROR_TEXT),
        ] {
            // The built-in sources are fixed and known to compile.
            if let Err(err) = renderer.add_template(name, source) {
                tracing::error!(template = name, error = %err, "built-in template failed to compile");
            }
        }
        renderer
    }

    /// Loads every file under each root, in order; later roots override
    /// templates of the same name from earlier ones.
    ///
    /// A file's template name is its path relative to the root, with `/`
    /// separators and any `.jinja` / `.j2` suffix removed, so
    /// `views/posts/show.html.jinja` becomes `posts/show.html`.
    pub fn from_roots<P: AsRef<Path>>(roots: &[P]) -> Result<Self, RenderError> {
        let mut renderer = Self::new();
        for root in roots {
            renderer.load_root(root.as_ref())?;
        }
        Ok(renderer)
    }

    /// Loads every file under `root`.
    pub fn load_root(&mut self, root: &Path) -> Result<usize, RenderError> {
        let mut files = Vec::new();
        collect_files(root, &mut files)?;
        files.sort();

        for path in &files {
            let source = std::fs::read_to_string(path).map_err(|source| RenderError::Load {
                path: path.clone(),
                source,
            })?;
            let name = template_name(root, path);
            tracing::debug!(template = %name, path = %path.display(), "loaded template");
            self.add_template(&name, &source)?;
        }
        Ok(files.len())
    }

    /// Adds or replaces a template.
    pub fn add_template(&mut self, name: &str, source: &str) -> Result<(), RenderError> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())
            .map_err(|err| RenderError::Render {
                name: name.to_string(),
                message: err.to_string(),
            })
    }

    /// Whether a template with exactly `name` exists.
    #[must_use]
    pub fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }
}

impl Renderer for MiniJinjaRenderer {
    fn render(
        &self,
        name: &str,
        format: Option<&Format>,
        bindings: &serde_json::Value,
    ) -> Result<String, RenderError> {
        for candidate in candidates(name, format) {
            let template = match self.env.get_template(&candidate) {
                Ok(template) => template,
                Err(err) if err.kind() == ErrorKind::TemplateNotFound => continue,
                Err(err) => {
                    return Err(RenderError::Render {
                        name: candidate,
                        message: err.to_string(),
                    })
                }
            };
            return template.render(bindings).map_err(|err| RenderError::Render {
                name: candidate,
                message: err.to_string(),
            });
        }
        Err(RenderError::NotFound {
            name: name.to_string(),
        })
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RenderError> {
    let load_err = |source| RenderError::Load {
        path: dir.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(load_err)? {
        let path = entry.map_err(load_err)?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

fn template_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let name = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    ENGINE_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .map_or_else(|| name.clone(), str::to_string)
}
