//! Sandboxed path template evaluation.
//!
//! Templates use the Jinja syntax and can only see the `document` object along with
//! the builtin and registered filters. There are no loaders, so templates cannot
//! include or import anything.

use crate::{
    core::context::{DateValue, DocumentContext},
    error::{DocpathErr, DocpathError},
};
use minijinja::{context, Environment, Error, ErrorKind, Template, UndefinedBehavior, Value};
use std::fmt::Write;
use uuid::Uuid;

/// Renders path templates. Cheap to clone, the environment is shared.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    env: Environment<'static>,
}

impl Default for PathTemplate {
    fn default() -> Self {
        Self::new()
    }
}

impl PathTemplate {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_filter("datefmt", datefmt);
        Self { env }
    }

    /// Render `template` against the document. The output is trimmed.
    ///
    /// * `template`: User provided path template.
    /// * `document`: Document snapshot, available as `document` in the template.
    pub fn render(&self, template: &str, document: &DocumentContext) -> Result<String, DocpathError> {
        let tmpl = self.compile(template)?;
        render_compiled(&tmpl, document)
    }

    /// Compile `template` once and render it against every document, in order.
    /// Stops at the first failing document.
    ///
    /// * `template`: User provided path template.
    /// * `documents`: Document snapshots.
    pub fn render_all(
        &self,
        template: &str,
        documents: &[DocumentContext],
    ) -> Result<Vec<String>, DocpathError> {
        let tmpl = self.compile(template)?;
        documents
            .iter()
            .map(|document| render_compiled(&tmpl, document))
            .collect()
    }

    fn compile<'a>(&'a self, template: &'a str) -> Result<Template<'a, 'a>, DocpathError> {
        self.env
            .template_from_str(template)
            .map_err(|e| DocpathError::new(file!(), line!(), column!(), classify(e)))
    }
}

fn render_compiled(
    tmpl: &Template<'_, '_>,
    document: &DocumentContext,
) -> Result<String, DocpathError> {
    let ctx = context! { document => Value::from_object(document.clone()) };

    let rendered = tmpl
        .render(ctx)
        .map_err(|e| DocpathError::new(file!(), line!(), column!(), classify(e)))?;

    Ok(rendered.trim().to_string())
}

/// Render a template for a document without any custom fields.
///
/// * `title`: Document title.
/// * `id`: Document ID.
/// * `template`: Path template.
pub fn evaluate(title: &str, id: Uuid, template: &str) -> Result<String, DocpathError> {
    PathTemplate::new().render(template, &DocumentContext::new(id, title, vec![]))
}

/// Format a date with a strftime pattern, e.g. `{{ document.cf['Date'] | datefmt('%Y') }}`.
fn datefmt(value: Value, format: &str) -> Result<String, Error> {
    let Some(date) = value.downcast_object_ref::<DateValue>() else {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("datefmt expects a date, got {}", value.kind()),
        ));
    };

    let mut out = String::new();
    write!(out, "{}", date.0.format(format)).map_err(|_| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("invalid date format '{format}'"),
        )
    })?;

    Ok(out)
}

/// Map engine errors to the three template error classes.
fn classify(error: Error) -> DocpathErr {
    let message = match error.detail() {
        Some(detail) => format!("{}; {detail}", error.kind()),
        None => error.to_string(),
    };

    match error.kind() {
        ErrorKind::SyntaxError | ErrorKind::BadEscape => DocpathErr::TemplateSyntax(message),
        ErrorKind::UndefinedError
        | ErrorKind::UnknownFilter
        | ErrorKind::UnknownFunction
        | ErrorKind::UnknownTest
        | ErrorKind::UnknownMethod
        | ErrorKind::TemplateNotFound
        | ErrorKind::BadInclude => DocpathErr::TemplateSecurity(message),
        _ => DocpathErr::TemplateType(message),
    }
}
