//! Grouped template resolution - turns (operation type, template name, params)
//! into a rendered query ready for dispatch

use crate::binder::{bind, QueryParams};
use crate::error::{EngineError, Result};
use crate::renderer::Renderer;

use super::group::QueryKind;
use super::store::TemplateStore;

/// A grouped template rendered against its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub operation_type: String,
    pub template_name: String,
    /// Backend collection the query targets
    pub collection: String,
    pub kind: QueryKind,
    /// Rendered payload text
    pub body: String,
}

/// Resolve and render a named template from an operation type's group
///
/// The group is loaded through the store's cache. An unknown template name
/// fails with `NotFound` and leaves the cached group as it was.
pub fn resolve_query<P: QueryParams + ?Sized>(
    store: &TemplateStore,
    renderer: &Renderer,
    operation_type: &str,
    template_name: &str,
    params: &P,
) -> Result<ResolvedQuery> {
    let group = store.load_group(operation_type)?;
    let template = group
        .find(template_name)
        .ok_or_else(|| EngineError::not_found("template", template_name))?;

    let ctx = bind(params)?;
    let body = renderer.render_named(template_name, &template.base_query_text(), &ctx)?;
    let collection = group.collection();

    tracing::debug!(
        operation_type = operation_type,
        template = template_name,
        kind = %template.query_kind,
        collection = %collection,
        "Resolved grouped template"
    );

    Ok(ResolvedQuery {
        operation_type: operation_type.to_string(),
        template_name: template_name.to_string(),
        collection,
        kind: template.query_kind,
        body,
    })
}
