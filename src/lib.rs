//! Query Template Engine - parameterised search queries from logic-less templates
//!
//! This library loads query templates, binds caller parameters into a render
//! context, renders the template text and hands the resulting payload to a
//! search backend supplied by the host.
//!
//! # Example
//!
//! ```rust
//! use query_template_engine::{
//!     BackendError, BackendExecutor, BackendRequest, EngineConfig, MemorySource, QueryEngine,
//! };
//! use serde_json::{json, Value};
//!
//! struct Echo;
//!
//! impl BackendExecutor for Echo {
//!     fn execute(&self, request: &BackendRequest) -> Result<Value, BackendError> {
//!         Ok(json!({ "path": request.path(), "body": request.body }))
//!     }
//! }
//!
//! let source = MemorySource::new().with(
//!     "query-templates/user_operations.yml",
//!     "templates:\n  - name: searchByUserId\n    baseQuery:\n      query:\n        term:\n          userId: \"{{userId}}\"\n",
//! );
//! let engine = QueryEngine::new(source, EngineConfig::default(), Echo);
//!
//! let response = engine
//!     .execute_template("USER_OPERATIONS", "searchByUserId", &json!({ "userId": 1 }))
//!     .unwrap();
//! assert_eq!(response["path"], "/user/_search");
//! assert_eq!(response["body"], r#"{"query":{"term":{"userId":"1"}}}"#);
//! ```

pub mod binder;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod parser;
pub mod renderer;
pub mod template;

use std::sync::Arc;

use serde_json::Value;

pub use binder::{bind, NoParams, QueryParams};
pub use config::{ConfigFileError, EngineConfig, TemplatePaths};
pub use dispatch::{
    collection_for, BackendError, BackendExecutor, BackendRequest, Dispatcher, Endpoint, Method,
};
pub use error::{EngineError, ParseError, Result};
pub use parser::{parse, Template};
pub use renderer::{EscapeMode, RenderConfig, RenderContext, Renderer};
pub use template::{
    resolve_query, FsSource, GroupCache, MemorySource, NamedTemplate, QueryKind, ResolvedQuery,
    ResourceSource, SourceError, TemplateGroup, TemplateStore,
};

/// Entry point tying the store, renderer and dispatcher together
#[derive(Debug, Clone)]
pub struct QueryEngine<E> {
    store: TemplateStore,
    renderer: Renderer,
    dispatcher: Dispatcher<E>,
}

impl<E: BackendExecutor> QueryEngine<E> {
    /// Create an engine reading templates from `source`
    pub fn new(source: impl ResourceSource + 'static, config: EngineConfig, executor: E) -> Self {
        Self::from_parts(
            TemplateStore::new(source, config.templates),
            Renderer::new(config.render),
            executor,
        )
    }

    /// Create an engine from an existing store, e.g. one sharing a group cache
    pub fn from_parts(store: TemplateStore, renderer: Renderer, executor: E) -> Self {
        Self {
            store,
            renderer,
            dispatcher: Dispatcher::new(executor),
        }
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn cache(&self) -> &Arc<GroupCache> {
        self.store.cache()
    }

    pub fn dispatcher(&self) -> &Dispatcher<E> {
        &self.dispatcher
    }

    /// Render an ad-hoc template without sending it
    pub fn render<P: QueryParams + ?Sized>(
        &self,
        schema_name: &str,
        template_name: &str,
        params: &P,
    ) -> Result<String> {
        let text = self.store.load_template(schema_name, template_name)?;
        let ctx = bind(params)?;
        self.renderer.render_named(template_name, &text, &ctx)
    }

    /// Render an ad-hoc template and run it as a search against `schema_name`
    pub fn search<P: QueryParams + ?Sized>(
        &self,
        schema_name: &str,
        template_name: &str,
        params: &P,
    ) -> Result<Value> {
        self.run_adhoc(QueryKind::Search, schema_name, template_name, params)
    }

    /// Render an ad-hoc template and run it as an aggregation against `schema_name`
    pub fn aggregate<P: QueryParams + ?Sized>(
        &self,
        schema_name: &str,
        template_name: &str,
        params: &P,
    ) -> Result<Value> {
        self.run_adhoc(QueryKind::Aggregation, schema_name, template_name, params)
    }

    /// Render an ad-hoc template and run it as a multi-search against `schema_name`
    ///
    /// The rendered text must already be in newline-delimited multi-search form.
    pub fn msearch<P: QueryParams + ?Sized>(
        &self,
        schema_name: &str,
        template_name: &str,
        params: &P,
    ) -> Result<Value> {
        self.run_adhoc(QueryKind::MultiSearch, schema_name, template_name, params)
    }

    /// Resolve and render a grouped template without sending it
    pub fn resolve<P: QueryParams + ?Sized>(
        &self,
        operation_type: &str,
        template_name: &str,
        params: &P,
    ) -> Result<ResolvedQuery> {
        resolve_query(
            &self.store,
            &self.renderer,
            operation_type,
            template_name,
            params,
        )
    }

    /// Resolve a grouped template and dispatch it per its query kind
    pub fn execute_template<P: QueryParams + ?Sized>(
        &self,
        operation_type: &str,
        template_name: &str,
        params: &P,
    ) -> Result<Value> {
        let query = self.resolve(operation_type, template_name, params)?;
        self.dispatcher.dispatch(&query)
    }

    fn run_adhoc<P: QueryParams + ?Sized>(
        &self,
        kind: QueryKind,
        schema_name: &str,
        template_name: &str,
        params: &P,
    ) -> Result<Value> {
        let body = self.render(schema_name, template_name, params)?;
        let request = BackendRequest::new(schema_name, kind.endpoint(), body);
        self.dispatcher.send(&request)
    }
}
