//! Template group definitions
//!
//! A group bundles the named templates for one operation type. It is read
//! from YAML:
//!
//! ```yaml
//! operationType: USER_OPERATIONS
//! templates:
//!   - name: searchByUserId
//!     baseQuery:
//!       query:
//!         term:
//!           userId: "{{userId}}"
//!   - name: multiSearchUsers
//!     queryType: msearch
//!     baseQuery: { ... }
//! ```

use std::collections::HashSet;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::dispatch::collection_for;
use crate::error::{EngineError, Result};

/// The backend operation shape a template targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum QueryKind {
    #[default]
    Search,
    Aggregation,
    MultiSearch,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::Search => "search",
            QueryKind::Aggregation => "aggregation",
            QueryKind::MultiSearch => "msearch",
        }
    }
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised `queryType` string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownQueryKind(pub String);

impl FromStr for QueryKind {
    type Err = UnknownQueryKind;

    /// Case-insensitive; `agg` is an alias of `aggregation`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "search" => Ok(QueryKind::Search),
            "agg" | "aggregation" => Ok(QueryKind::Aggregation),
            "msearch" => Ok(QueryKind::MultiSearch),
            _ => Err(UnknownQueryKind(s.to_string())),
        }
    }
}

/// One named template within a group
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTemplate {
    pub name: String,
    pub query_kind: QueryKind,
    /// Un-rendered query skeleton
    pub base_query: Map<String, Value>,
}

impl NamedTemplate {
    /// Serialize the base query to template text
    ///
    /// Keys come out sorted, so the same group always yields the same text.
    pub fn base_query_text(&self) -> String {
        Value::Object(self.base_query.clone()).to_string()
    }
}

/// All templates for one operation type
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateGroup {
    pub operation_type: String,
    pub templates: Vec<NamedTemplate>,
    /// Reserved; carried but not interpreted
    pub response_processor: Option<String>,
    /// Explicit backend collection, overriding the naming convention
    pub collection: Option<String>,
}

/// YAML structure for deserializing groups
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct YamlGroup {
    operation_type: Option<String>,
    templates: Vec<YamlTemplate>,
    response_processor: Option<String>,
    collection: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct YamlTemplate {
    name: String,
    query_type: Option<String>,
    base_query: Map<String, Value>,
}

impl TemplateGroup {
    /// Parse and validate a group definition loaded for `operation_type`
    pub fn from_yaml(operation_type: &str, content: &str) -> Result<Self> {
        let parsed: YamlGroup = serde_yaml::from_str(content)
            .map_err(|e| EngineError::config(operation_type, e.to_string()))?;

        if let Some(declared) = &parsed.operation_type {
            if declared != operation_type {
                tracing::warn!(
                    operation_type = operation_type,
                    declared = %declared,
                    "Template group declares a different operationType than it was loaded for"
                );
            }
        }

        let mut seen = HashSet::new();
        let mut templates = Vec::with_capacity(parsed.templates.len());
        for raw in parsed.templates {
            if raw.name.trim().is_empty() {
                return Err(EngineError::config(
                    operation_type,
                    "template with an empty name",
                ));
            }

            let query_kind = match &raw.query_type {
                None => QueryKind::default(),
                Some(kind) => kind.parse::<QueryKind>().map_err(|UnknownQueryKind(kind)| {
                    EngineError::UnsupportedQueryKind {
                        kind,
                        template: raw.name.clone(),
                    }
                })?,
            };

            if !seen.insert(raw.name.clone()) {
                tracing::warn!(
                    operation_type = operation_type,
                    template = %raw.name,
                    "Duplicate template name; the first definition wins"
                );
            }

            templates.push(NamedTemplate {
                name: raw.name,
                query_kind,
                base_query: raw.base_query,
            });
        }

        Ok(Self {
            operation_type: operation_type.to_string(),
            templates,
            response_processor: parsed.response_processor,
            collection: parsed.collection,
        })
    }

    /// First template with this name
    pub fn find(&self, name: &str) -> Option<&NamedTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Backend collection queried by this group
    pub fn collection(&self) -> String {
        match &self.collection {
            Some(collection) => collection.clone(),
            None => collection_for(&self.operation_type),
        }
    }

    /// Template names in definition order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.name.as_str())
    }
}
