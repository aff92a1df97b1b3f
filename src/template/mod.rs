//! Template storage and grouped template resolution
//!
//! Two kinds of templates exist:
//!
//! - ad-hoc templates, plain text files addressed by `(schema, name)` and
//!   read on every use;
//! - template groups, one YAML file per operation type bundling named
//!   templates, parsed once and cached for the life of the store.
//!
//! # Example
//!
//! ```yaml
//! # query-templates/user_operations.yml
//! operationType: USER_OPERATIONS
//! templates:
//!   - name: searchByUserId
//!     baseQuery:
//!       query:
//!         term:
//!           userId: "{{userId}}"
//! ```

mod group;
mod resolver;
mod source;
mod store;

pub use group::{NamedTemplate, QueryKind, TemplateGroup, UnknownQueryKind};
pub use resolver::{resolve_query, ResolvedQuery};
pub use source::{FsSource, MemorySource, ResourceSource, SourceError};
pub use store::{GroupCache, TemplateStore};
