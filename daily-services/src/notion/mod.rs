pub mod client;
pub mod query;

pub use client::{NotionClient, WorkspaceApi};
pub use query::{DatabaseQuery, FieldKind, FieldSpec, PropertyFilter, Sort, SortDirection};
