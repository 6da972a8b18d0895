//! Style catalog and the per-pass marker mapping table.

pub mod catalog;
pub mod mapping;

pub use catalog::{StyleCatalog, StyleContext, StyleFunction, StyleInfo, StyleKind, Structure};
pub use mapping::{
    end_marker, fallback_marker, AnnotationField, MarkerMap, MarkerRole, PictureField,
    ResolvedMarker, StyleProxy,
};
