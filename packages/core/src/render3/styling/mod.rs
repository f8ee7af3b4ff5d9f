//! Class and style bindings

pub mod class_differ;
pub mod reconcile;
pub mod style_binding_list;
pub mod style_differ;
