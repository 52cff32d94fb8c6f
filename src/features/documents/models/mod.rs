mod document_kind;

pub use document_kind::DocumentKind;
