mod document_service;
mod docx_renderer;

pub use document_service::DocumentService;
pub use docx_renderer::DocxRenderer;
