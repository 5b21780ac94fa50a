pub mod document_repo;
pub mod error;
