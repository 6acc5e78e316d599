/// Decoding of stored documents into typed records
pub mod document_tests;
