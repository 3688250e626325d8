pub mod coordinator_service;
pub mod export_service;
pub mod qr_service;
pub mod questionnaire_service;
pub mod result_service;
pub mod scan_service;
pub mod session_service;
