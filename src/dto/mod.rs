pub mod pad_dto;
pub mod phone_dto;
pub mod report_dto;
pub mod session_dto;
