pub mod mask;
pub mod qr_payload;
pub mod time;
pub mod token;
