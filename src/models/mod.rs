pub mod activity;
pub mod answer;
pub mod qr_challenge;
pub mod question;
pub mod recommendation;
pub mod screen;
pub mod submission;
