pub mod clock;
pub mod fixture_source;
pub mod messages;
pub mod predictions;
pub mod scheduler;
pub mod whatsapp;
