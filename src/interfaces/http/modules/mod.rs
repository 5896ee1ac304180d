pub mod authors;
pub mod health;
pub mod request_id;
