pub mod api_errors;
pub mod gateway_http;
pub mod sessions;
pub mod verify;
pub mod webhook;
