pub mod auth;
pub mod user;

pub use auth::{
    ErrorBody, LoginRequest, LoginResponse, RefreshResponse, RegisterRequest, RegisterResponse,
};
pub use user::{User, UserProfile};
