//! Route paths.

pub const POST_AUTH_LOGIN: &str = "/api/auth/login";
pub const POST_AUTH_REGISTER: &str = "/api/auth/register";
pub const GET_AUTH_ME: &str = "/api/auth/me";
pub const GET_USERS: &str = "/api/users";
pub const GET_USERS_ID: &str = "/api/users/{id}";
