use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct SignupDescriptor {
    pub name: String,
    pub email: String,
    pub password: String,
    pub division: String,
    pub roll: u32,
    pub prn: String,
    pub batch: u32,
}

#[derive(Serialize, Deserialize)]
pub struct LoginDescriptor {
    /// Email of the student record, or a mess account username.
    pub account: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct ChangePasswordDescriptor {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize, Deserialize)]
pub struct ResetPasswordDescriptor {
    /// Must match the registered record's email.
    pub email: String,
    pub new_password: String,
}
