pub mod jwt;
pub mod keys;
pub mod otp;
