//! Test doubles for the external services the backend talks to.

pub mod resend;
