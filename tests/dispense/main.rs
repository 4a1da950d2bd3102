mod admin;
mod common;
