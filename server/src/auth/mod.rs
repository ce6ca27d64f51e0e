pub mod handler;

// vim: ts=4
