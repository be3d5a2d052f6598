pub mod deny_list;
pub mod fingerprint;
pub mod screen_model;
