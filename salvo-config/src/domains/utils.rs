//! Default value helpers shared by the configuration domains

/// Default functions for serde
pub fn default_true() -> bool {
    true
}

pub fn default_false() -> bool {
    false
}

pub fn default_elevate_program() -> String {
    "sudo".to_string()
}
