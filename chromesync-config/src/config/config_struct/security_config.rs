use serde::Serialize;

/// Handling of sensitive data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityConfig {
    pub encrypt_temp_files: bool,
    pub require_auth_for_sensitive_ops: bool,
    /// Overwrite temp files before removing them
    pub secure_delete_temp_files: bool,
    /// Write sensitive values to the log unmasked
    pub log_sensitive_operations: bool,
}

impl SecurityConfig {
    pub const FIELDS: &'static [&'static str] = &[
        "encrypt_temp_files",
        "require_auth_for_sensitive_ops",
        "secure_delete_temp_files",
        "log_sensitive_operations",
    ];
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            encrypt_temp_files: true,
            require_auth_for_sensitive_ops: true,
            secure_delete_temp_files: true,
            log_sensitive_operations: false,
        }
    }
}
