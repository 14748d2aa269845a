//! Storage keys shared with the browser popup.
//!
//! The popup writes these names into its local storage; the engine reads and writes the
//! same names so that an exported popup storage can be opened directly.

/// JSON array of `{host?, key, value, enabled}` objects.
pub const RULES: &str = "rules";

/// Legacy endpoint key holding a bare port number.
pub const PORT: &str = "port";

/// Endpoint key holding a full base URL.
pub const API_BASE_URL: &str = "apiBaseURL";

/// Enabled state applied to newly created rules (`"true"`/`"false"` or a JSON boolean).
pub const DEFAULT_CHECKED: &str = "defaultChecked";
