use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Abstract socket name the HAL service listens on.
pub const DEFAULT_SOCKET_NAME: &str = "bluez_hal_socket";

/// Address of the HAL control socket.
///
/// Textual form: `@name` selects the Linux abstract namespace, anything else
/// is taken as a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Abstract-namespace socket (Linux only). The name excludes the leading NUL.
    Abstract(String),
    /// Filesystem-path socket.
    Path(PathBuf),
}

impl Endpoint {
    /// Abstract-namespace endpoint.
    pub fn abstract_name(name: impl Into<String>) -> Self {
        Self::Abstract(name.into())
    }

    /// Filesystem endpoint.
    pub fn path(path: impl AsRef<Path>) -> Self {
        Self::Path(path.as_ref().to_path_buf())
    }

    /// Returns true for abstract-namespace endpoints.
    pub fn is_abstract(&self) -> bool {
        matches!(self, Self::Abstract(_))
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::Abstract(DEFAULT_SOCKET_NAME.to_string())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abstract(name) => write!(f, "@{name}"),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FromStr for Endpoint {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.strip_prefix('@') {
            Some(name) => Self::Abstract(name.to_string()),
            None => Self::Path(PathBuf::from(s)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_abstract_hal_socket() {
        let endpoint = Endpoint::default();
        assert!(endpoint.is_abstract());
        assert_eq!(endpoint.to_string(), "@bluez_hal_socket");
    }

    #[test]
    fn parses_abstract_and_path_forms() {
        assert_eq!(
            "@hal-test".parse::<Endpoint>().unwrap(),
            Endpoint::abstract_name("hal-test")
        );
        assert_eq!(
            "/tmp/hal.sock".parse::<Endpoint>().unwrap(),
            Endpoint::path("/tmp/hal.sock")
        );
    }

    #[test]
    fn display_roundtrips_through_from_str() {
        for text in ["@x", "/run/bthal/hal.sock", "relative.sock"] {
            let endpoint: Endpoint = text.parse().unwrap();
            assert_eq!(endpoint.to_string(), text);
        }
    }
}
