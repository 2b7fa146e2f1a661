use std::fmt;

/// Names starting with this character are reserved for the router itself.
pub const RESERVED_PREFIX: char = '_';

/// Operation names every router exposes; children may not shadow them.
pub const RESERVED_NAMES: &[&str] = &[
    "attach",
    "bound_name",
    "clear_config_cache",
    "config",
    "endpoint",
    "get_cookies",
    "get_headers",
    "is_bound",
    "parent",
    "resolve",
    "route",
    "route_names",
    "router",
    "routes",
    "set_config",
];

/// A validated route name.
/// Rules:
/// 1. Must not be empty or start with [`RESERVED_PREFIX`].
/// 2. Must not be one of [`RESERVED_NAMES`].
/// 3. Characters must be alphanumeric, `_` or `-` (dots separate lookup paths).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteName(String);

#[derive(Debug, PartialEq, Eq)]
pub enum RouteNameError {
    Empty,
    ReservedPrefix(char),
    ReservedName(String),
    InvalidCharacter(char),
}

impl fmt::Display for RouteNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "route name cannot be empty"),
            Self::ReservedPrefix(c) => write!(f, "route names cannot start with '{}'", c),
            Self::ReservedName(name) => {
                write!(f, "'{}' collides with a built-in router operation", name)
            }
            Self::InvalidCharacter(c) => write!(f, "route name contains invalid character: '{}'", c),
        }
    }
}

impl std::error::Error for RouteNameError {}

impl RouteName {
    /// Creates a new RouteName from any type that can turn into a String.
    pub fn new<S: Into<String>>(name: S) -> Result<Self, RouteNameError> {
        let s = name.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    fn validate(s: &str) -> Result<(), RouteNameError> {
        match s.chars().next() {
            None => return Err(RouteNameError::Empty),
            Some(c) if c == RESERVED_PREFIX => return Err(RouteNameError::ReservedPrefix(c)),
            _ => {}
        }

        if RESERVED_NAMES.contains(&s) {
            return Err(RouteNameError::ReservedName(s.to_string()));
        }

        if let Some(c) = s.chars().find(|c| !c.is_alphanumeric() && *c != '_' && *c != '-') {
            return Err(RouteNameError::InvalidCharacter(c));
        }

        Ok(())
    }

    /// Returns a string slice reference
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RouteName> for String {
    fn from(name: RouteName) -> Self {
        name.0
    }
}

impl TryFrom<String> for RouteName {
    type Error = RouteNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RouteName {
    type Error = RouteNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
