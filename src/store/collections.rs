// src/store/collections.rs — Environment-scoped collection names
//
// The database holds two parallel sets of collections distinguished by a
// name suffix. Which set is used is decided once at startup from config
// and never changes for the life of the process.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn suffix(&self) -> &'static str {
        match self {
            Environment::Development => "_development",
            Environment::Production => "_production",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved collection names for one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub users: String,
    pub kid_profiles: String,
    pub stories: String,
    pub story_pages: String,
}

const BASE_NAMES: [&str; 4] = ["users", "kid_profiles", "stories", "story_pages"];

impl Collections {
    pub fn for_env(env: Environment) -> Self {
        let suffix = env.suffix();
        Self {
            users: format!("{}{suffix}", BASE_NAMES[0]),
            kid_profiles: format!("{}{suffix}", BASE_NAMES[1]),
            stories: format!("{}{suffix}", BASE_NAMES[2]),
            story_pages: format!("{}{suffix}", BASE_NAMES[3]),
        }
    }

    /// All resolved names, in declaration order. Used by the `collections`
    /// diagnostic subcommand.
    pub fn all(&self) -> [&str; 4] {
        [
            &self.users,
            &self.kid_profiles,
            &self.stories,
            &self.story_pages,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_development_suffix() {
        let c = Collections::for_env(Environment::Development);
        assert_eq!(c.users, "users_development");
        assert_eq!(c.kid_profiles, "kid_profiles_development");
        assert_eq!(c.stories, "stories_development");
        assert_eq!(c.story_pages, "story_pages_development");
    }

    #[test]
    fn test_production_suffix() {
        let c = Collections::for_env(Environment::Production);
        assert_eq!(c.users, "users_production");
        assert_eq!(c.story_pages, "story_pages_production");
    }

    #[test]
    fn test_all_lists_every_collection() {
        let c = Collections::for_env(Environment::Development);
        assert_eq!(c.all().len(), 4);
        assert!(c.all().iter().all(|n| n.ends_with("_development")));
    }

    #[test]
    fn test_environment_deserializes_lowercase() {
        #[derive(serde::Deserialize)]
        struct Wrap {
            env: Environment,
        }
        let w: Wrap = toml::from_str("env = \"production\"").unwrap();
        assert_eq!(w.env, Environment::Production);
    }
}
