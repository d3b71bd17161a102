// Environment variable loading

use crate::{ConfigError, Result};
use std::env;
use std::path::Path;

/// Prefix for bridge settings in the process environment.
pub const ENV_PREFIX: &str = "SHIBCAS";

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Loader for `SHIBCAS_*` variables.
    pub fn shibcas() -> Self {
        Self::new(Some(ENV_PREFIX.to_string()))
    }

    /// Load matching variables from the process environment
    pub fn load(&self) -> Vec<(String, String)> {
        self.filter(env::vars())
    }

    /// Load matching entries from a `.env` file without touching the process
    /// environment. A missing file is not an error unless `path` was given.
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<Vec<(String, String)>> {
        let iter = match path {
            Some(path) => dotenvy::from_path_iter(path)
                .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))?,
            None => match dotenvy::dotenv_iter() {
                Ok(iter) => iter,
                Err(e) if e.not_found() => return Ok(Vec::new()),
                Err(e) => return Err(ConfigError::LoadError(e.to_string())),
            },
        };

        let mut vars = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| ConfigError::ParseError(e.to_string()))?;
            vars.push((key, value));
        }

        Ok(self.filter(vars))
    }

    /// Keep the `(key, value)` pairs that carry the prefix
    pub fn filter<I>(&self, vars: I) -> Vec<(String, String)>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        vars.into_iter()
            .filter(|(key, _)| match self.prefix {
                Some(ref prefix) => key
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('_')),
                None => true,
            })
            .collect()
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::shibcas()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_filter_by_prefix() {
        let loader = EnvLoader::shibcas();
        let kept = loader.filter(vars(&[
            ("SHIBCAS_SERVER_NAME", "idp.example.edu"),
            ("SHIBCASX_OTHER", "no"),
            ("PATH", "/usr/bin"),
        ]));

        assert_eq!(kept, vars(&[("SHIBCAS_SERVER_NAME", "idp.example.edu")]));
    }

    #[test]
    fn test_no_prefix_keeps_everything() {
        let loader = EnvLoader::new(None);
        assert_eq!(loader.filter(vars(&[("A", "1"), ("B", "2")])).len(), 2);
    }

    #[test]
    fn test_explicit_dotenv_must_exist() {
        let loader = EnvLoader::shibcas();
        assert!(
            loader
                .load_dotenv(Some(Path::new("/nonexistent/shibcas/.env")))
                .is_err()
        );
    }
}
