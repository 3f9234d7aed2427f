use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{BikeshareError, Result};
use crate::filters::City;

/// Locates the backing CSV file for each city.
///
/// Files default to `chicago.csv`, `new_york_city.csv` and `washington.csv`
/// inside the data directory. Overrides are a plain JSON object, given
/// inline or stored in a file:
/// ```json
/// {
///   "chicago": "chicago_2017.csv",
///   "new york city": "/srv/bikeshare/nyc.csv"
/// }
/// ```
/// Relative override paths resolve against the data directory.
#[derive(Debug, Clone)]
pub struct DataConfig {
    data_dir: PathBuf,
    overrides: HashMap<City, PathBuf>,
}

impl DataConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            overrides: HashMap::new(),
        }
    }

    /// Applies city file overrides from a command-line value: an inline JSON
    /// object when it starts with `{`, otherwise the path of a JSON file.
    pub fn with_city_files_arg(self, value: &str) -> Result<Self> {
        let value = value.trim();
        if value.starts_with('{') {
            self.with_city_files_json(value)
        } else {
            self.with_city_files(Path::new(value))
        }
    }

    /// Loads city file overrides from a JSON file at `path`.
    pub fn with_city_files(self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BikeshareError::Config(format!("cannot read city file map {}: {e}", path.display()))
        })?;
        self.with_city_files_json(&content)
    }

    /// Applies city file overrides from a JSON object string.
    pub fn with_city_files_json(mut self, json: &str) -> Result<Self> {
        let entries: HashMap<String, String> = serde_json::from_str(json)
            .map_err(|e| BikeshareError::Config(format!("invalid city file map: {e}")))?;

        for (key, file) in entries {
            let city: City = key.parse().map_err(|_| {
                BikeshareError::Config(format!("unknown city in city file map: {key:?}"))
            })?;
            debug!(city = %city, file = %file, "City file override");
            self.overrides.insert(city, PathBuf::from(file));
        }
        Ok(self)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the path of the CSV file backing `city`.
    pub fn path_for(&self, city: City) -> PathBuf {
        match self.overrides.get(&city) {
            Some(file) if file.is_absolute() => file.clone(),
            Some(file) => self.data_dir.join(file),
            None => self.data_dir.join(city.default_file()),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = DataConfig::new("/data");
        assert_eq!(
            config.path_for(City::Chicago),
            PathBuf::from("/data/chicago.csv")
        );
        assert_eq!(
            config.path_for(City::NewYorkCity),
            PathBuf::from("/data/new_york_city.csv")
        );
        assert_eq!(
            config.path_for(City::Washington),
            PathBuf::from("/data/washington.csv")
        );
    }

    #[test]
    fn test_overrides_relative_and_absolute() {
        let config = DataConfig::new("/data")
            .with_city_files_json(r#"{"Chicago": "chi.csv", "washington": "/tmp/dc.csv"}"#)
            .unwrap();
        assert_eq!(config.path_for(City::Chicago), PathBuf::from("/data/chi.csv"));
        assert_eq!(config.path_for(City::Washington), PathBuf::from("/tmp/dc.csv"));
        assert_eq!(
            config.path_for(City::NewYorkCity),
            PathBuf::from("/data/new_york_city.csv")
        );
    }

    #[test]
    fn test_unknown_city_rejected() {
        let err = DataConfig::new(".")
            .with_city_files_json(r#"{"boston": "boston.csv"}"#)
            .unwrap_err();
        assert!(matches!(err, BikeshareError::Config(_)));
        assert!(err.to_string().contains("boston"));
    }

    #[test]
    fn test_invalid_json_rejected() {
        let err = DataConfig::new(".")
            .with_city_files_json("[1, 2]")
            .unwrap_err();
        assert!(matches!(err, BikeshareError::Config(_)));
    }

    #[test]
    fn test_city_files_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let map = dir.path().join("cities.json");
        std::fs::write(&map, r#"{"new york city": "nyc.csv"}"#).unwrap();

        let config = DataConfig::new(dir.path()).with_city_files(&map).unwrap();
        assert_eq!(config.path_for(City::NewYorkCity), dir.path().join("nyc.csv"));

        let missing = DataConfig::new(dir.path()).with_city_files(&dir.path().join("nope.json"));
        assert!(missing.is_err());
    }

    #[test]
    fn test_city_files_arg_inline_json() {
        let config = DataConfig::new("/data")
            .with_city_files_arg(r#"  {"washington": "washington.csv"} "#)
            .unwrap();
        assert_eq!(
            config.path_for(City::Washington),
            PathBuf::from("/data/washington.csv")
        );

        let err = DataConfig::new("/data")
            .with_city_files_arg(r#"{"washington": 3}"#)
            .unwrap_err();
        assert!(err.to_string().contains("invalid city file map"));
    }

    #[test]
    fn test_city_files_arg_path() {
        let dir = tempfile::tempdir().unwrap();
        let map = dir.path().join("cities.json");
        std::fs::write(&map, r#"{"chicago": "chi.csv"}"#).unwrap();

        let config = DataConfig::new(dir.path())
            .with_city_files_arg(map.to_str().unwrap())
            .unwrap();
        assert_eq!(config.path_for(City::Chicago), dir.path().join("chi.csv"));

        let err = DataConfig::new(dir.path())
            .with_city_files_arg("missing.json")
            .unwrap_err();
        assert!(err.to_string().contains("cannot read city file map"));
    }
}
