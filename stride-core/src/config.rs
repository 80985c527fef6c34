//! Loading and saving configurations.
use anyhow::Result;
use log::info;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// A configuration stored as a YAML file.
pub trait ConfigFile: Serialize + DeserializeOwned {
    /// Constructs the configuration from a YAML file.
    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let config = serde_yaml::from_reader(rdr)?;
        info!("Load config from {:?}", path);
        Ok(config)
    }

    /// Saves the configuration as a YAML file.
    fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
