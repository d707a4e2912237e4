use std::path::PathBuf;

use anyhow::bail;

pub const DEFAULT_DATA_PATH: &str = "dengue_departamental_semanal_con_fecha.csv";
pub const DEFAULT_HORIZON: usize = 4;

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_path: PathBuf,
    /// Forecast horizon in weeks.
    pub horizon: usize,
}

impl Settings {
    pub fn new(data_path: PathBuf, horizon: usize) -> anyhow::Result<Self> {
        let settings = Self { data_path, horizon };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.horizon == 0 {
            bail!("horizon must be at least one week");
        }
        if self.data_path.as_os_str().is_empty() {
            bail!("data path must not be empty");
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            horizon: DEFAULT_HORIZON,
        }
    }
}
