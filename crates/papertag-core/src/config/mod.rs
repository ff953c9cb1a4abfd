use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::DEFAULT_ID_PREFIX;
use crate::cooccurrence::{DEFAULT_MIN_COOCCURRENCE, DEFAULT_PRIMARY_CATEGORY};
use crate::error::{PapertagError, Result};
use crate::fs::{CONFIG_FILE, DocumentFs};
use crate::normalize::NormalizationPolicy;

mod env;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PapertagConfig {
    pub normalization: NormalizationPolicy,
    pub min_cooccurrence: usize,
    pub primary_category: String,
    pub id_prefix: String,
}

impl Default for PapertagConfig {
    fn default() -> Self {
        Self {
            normalization: NormalizationPolicy::default(),
            min_cooccurrence: DEFAULT_MIN_COOCCURRENCE,
            primary_category: DEFAULT_PRIMARY_CATEGORY.to_string(),
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
        }
    }
}

// Every key is optional; unset keys keep the previous layer's value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    reject_unknown: Option<bool>,
    min_cooccurrence: Option<usize>,
    primary_category: Option<String>,
    id_prefix: Option<String>,
}

impl PapertagConfig {
    /// Defaults, then `papertag.toml` under the root, then `PAPERTAG_*`
    /// environment variables.
    pub fn load(fs: &DocumentFs) -> Result<Self> {
        let mut config = Self::default();
        if let Some(raw) = fs.read_optional(CONFIG_FILE)? {
            let path = fs.resolve(CONFIG_FILE)?;
            let file = toml::from_str::<FileConfig>(&raw)
                .map_err(|err| PapertagError::malformed(&path, err))?;
            config.apply_file(file)?;
        }
        config.apply_env_with(&env::process_env);
        debug!(?config, "resolved configuration");
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) -> Result<()> {
        if let Some(reject_unknown) = file.reject_unknown {
            self.normalization.reject_unknown = reject_unknown;
        }
        if let Some(min_cooccurrence) = file.min_cooccurrence {
            if min_cooccurrence == 0 {
                return Err(PapertagError::Validation(
                    "min_cooccurrence must be at least 1".to_string(),
                ));
            }
            self.min_cooccurrence = min_cooccurrence;
        }
        if let Some(primary_category) = non_empty(file.primary_category) {
            self.primary_category = primary_category;
        }
        if let Some(id_prefix) = non_empty(file.id_prefix) {
            self.id_prefix = id_prefix;
        }
        Ok(())
    }

    pub(crate) fn apply_env_with(&mut self, lookup: &dyn Fn(&str) -> Option<String>) {
        if let Some(reject_unknown) =
            env::parse_bool(lookup(env::ENV_REJECT_UNKNOWN).as_deref())
        {
            self.normalization.reject_unknown = reject_unknown;
        }
        if let Some(min_cooccurrence) = env::read_usize(lookup, env::ENV_MIN_COOCCURRENCE, 1) {
            self.min_cooccurrence = min_cooccurrence;
        }
        if let Some(primary_category) = env::read_non_empty(lookup, env::ENV_PRIMARY_CATEGORY) {
            self.primary_category = primary_category;
        }
        if let Some(id_prefix) = env::read_non_empty(lookup, env::ENV_ID_PREFIX) {
            self.id_prefix = id_prefix;
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
