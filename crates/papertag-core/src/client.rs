use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::catalog::CatalogEngine;
use crate::config::PapertagConfig;
use crate::error::Result;
use crate::fs::{CATALOG_FILE, DocumentFs, GROUPS_FILE, VOCABULARY_FILE};
use crate::groups::GroupStore;
use crate::normalize::TagNormalizer;
use crate::vocabulary::VocabularyStore;

mod catalog_service;
mod group_service;
mod request_log_service;
mod vocabulary_service;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InitializeReport {
    pub root: String,
    pub created: Vec<String>,
}

/// Entry point over one tagging root: the vocabulary, group and catalog
/// documents plus the shared normalizer built from the vocabulary.
#[derive(Clone)]
pub struct Papertag {
    pub fs: DocumentFs,
    config: PapertagConfig,
    vocabulary: Arc<RwLock<VocabularyStore>>,
    groups: Arc<RwLock<GroupStore>>,
    normalizer: Arc<TagNormalizer>,
    catalog: Arc<CatalogEngine>,
}

impl std::fmt::Debug for Papertag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Papertag")
            .field("root", &self.fs.root())
            .finish_non_exhaustive()
    }
}

impl Papertag {
    pub fn open(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let fs = DocumentFs::new(root_dir);
        let config = PapertagConfig::load(&fs)?;
        Self::with_config(fs, config)
    }

    pub fn with_config(fs: DocumentFs, config: PapertagConfig) -> Result<Self> {
        let vocabulary = VocabularyStore::load_or_default(fs.clone())?;
        let groups = GroupStore::load_or_default(fs.clone())?;
        let normalizer = TagNormalizer::new(vocabulary.document(), config.normalization);
        let catalog = CatalogEngine::new(
            fs.clone(),
            vocabulary.categories(),
            config.id_prefix.clone(),
        );

        Ok(Self {
            fs,
            config,
            vocabulary: Arc::new(RwLock::new(vocabulary)),
            groups: Arc::new(RwLock::new(groups)),
            normalizer: Arc::new(normalizer),
            catalog: Arc::new(catalog),
        })
    }

    #[must_use]
    pub fn config(&self) -> &PapertagConfig {
        &self.config
    }

    /// Creates the root and seeds whichever documents are missing. Existing
    /// documents are never touched.
    pub fn initialize(&self) -> Result<InitializeReport> {
        self.fs.initialize()?;
        let mut created = Vec::new();
        if self.read_vocabulary()?.persist_if_missing()? {
            created.push(VOCABULARY_FILE.to_string());
        }
        if self.read_groups()?.persist_if_missing()? {
            created.push(GROUPS_FILE.to_string());
        }
        if self.catalog.persist_if_missing()? {
            created.push(CATALOG_FILE.to_string());
        }
        Ok(InitializeReport {
            root: self.fs.root().display().to_string(),
            created,
        })
    }
}
