use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variables that override values read from the config file.
const ENV_HOST: &str = "ESCOLA_HOST";
const ENV_PORT: &str = "ESCOLA_PORT";
const ENV_BASE_PATH: &str = "ESCOLA_BASE_PATH";
const ENV_LOG_LEVEL: &str = "ESCOLA_LOG_LEVEL";
const ENV_LOG_DIR: &str = "ESCOLA_LOG_DIR";

// ---------------------------------------------------------------------------
// EscolaConfig
// ---------------------------------------------------------------------------

/// Service configuration stored as JSON (by default `./escola.json`).
///
/// Every relative directory is resolved against `base_path`, the project
/// root that holds the `complementos/` tree with templates and workbooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscolaConfig {
    // Server
    pub host: String,
    pub port: u16,

    // Layout
    pub base_path: PathBuf,
    pub templates_dir: PathBuf,
    pub data_dir: PathBuf,
    pub guide_output_dir: PathBuf,
    pub elective_output_dir: PathBuf,
    pub agenda_output_dir: PathBuf,

    // Templates
    pub guide_template: String,
    pub elective_template: String,

    /// Scope & sequence workbook per school cycle (1, 2, 3).
    pub scope_sheets: BTreeMap<u8, String>,

    // Logging
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for EscolaConfig {
    fn default() -> Self {
        let mut scope_sheets = BTreeMap::new();
        scope_sheets.insert(1, "1. Anos Iniciais - Escopo-sequência 2025.xlsx".into());
        scope_sheets.insert(2, "2. Anos Finais - Escopo-sequência 2025.xlsx".into());
        scope_sheets.insert(3, "3. Ensino Médio - Escopo-sequência 2025.xlsx".into());

        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            base_path: PathBuf::from("."),
            templates_dir: PathBuf::from("complementos/templates"),
            data_dir: PathBuf::from("complementos/dados"),
            guide_output_dir: PathBuf::from("outputs/guias"),
            elective_output_dir: PathBuf::from("output"),
            agenda_output_dir: PathBuf::from("."),
            guide_template: "template_guia_aprendizagem_2025.docx".into(),
            elective_template: "template_eletivas_2025.docx".into(),
            scope_sheets,
            log_level: "info".into(),
            log_dir: None,
        }
    }
}

impl EscolaConfig {
    /// Config rooted at `base_path`, everything else default. Handy for tests
    /// and for embedding the generators in other tools.
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Load config from a specific file path, creating it with defaults when
    /// it does not exist yet.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Save config to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Apply `ESCOLA_*` environment overrides on top of the file values.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port
                .trim()
                .parse()
                .with_context(|| format!("{ENV_PORT} is not a valid port: {port:?}"))?;
        }
        if let Some(base) = lookup(ENV_BASE_PATH) {
            self.base_path = PathBuf::from(base);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            self.log_dir = (!dir.trim().is_empty()).then(|| PathBuf::from(dir));
        }
        Ok(())
    }

    /// `host:port` string for the HTTP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn templates_path(&self) -> PathBuf {
        self.base_path.join(&self.templates_dir)
    }

    pub fn guide_template_path(&self) -> PathBuf {
        self.templates_path().join(&self.guide_template)
    }

    pub fn elective_template_path(&self) -> PathBuf {
        self.templates_path().join(&self.elective_template)
    }

    /// Workbook for the given school cycle, `None` when the cycle has no
    /// configured workbook.
    pub fn scope_sheet_path(&self, cycle: u8) -> Option<PathBuf> {
        self.scope_sheets
            .get(&cycle)
            .map(|name| self.base_path.join(&self.data_dir).join(name))
    }

    pub fn guide_output_path(&self) -> PathBuf {
        self.base_path.join(&self.guide_output_dir)
    }

    pub fn elective_output_path(&self) -> PathBuf {
        self.base_path.join(&self.elective_output_dir)
    }

    pub fn agenda_output_path(&self) -> PathBuf {
        self.base_path.join(&self.agenda_output_dir)
    }

    /// Ensures all output directories exist.
    pub fn ensure_output_dirs(&self) -> Result<()> {
        let dirs = [
            self.guide_output_path(),
            self.elective_output_path(),
            self.agenda_output_path(),
        ];
        for dir in &dirs {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }
}
