use serde::Deserialize;
use sqlpack::{EmptyRowPolicy, PackOptions, RESERVED_BYTES, Template};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// `max_allowed_packet` used when the config does not set one (16 MiB).
pub const DEFAULT_MAX_ALLOWED_PACKET: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_dir: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let config_dir = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let raw = std::fs::read_to_string(config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e} (run `sqlpack init` to create one)",
                config_path.display()
            )
        })?;

        let file = ConfigFile::parse(&raw).map_err(|e| {
            anyhow::anyhow!("invalid config file {}: {e:#}", config_path.display())
        })?;

        Ok(Self { config_dir, file })
    }

    /// Resolve `p` relative to the directory holding the config file.
    pub fn resolve_path(&self, p: impl AsRef<Path>) -> PathBuf {
        let p = p.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,

    pub source: SourceConfig,
    pub target: TargetConfig,

    #[serde(default)]
    pub packing: PackingConfig,

    pub exec: Option<ExecConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub path: String,
    #[serde(default = "default_true")]
    pub has_header: bool,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl SourceConfig {
    pub fn delimiter_byte(&self) -> anyhow::Result<u8> {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => anyhow::bail!(
                "source.delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementMode {
    #[default]
    Replace,
    Insert,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub table: Option<String>,
    pub template: Option<String>,
    #[serde(default)]
    pub mode: StatementMode,
    #[serde(default = "default_max_allowed_packet")]
    pub max_allowed_packet: usize,
}

impl TargetConfig {
    pub fn template(&self) -> anyhow::Result<Template> {
        match (&self.table, &self.template) {
            (Some(table), None) => Ok(match self.mode {
                StatementMode::Replace => Template::replace_into(table)?,
                StatementMode::Insert => Template::insert_into(table)?,
            }),
            (None, Some(raw)) => Ok(Template::raw(raw.as_str())),
            _ => anyhow::bail!("exactly one of target.table or target.template must be set"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackingConfig {
    #[serde(default)]
    pub on_empty_row: EmptyRowPolicy,
    #[serde(default = "default_reserved_bytes")]
    pub reserved_bytes: usize,
    #[serde(default = "default_true")]
    pub validate_packet_range: bool,
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            on_empty_row: EmptyRowPolicy::default(),
            reserved_bytes: RESERVED_BYTES,
            validate_packet_range: true,
        }
    }
}

impl PackingConfig {
    pub fn to_options(&self) -> PackOptions {
        PackOptions::new()
            .with_on_empty_row(self.on_empty_row)
            .with_reserved_bytes(self.reserved_bytes)
            .with_byte_limit_range_check(self.validate_packet_range)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecConfig {
    pub command: Vec<String>,
    /// Statements run one by one, in order, before the load starts
    /// (e.g. `TRUNCATE t`).
    #[serde(default)]
    pub before: Vec<String>,
    #[serde(default)]
    pub workers: usize,
    pub timeout_secs: Option<u64>,
}

impl ExecConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_max_allowed_packet() -> usize {
    DEFAULT_MAX_ALLOWED_PACKET
}

fn default_reserved_bytes() -> usize {
    RESERVED_BYTES
}

impl ConfigFile {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let mut file: ConfigFile = toml::from_str(raw)?;
        file.expand_env()?;
        file.validate()?;
        Ok(file)
    }

    fn expand_env(&mut self) -> anyhow::Result<()> {
        self.source.path = expand_env_vars(&self.source.path)?;

        if let Some(table) = self.target.table.as_mut() {
            *table = expand_env_vars(table)?;
        }
        if let Some(template) = self.target.template.as_mut() {
            *template = expand_env_vars(template)?;
        }

        if let Some(exec) = self.exec.as_mut() {
            for arg in exec.command.iter_mut().chain(exec.before.iter_mut()) {
                *arg = expand_env_vars(arg)?;
            }
        }

        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }

        if self.source.path.trim().is_empty() {
            anyhow::bail!("source.path must not be empty");
        }
        self.source.delimiter_byte()?;

        // Builds the prefix once so table-name problems surface at load time.
        self.target.template()?;

        if let Some(exec) = &self.exec {
            if exec.command.first().is_none_or(|p| p.trim().is_empty()) {
                anyhow::bail!("exec.command must name a program");
            }
            if exec.before.iter().any(|stmt| stmt.trim().is_empty()) {
                anyhow::bail!("exec.before must not contain empty statements");
            }
        }

        Ok(())
    }
}

fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            anyhow::bail!("unterminated env var reference: ${{{after}");
        };
        let key = &after[..end];
        if key.is_empty() {
            anyhow::bail!("invalid env var reference: ${{}}");
        }
        let v = std::env::var(key)
            .map_err(|_| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
        out.push_str(&v);
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    Ok(out)
}
