use crate::cli::Overrides;
use crate::config::ProjectConfig;
use crate::source::{CsvSettings, read_rows};
use sqlpack::{EmptyRowPolicy, StatementPacker};
use std::path::{Path, PathBuf};

/// A fully resolved packing job: config file values with command line
/// overrides applied.
#[derive(Debug, Clone)]
pub struct Job {
    pub input: PathBuf,
    pub csv: CsvSettings,
    pub packer: StatementPacker,
}

/// Output of [`Job::pack`].
#[derive(Debug)]
pub struct Packed {
    pub rows: usize,
    pub statements: Vec<String>,
}

impl Packed {
    pub fn largest(&self) -> usize {
        self.statements.iter().map(String::len).max().unwrap_or(0)
    }

    pub fn total_bytes(&self) -> usize {
        self.statements.iter().map(String::len).sum()
    }
}

impl Job {
    pub fn resolve(project: &ProjectConfig, overrides: &Overrides) -> anyhow::Result<Self> {
        let file = &project.file;

        let input = match &overrides.input {
            Some(p) => p.clone(),
            None => project.resolve_path(&file.source.path),
        };

        let mut options = file.packing.to_options();
        if overrides.skip_empty_rows {
            options = options.with_on_empty_row(EmptyRowPolicy::Skip);
        }

        let byte_limit = overrides
            .max_packet
            .unwrap_or(file.target.max_allowed_packet);
        let packer = StatementPacker::new(file.target.template()?, byte_limit).options(options);

        Ok(Self {
            input,
            csv: CsvSettings {
                has_header: file.source.has_header,
                delimiter: file.source.delimiter_byte()?,
            },
            packer,
        })
    }

    pub fn load(config: &Path, overrides: &Overrides) -> anyhow::Result<Self> {
        let project = ProjectConfig::load(config)?;
        Self::resolve(&project, overrides)
    }

    /// Read the input file and pack it.
    pub fn pack(&self) -> anyhow::Result<Packed> {
        let rows = read_rows(&self.input, self.csv)?;
        let statements = self
            .packer
            .pack(&rows)
            .map_err(|e| anyhow::anyhow!("failed to pack {}: {e}", self.input.display()))?;

        tracing::info!(
            target: "sqlpack.cli",
            rows = rows.len(),
            statements = statements.len(),
            byte_limit = self.packer.byte_limit(),
            "packed input"
        );

        Ok(Packed {
            rows: rows.len(),
            statements,
        })
    }
}
