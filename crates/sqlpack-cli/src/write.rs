use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Write each statement followed by `;\n`.
pub fn write_script<W: Write>(out: &mut W, statements: &[String]) -> std::io::Result<()> {
    for stmt in statements {
        out.write_all(stmt.as_bytes())?;
        out.write_all(b";\n")?;
    }
    out.flush()
}

/// Stream `statements` into `<path>.tmp`, then rename over `path`.
///
/// A failed write leaves `path` as it was and removes the partial temp file.
pub fn save_script(path: &Path, statements: &[String]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("failed to create directory {}: {e}", parent.display()))?;
    }

    let tmp = script_tmp_path(path);
    let written = File::create(&tmp).and_then(|file| {
        let mut out = BufWriter::new(file);
        write_script(&mut out, statements)?;
        out.into_inner().map_err(|e| e.into_error())?.sync_all()
    });
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        anyhow::bail!("failed to write {}: {e}", tmp.display());
    }

    std::fs::rename(&tmp, path)
        .map_err(|e| anyhow::anyhow!("failed to move {} into place: {e}", tmp.display()))
}

fn script_tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
