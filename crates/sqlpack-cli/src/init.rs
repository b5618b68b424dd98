use crate::cli::InitArgs;
use std::path::Path;

const TEMPLATE: &str = r#"
version = "1"

[source]
path = "data.csv"
has_header = true
delimiter = ","

[target]
table = "my_table"
mode = "replace" # replace | insert
# Use a literal prefix instead of `table`/`mode`:
# template = "INSERT IGNORE INTO my_table VALUES"
max_allowed_packet = 16777216

[packing]
on_empty_row = "fail" # fail | skip
reserved_bytes = 1
validate_packet_range = true

# --- Optional: needed by `sqlpack load` ---
#
# [exec]
# # Each statement is written to this command's stdin.
# command = ["mysql", "--user=${DB_USER}", "--password=${DB_PASSWORD}", "mydb"]
# # Run in order before loading.
# before = ["TRUNCATE my_table"]
# workers = 0 # 0 = one per CPU
# timeout_secs = 60
"#;

pub fn run(args: InitArgs) -> anyhow::Result<()> {
    write_template(&args.config)?;
    println!("wrote {}", args.config.display());
    Ok(())
}

fn write_template(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("refusing to overwrite existing file: {}", path.display());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("failed to create directory {}: {e}", parent.display())
            })?;
        }
    }

    std::fs::write(path, TEMPLATE.trim_start_matches('\n'))
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
    Ok(())
}
