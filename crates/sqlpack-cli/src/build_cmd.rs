use crate::cli::BuildArgs;
use crate::job::Job;
use crate::write::{save_script, write_script};
use std::time::Instant;

pub fn run(args: BuildArgs) -> anyhow::Result<()> {
    let started = Instant::now();
    let job = Job::load(&args.config, &args.overrides)?;
    let packed = job.pack()?;

    match &args.output {
        Some(path) => {
            save_script(path, &packed.statements)?;
            eprintln!("wrote {}", path.display());
        }
        None => write_script(&mut std::io::stdout().lock(), &packed.statements)
            .map_err(|e| anyhow::anyhow!("failed to write statements to stdout: {e}"))?,
    }

    eprintln!(
        "packed {} rows into {} statements (largest {} bytes, limit {})",
        packed.rows,
        packed.statements.len(),
        packed.largest(),
        job.packer.byte_limit()
    );
    eprintln!("elapsed time: {:?}", started.elapsed());
    Ok(())
}
