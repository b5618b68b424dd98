use crate::cli::LoadArgs;
use crate::command_exec::CommandExecutor;
use crate::config::ProjectConfig;
use crate::job::{Job, Packed};
use sqlpack::{PoolConfig, StatementExecutor, execute_all};
use std::sync::Arc;
use std::time::Instant;

pub async fn run(args: LoadArgs) -> anyhow::Result<()> {
    let started = Instant::now();
    let project = ProjectConfig::load(&args.config)?;
    let job = Job::resolve(&project, &args.overrides)?;

    if args.dry_run {
        let packed = job.pack()?;
        let before = project.file.exec.as_ref().map_or(&[][..], |e| e.before.as_slice());
        print_plan(&job, before, &packed);
        return Ok(());
    }

    let Some(exec) = project.file.exec.as_ref() else {
        anyhow::bail!(
            "no [exec] section in {}; `sqlpack load` needs exec.command",
            args.config.display()
        );
    };
    let executor = Arc::new(CommandExecutor::new(&exec.command)?);

    let mut pool = PoolConfig::new().with_workers(args.workers.unwrap_or(exec.workers));
    if let Some(timeout) = exec.timeout() {
        pool = pool.with_statement_timeout(timeout);
    }

    // A packing error must not leave the target already truncated.
    let packed = job.pack()?;

    for (i, stmt) in exec.before.iter().enumerate() {
        executor
            .execute(stmt)
            .await
            .map_err(|e| anyhow::anyhow!("before statement {i} ({stmt}) failed: {e}"))?;
        tracing::info!(target: "sqlpack.cli", statement = %stmt, "ran before statement");
    }

    let total = packed.statements.len();
    let report = execute_all(executor, packed.statements, &pool).await;

    for f in &report.failures {
        eprintln!("statement {} failed: {}", f.index, f.error);
    }
    println!(
        "executed {}/{} statements ({} rows) with {} workers",
        report.succeeded,
        total,
        packed.rows,
        pool.effective_workers().min(total)
    );
    if let Some((index, took)) = report.slowest {
        println!("slowest statement: #{index} ({took:?})");
    }
    println!("elapsed time: {:?}", started.elapsed());

    if !report.is_success() {
        anyhow::bail!("{} of {} statements failed", report.failed, report.submitted);
    }
    Ok(())
}

fn print_plan(job: &Job, before: &[String], packed: &Packed) {
    println!("input: {}", job.input.display());
    for stmt in before {
        println!("before: {stmt}");
    }
    println!("template: {}", job.packer.template());
    println!("byte limit: {}", job.packer.byte_limit());
    println!(
        "{} rows -> {} statements, {} bytes total, largest {} bytes",
        packed.rows,
        packed.statements.len(),
        packed.total_bytes(),
        packed.largest()
    );
    for (i, s) in packed.statements.iter().enumerate() {
        println!("  #{i}: {} bytes", s.len());
    }
}
