mod build_cmd;
mod cli;
mod command_exec;
mod config;
mod init;
mod job;
mod load_cmd;
pub mod logging;
mod source;
mod write;

pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Build(args) => build_cmd::run(args),
        cli::Command::Load(args) => load_cmd::run(args).await,
        cli::Command::Init(args) => init::run(args),
    }
}
