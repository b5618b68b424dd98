use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Build,
    Load,
    Init,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Build(BuildArgs),
    Load(LoadArgs),
    Init(InitArgs),
}

/// Flags shared by `build` and `load` that override values from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub max_packet: Option<usize>,
    pub skip_empty_rows: bool,
}

#[derive(Debug, Clone)]
pub struct BuildArgs {
    pub config: PathBuf,
    pub overrides: Overrides,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct LoadArgs {
    pub config: PathBuf,
    pub overrides: Overrides,
    pub workers: Option<usize>,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct InitArgs {
    pub config: PathBuf,
}

const DEFAULT_CONFIG: &str = "sqlpack.toml";

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "build" => parse_build(it.map(|s| s.as_str())),
        "load" => parse_load(it.map(|s| s.as_str())),
        "init" => parse_init(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

/// Pull the value for `--name <v>` or `--name=<v>`.
///
/// Returns `Ok(None)` if `token` is not `--name`.
fn flag_value<'a>(
    name: &str,
    token: &'a str,
    it: &mut impl Iterator<Item = &'a str>,
) -> anyhow::Result<Option<&'a str>> {
    if token == name {
        let Some(v) = it.next() else {
            anyhow::bail!("{name} requires a value");
        };
        return Ok(Some(v));
    }
    match token.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')) {
        Some(v) => Ok(Some(v)),
        None => Ok(None),
    }
}

fn parse_count(name: &str, raw: &str) -> anyhow::Result<usize> {
    raw.replace('_', "")
        .parse::<usize>()
        .map_err(|_| anyhow::anyhow!("invalid {name} value: {raw}"))
}

/// Handle the flags common to `build` and `load`. Returns `true` if `token` was consumed.
fn parse_common<'a>(
    token: &'a str,
    it: &mut impl Iterator<Item = &'a str>,
    config: &mut PathBuf,
    overrides: &mut Overrides,
) -> anyhow::Result<bool> {
    if let Some(v) = flag_value("--config", token, it)? {
        *config = PathBuf::from(v);
    } else if let Some(v) = flag_value("--input", token, it)? {
        overrides.input = Some(PathBuf::from(v));
    } else if let Some(v) = flag_value("--max-packet", token, it)? {
        overrides.max_packet = Some(parse_count("--max-packet", v)?);
    } else if token == "--skip-empty-rows" {
        overrides.skip_empty_rows = true;
    } else {
        return Ok(false);
    }
    Ok(true)
}

fn parse_build<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut overrides = Overrides::default();
    let mut output: Option<PathBuf> = None;

    while let Some(token) = it.next() {
        if matches!(token, "-h" | "--help") {
            return Ok(Command::Help(HelpTopic::Build));
        }
        if parse_common(token, &mut it, &mut config, &mut overrides)? {
            continue;
        }
        if let Some(v) = flag_value("--output", token, &mut it)? {
            output = Some(PathBuf::from(v));
            continue;
        }
        anyhow::bail!("unknown argument: {token}");
    }

    Ok(Command::Build(BuildArgs {
        config,
        overrides,
        output,
    }))
}

fn parse_load<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut overrides = Overrides::default();
    let mut workers: Option<usize> = None;
    let mut dry_run = false;

    while let Some(token) = it.next() {
        if matches!(token, "-h" | "--help") {
            return Ok(Command::Help(HelpTopic::Load));
        }
        if parse_common(token, &mut it, &mut config, &mut overrides)? {
            continue;
        }
        if let Some(v) = flag_value("--workers", token, &mut it)? {
            workers = Some(parse_count("--workers", v)?);
            continue;
        }
        if token == "--dry-run" {
            dry_run = true;
            continue;
        }
        anyhow::bail!("unknown argument: {token}");
    }

    Ok(Command::Load(LoadArgs {
        config,
        overrides,
        workers,
        dry_run,
    }))
}

fn parse_init<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);

    while let Some(token) = it.next() {
        if matches!(token, "-h" | "--help") {
            return Ok(Command::Help(HelpTopic::Init));
        }
        if let Some(v) = flag_value("--config", token, &mut it)? {
            config = PathBuf::from(v);
            continue;
        }
        anyhow::bail!("unknown argument: {token}");
    }

    Ok(Command::Init(InitArgs { config }))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
sqlpack - bulk-load CSV data through size-bounded INSERT/REPLACE statements

USAGE:
  sqlpack <COMMAND> [OPTIONS]

COMMANDS:
  build         Pack a CSV file into statements and write them out
  load          Pack a CSV file and execute the statements in parallel
  init          Write a template sqlpack.toml

Run `sqlpack <command> --help` for more."
            );
        }
        HelpTopic::Build => {
            println!(
                "\
USAGE:
  sqlpack build [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: sqlpack.toml)
  --input <CSV>         Override source.path from config
  --max-packet <BYTES>  Override target.max_allowed_packet
  --skip-empty-rows     Drop field-less rows instead of failing
  --output <FILE>       Write statements to file (default: stdout)
  -h, --help            Print help"
            );
        }
        HelpTopic::Load => {
            println!(
                "\
USAGE:
  sqlpack load [OPTIONS]

NOTES:
  Each statement is piped to the stdin of exec.command from the config.
  Statements in exec.before run first, one at a time, in order.

OPTIONS:
  --config <FILE>       Config file path (default: sqlpack.toml)
  --input <CSV>         Override source.path from config
  --max-packet <BYTES>  Override target.max_allowed_packet
  --skip-empty-rows     Drop field-less rows instead of failing
  --workers <N>         Parallel workers (default: exec.workers, 0 = one per CPU)
  --dry-run             Print the statement plan without executing
  -h, --help            Print help"
            );
        }
        HelpTopic::Init => {
            println!(
                "\
USAGE:
  sqlpack init [OPTIONS]

OPTIONS:
  --config <FILE>       Output config path (default: sqlpack.toml)
  -h, --help            Print help"
            );
        }
    }
}
