//! Binary entry point: parse the command line, open the registry database and
//! run one command against it.
use circle_registry::{ensure_schema, init_logging, run, CommandLine, Config};

fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();
    init_logging(commands.verbose);

    let config = Config::resolve(commands.database)?;
    let mut conn = ensure_schema(&config.db_path)?;
    run(&mut conn, commands.command)
}
