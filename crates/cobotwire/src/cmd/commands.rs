use crate::cmd::CommandsArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_commands, OutputFormat};

pub fn run(_args: CommandsArgs, format: OutputFormat) -> CliResult<i32> {
    print_commands(format);
    Ok(SUCCESS)
}
