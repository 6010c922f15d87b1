mod cli;

use clap::Parser;

use cli::ValidateArgs;

#[derive(Parser)]
#[command(
    name = "webcl-validator",
    version,
    about = "Validate an OpenCL C kernel for WebCL and clamp every memory access",
    disable_help_flag = true
)]
struct Cli {
    #[command(flatten)]
    args: ValidateArgs,
}

fn main() {
    let raw: Vec<String> = std::env::args().collect();
    cli::usage_requested::<Cli>(&raw);

    let cli = Cli::parse();
    cli::init_logging(cli.args.log_level.as_deref());
    cli::cmd_validate(cli.args);
}
