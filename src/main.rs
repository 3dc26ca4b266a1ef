use clap::Parser;
use importa::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }

    // Install miette's fancy error handler for readable diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => importa::cli::commands::init::run(args),
        Commands::Types(args) => importa::cli::commands::types::run(args, &global),
        Commands::Schema(args) => importa::cli::commands::schema::run(args, &global),
        Commands::Template(args) => importa::cli::commands::template::run(args, &global),
        Commands::Import(args) => importa::cli::commands::import::run(args, &global),
        Commands::Completions(args) => importa::cli::commands::completions::run(args),
    }
}
