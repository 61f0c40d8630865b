use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Create the skgc metadata for a server installation
    Init {
        /// java or bedrock
        edition: String,
    },

    /// Run the server and attach to its console
    Start,

    /// Attach to the console of a running server
    Console,

    /// Send the stop command to a running server
    Stop,

    /// Show the installation record and ports
    Status,

    /// Send one console command to a running server
    Send {
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Print the latest console output of a running server
    Log {
        /// Number of lines (default: relay.log_tail_lines)
        #[arg(long, short = 'n')]
        lines: Option<usize>,
    },

    /// Print a player's position
    Coordinate { player: String },

    /// Show the ports, or derive all ports from a base port
    Port { port: Option<u16> },

    /// Show or set the display alias
    Alias { alias: Option<String> },

    /// Show or set the edition
    Edition { edition: Option<String> },

    /// Show or set the shell command that starts the server
    StartCommand { command: Option<String> },

    /// Show or set the console command that stops the server
    StopCommand { command: Option<String> },

    /// Replace the server files with the release at URL
    Update { url: String },

    /// Show the misc data, or replace it with a JSON object
    Misc { json: Option<String> },
}
