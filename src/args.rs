use clap::Parser;

/// This program harmonizes the Swiss communes along railway lines and joins
/// them with the federal voting results of a voting date.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON configuration describing the voting date, the
    /// results URL and the input files. For more information about the file
    /// format, read the documentation of the swiss_communes crate.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (directory path, optional) If specified, the output tables will be
    /// written to the given directory. Setting this option overrides the
    /// directory that may be specified in the configuration file.
    #[clap(short, long, value_parser)]
    pub out_dir: Option<String>,

    /// (YYYY-MM-DD, optional) If specified, overrides the voting date given
    /// in the configuration file.
    #[clap(long, value_parser)]
    pub voting_date: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
