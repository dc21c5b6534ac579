//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// coursecal - Convert, optimize and merge course calendars
#[derive(Debug, Parser)]
#[command(name = "coursecal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "COURSECAL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read a calendar file, transform it and write it back out
    Convert(ConvertArgs),

    /// Print an overview of a calendar file
    Show {
        /// Calendar file to read
        input: PathBuf,

        /// Print the whole calendar as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        import: ImportArgs,
    },

    /// Combine two calendar files into one
    Merge {
        /// First calendar; its items come first
        first: PathBuf,

        /// Second calendar
        second: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,

        #[command(flatten)]
        import: ImportArgs,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments of the `convert` command.
#[derive(Debug, Clone, Default, Args)]
pub struct ConvertArgs {
    /// Calendar file to read
    pub input: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Fold weekly occurrences into recurring series
    #[arg(long)]
    pub optimize: bool,

    /// Alarm lead time in minutes for new series
    #[arg(long, requires = "optimize")]
    pub alarm_lead: Option<u32>,

    /// Offset the calendar was written for, in minutes east of UTC
    #[arg(long, requires = "shift_to", allow_negative_numbers = true)]
    pub shift_from: Option<i64>,

    /// Offset to re-base the calendar onto, in minutes east of UTC
    #[arg(long, requires = "shift_from", allow_negative_numbers = true)]
    pub shift_to: Option<i64>,

    /// Move DST wall-clock times one hour forward
    #[arg(long, conflicts_with = "set_dst")]
    pub fix_dst: bool,

    /// Move wall-clock times inside the DST window one hour back
    #[arg(long)]
    pub set_dst: bool,

    #[command(flatten)]
    pub import: ImportArgs,
}

/// Flags controlling how calendar files are read.
#[derive(Debug, Clone, Default, Args)]
pub struct ImportArgs {
    /// Read RRULE and EXDATE lines into recurrences
    #[arg(long)]
    pub import_recurrence: bool,

    /// Read VALARM blocks into alarms
    #[arg(long)]
    pub import_alarms: bool,

    /// Continue with an empty calendar when a file fails to parse
    #[arg(long)]
    pub lenient: bool,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump the current configuration
    Dump,

    /// Show the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn convert_with_negative_offsets() {
        let cli = Cli::parse_from([
            "coursecal",
            "convert",
            "term.ics",
            "--optimize",
            "--shift-from",
            "-300",
            "--shift-to",
            "480",
            "--fix-dst",
            "-o",
            "out.ics",
        ]);
        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.input, PathBuf::from("term.ics"));
        assert_eq!(args.output, Some(PathBuf::from("out.ics")));
        assert!(args.optimize);
        assert_eq!(args.shift_from, Some(-300));
        assert_eq!(args.shift_to, Some(480));
        assert!(args.fix_dst);
    }

    #[test]
    fn shift_needs_both_ends() {
        let result = Cli::try_parse_from(["coursecal", "convert", "a.ics", "--shift-from", "60"]);
        assert!(result.is_err());
    }

    #[test]
    fn dst_flags_conflict() {
        let result =
            Cli::try_parse_from(["coursecal", "convert", "a.ics", "--fix-dst", "--set-dst"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["coursecal", "show", "a.ics", "--json", "-v"]);
        assert!(cli.debug);
        assert!(matches!(cli.command, Command::Show { json: true, .. }));
    }
}
