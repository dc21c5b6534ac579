//! Subcommand implementations.

pub mod config;
pub mod convert;
pub mod merge;
pub mod show;

use std::path::Path;

use tracing::{debug, warn};

use coursecal_core::{Calendar, ParseOptions};

use crate::cli::ImportArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// How calendar files are read, after merging config and flags.
#[derive(Debug, Clone, Copy)]
pub struct ReadPolicy {
    pub options: ParseOptions,
    pub lenient: bool,
}

impl ReadPolicy {
    /// Combines the `[import]` section with command-line flags.
    ///
    /// Flags can only turn features on.
    pub fn resolve(config: &ClientConfig, args: &ImportArgs) -> ClientResult<Self> {
        let base = config.parse_options()?;
        let options = base
            .with_recurrence_import(base.import_recurrence || args.import_recurrence)
            .with_alarm_import(base.import_alarms || args.import_alarms);
        Ok(Self {
            options,
            lenient: config.import.lenient || args.lenient,
        })
    }

    /// Reads a calendar file, naming the calendar after it.
    ///
    /// A lenient policy swaps a parse failure for an empty calendar.
    pub fn load(&self, path: &Path) -> ClientResult<Calendar> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            ClientError::Io(std::io::Error::new(
                err.kind(),
                format!("{}: {}", path.display(), err),
            ))
        })?;

        match Calendar::from_ics_with(&text, &self.options) {
            Ok(mut calendar) => {
                calendar.attach_path(path);
                debug!(path = %path.display(), items = calendar.len(), "Loaded calendar");
                Ok(calendar)
            }
            Err(err) if self.lenient => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Failed to parse calendar, continuing with an empty one"
                );
                Ok(Calendar::for_path(path))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Writes a document to `output`, or to stdout when unset.
pub fn write_output(document: &str, output: Option<&Path>) -> ClientResult<()> {
    match output {
        Some(path) => {
            std::fs::write(path, document)?;
            debug!(path = %path.display(), bytes = document.len(), "Wrote calendar");
        }
        None => print!("{document}"),
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    /// Two Monday lectures one week apart.
    pub const TWO_WEEKS: &str = "BEGIN:VCALENDAR
PRODID:-//Test//Test//EN
VERSION:2.0
BEGIN:VEVENT
DTSTART:20210215T133000Z
DTEND:20210215T151500Z
SUMMARY:CPS 2231
LOCATION:Location: W\\, Building:GEH\\, Room:C504
END:VEVENT
BEGIN:VEVENT
DTSTART:20210222T133000Z
DTEND:20210222T151500Z
SUMMARY:CPS 2231
LOCATION:Location: W\\, Building:GEH\\, Room:C504
END:VEVENT
END:VCALENDAR
";

    pub fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{TWO_WEEKS, write_file};
    use super::*;

    #[test]
    fn flags_turn_imports_on() {
        let config = ClientConfig::default();
        let args = ImportArgs {
            import_recurrence: true,
            import_alarms: false,
            lenient: true,
        };
        let policy = ReadPolicy::resolve(&config, &args).unwrap();
        assert!(policy.options.import_recurrence);
        assert!(!policy.options.import_alarms);
        assert!(policy.lenient);
    }

    #[test]
    fn config_cannot_be_turned_off_by_flags() {
        let mut config = ClientConfig::default();
        config.import.import_alarms = true;
        let policy = ReadPolicy::resolve(&config, &ImportArgs::default()).unwrap();
        assert!(policy.options.import_alarms);
        assert!(!policy.lenient);
    }

    #[test]
    fn load_names_calendar_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "spring.ics", TWO_WEEKS);
        let policy = ReadPolicy::resolve(&ClientConfig::default(), &ImportArgs::default()).unwrap();

        let calendar = policy.load(&path).unwrap();
        assert_eq!(calendar.name(), "spring");
        assert_eq!(calendar.path(), Some(path.as_path()));
        assert_eq!(calendar.course_count(), 1);
    }

    #[test]
    fn strict_load_fails_lenient_load_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "broken.ics", "BEGIN:VCALENDAR\nVERSION:2.0\n");

        let strict = ReadPolicy::resolve(&ClientConfig::default(), &ImportArgs::default()).unwrap();
        let err = strict.load(&path).unwrap_err();
        assert!(matches!(err, ClientError::Calendar(_)));

        let lenient = ReadPolicy {
            lenient: true,
            ..strict
        };
        let calendar = lenient.load(&path).unwrap();
        assert!(calendar.is_empty());
        assert_eq!(calendar.name(), "broken");
    }

    #[test]
    fn missing_file_is_io_error_even_when_lenient() {
        let dir = tempfile::tempdir().unwrap();
        let policy = ReadPolicy {
            options: ParseOptions::default(),
            lenient: true,
        };
        let err = policy.load(&dir.path().join("missing.ics")).unwrap_err();
        assert!(matches!(err, ClientError::Io(_)));
        assert!(err.to_string().contains("missing.ics"));
    }

    #[test]
    fn write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ics");
        write_output("BEGIN:VCALENDAR\n", Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "BEGIN:VCALENDAR\n");
    }
}
