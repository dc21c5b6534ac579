//! The `merge` command.

use std::path::Path;

use tracing::info;

use coursecal_core::Calendar;

use crate::cli::ImportArgs;
use crate::commands::{ReadPolicy, write_output};
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Reads two calendars and writes their union.
pub fn run(
    first: &Path,
    second: &Path,
    output: Option<&Path>,
    import: &ImportArgs,
    config: &ClientConfig,
) -> ClientResult<()> {
    let policy = ReadPolicy::resolve(config, import)?;
    let a = policy.load(first)?;
    let b = policy.load(second)?;

    let merged = Calendar::merged(&a, &b);
    info!(name = merged.name(), items = merged.len(), "Merged calendars");

    write_output(&merged.render_with(&config.render_options()), output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{TWO_WEEKS, write_file};

    const DENTIST: &str = "BEGIN:VCALENDAR
PRODID:-//Test//Test//EN
VERSION:2.0
BEGIN:VEVENT
DTSTART:20210701T130000Z
DTEND:20210701T140000Z
SUMMARY:Dentist
END:VEVENT
END:VCALENDAR
";

    #[test]
    fn writes_events_of_both_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_file(&dir, "term.ics", TWO_WEEKS);
        let second = write_file(&dir, "personal.ics", DENTIST);
        let output = dir.path().join("all.ics");

        run(
            &first,
            &second,
            Some(&output),
            &ImportArgs::default(),
            &ClientConfig::default(),
        )
        .unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        let summaries: Vec<_> = written
            .lines()
            .filter_map(|l| l.strip_prefix("SUMMARY:"))
            .collect();
        assert_eq!(summaries, ["CPS 2231", "CPS 2231", "Dentist"]);
    }

    #[test]
    fn lenient_merge_skips_broken_side() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_file(&dir, "term.ics", TWO_WEEKS);
        let second = write_file(&dir, "broken.ics", "garbage\n");
        let output = dir.path().join("all.ics");
        let import = ImportArgs {
            lenient: true,
            ..ImportArgs::default()
        };

        run(&first, &second, Some(&output), &import, &ClientConfig::default()).unwrap();
        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written.matches("BEGIN:VEVENT").count(), 2);

        let strict = run(
            &first,
            &second,
            Some(&output),
            &ImportArgs::default(),
            &ClientConfig::default(),
        );
        assert!(strict.is_err());
    }
}
