//! The `convert` command.

use tracing::info;

use coursecal_core::{Calendar, OptimizeOptions};

use crate::cli::ConvertArgs;
use crate::commands::{ReadPolicy, write_output};
use crate::config::{ClientConfig, DstMode};
use crate::error::{ClientError, ClientResult};

/// Offsets must stay within one day.
const MAX_OFFSET_MINUTES: i64 = 24 * 60 - 1;

/// The transforms `convert` applies, after merging config and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertPlan {
    pub optimize: Option<OptimizeOptions>,
    pub dst: DstMode,
    /// `(source, dest)` offsets in milliseconds.
    pub shift_millis: Option<(i64, i64)>,
}

impl ConvertPlan {
    /// Flags win over the `[zone]` and `[optimize]` sections.
    pub fn resolve(args: &ConvertArgs, config: &ClientConfig) -> ClientResult<Self> {
        let optimize = args.optimize.then(|| match args.alarm_lead {
            Some(alarm_lead_minutes) => OptimizeOptions { alarm_lead_minutes },
            None => config.optimize_options(),
        });

        let dst = match (args.fix_dst, args.set_dst) {
            (true, _) => DstMode::Fix,
            (_, true) => DstMode::Set,
            _ => config.zone.dst,
        };

        let shift_minutes = match (args.shift_from, args.shift_to) {
            (Some(from), Some(to)) => Some((from, to)),
            _ => config.zone.shift_minutes(),
        };
        let shift_millis = match shift_minutes {
            Some((from, to)) => {
                for minutes in [from, to] {
                    if minutes.abs() > MAX_OFFSET_MINUTES {
                        return Err(ClientError::Usage(format!(
                            "offset {minutes} is outside ±{MAX_OFFSET_MINUTES} minutes"
                        )));
                    }
                }
                Some((from * 60_000, to * 60_000))
            }
            None => None,
        };

        Ok(Self {
            optimize,
            dst,
            shift_millis,
        })
    }

    /// Applies the transforms: optimize, then DST, then the zone shift.
    ///
    /// DST runs first because it reads the wall clock of the source zone.
    pub fn apply(&self, calendar: &mut Calendar) {
        if let Some(options) = &self.optimize {
            calendar.optimize_courses_with(options);
        }
        match self.dst {
            DstMode::None => {}
            DstMode::Fix => calendar.fix_dst(),
            DstMode::Set => calendar.set_dst(),
        }
        if let Some((source, dest)) = self.shift_millis {
            calendar.shift_zone_base(source, dest);
        }
    }
}

/// Reads, transforms and writes one calendar.
pub fn run(args: &ConvertArgs, config: &ClientConfig) -> ClientResult<()> {
    let policy = ReadPolicy::resolve(config, &args.import)?;
    let plan = ConvertPlan::resolve(args, config)?;

    let mut calendar = policy.load(&args.input)?;
    plan.apply(&mut calendar);
    info!(
        name = calendar.name(),
        courses = calendar.course_count(),
        standalone = calendar.standalone_count(),
        "Converted calendar"
    );

    let document = calendar.render_with(&config.render_options());
    write_output(&document, args.output.as_deref())
}
