#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyKind {
    Everyday,
    WeekDays,
    SelectedDays(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthlyDay {
    /// Fixed day of the month.
    OnDay(u32),
    /// "First".."Fourth" or "Last", paired with a weekday name.
    Weekday { ordinal: String, weekday: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    Hours,
    Minutes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    Manual,
    Daily {
        time: String,
        kind: DailyKind,
    },
    Monthly {
        time: String,
        day: MonthlyDay,
        months: Vec<String>,
    },
    Periodic {
        every: u32,
        unit: PeriodUnit,
    },
    Continuous,
    AfterJob(String),
}

/// Flat scheduling flags as reported by the vendor. Several may be set at
/// once; `Schedule::from_options` picks the one that actually drives the job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleOptions {
    pub run_manually: bool,
    pub after_job: Option<String>,
    pub continuous: bool,
    pub periodic: Option<(u32, PeriodUnit)>,
    pub monthly: Option<(String, MonthlyDay, Vec<String>)>,
    pub daily: Option<(String, DailyKind)>,
}

impl Schedule {
    pub fn from_options(options: &ScheduleOptions) -> Schedule {
        if options.run_manually {
            return Schedule::Manual;
        }
        if let Some(name) = &options.after_job {
            return Schedule::AfterJob(name.clone());
        }
        if options.continuous {
            return Schedule::Continuous;
        }
        if let Some((every, unit)) = options.periodic {
            return Schedule::Periodic { every, unit };
        }
        if let Some((time, day, months)) = &options.monthly {
            return Schedule::Monthly {
                time: time.clone(),
                day: day.clone(),
                months: months.clone(),
            };
        }
        if let Some((time, kind)) = &options.daily {
            return Schedule::Daily {
                time: time.clone(),
                kind: kind.clone(),
            };
        }
        Schedule::Manual
    }

    pub fn describe(&self) -> String {
        match self {
            Schedule::Manual => "Not scheduled".to_string(),
            Schedule::Daily { time, kind } => match kind {
                DailyKind::Everyday => format!("Daily at {}", time),
                DailyKind::WeekDays => format!("Weekdays at {}", time),
                DailyKind::SelectedDays(days) => {
                    format!("Daily at {} on {}", time, abbreviate_all(days))
                }
            },
            Schedule::Monthly { time, day, months } => {
                let mut out = match day {
                    MonthlyDay::OnDay(n) => format!("Monthly at {} on day {}", time, n),
                    MonthlyDay::Weekday { ordinal, weekday } => format!(
                        "Monthly at {} on the {} {}",
                        time,
                        ordinal.to_ascii_lowercase(),
                        weekday
                    ),
                };
                if !months.is_empty() && months.len() < 12 {
                    out.push_str(&format!(" ({})", abbreviate_all(months)));
                }
                out
            }
            Schedule::Periodic { every, unit } => match (unit, every) {
                (PeriodUnit::Hours, 1) => "Every hour".to_string(),
                (PeriodUnit::Hours, n) => format!("Every {} hours", n),
                (PeriodUnit::Minutes, 1) => "Every minute".to_string(),
                (PeriodUnit::Minutes, n) => format!("Every {} minutes", n),
            },
            Schedule::Continuous => "Continuously".to_string(),
            Schedule::AfterJob(name) => format!("After job {}", name),
        }
    }
}

fn abbreviate_all(names: &[String]) -> String {
    names
        .iter()
        .map(|name| name.chars().take(3).collect::<String>())
        .collect::<Vec<_>>()
        .join(", ")
}
