//! Day-by-day itinerary construction with priority-based exclusion.
//!
//! The builder sequences every kept place once per attempt, then walks the
//! route filling calendar days: a travel leg is committed only while the
//! day's driving stays under the cap, visits are never split, and the trip
//! must be back at the start before the return deadline. When an attempt
//! does not fit, the least important place is dropped and the whole route
//! is sequenced again.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::distance::DistanceTable;
use crate::error::PlanError;
use crate::feasibility::{FeasibilityAnalyzer, daily_cap_minutes};
use crate::model::{DayItinerary, ResolvedStop, Stop, StopKind, TourPlan, Verdict, round_km};
use crate::sequencer::sequence;

/// Everything the builder needs for one plan.
#[derive(Debug, Clone)]
pub struct PlanInputs<'a> {
    pub trip_name: String,
    pub start: &'a str,
    /// Catalog-resolved places in request order.
    pub stops: &'a [ResolvedStop],
    pub number_of_days: u32,
    pub max_driving_hours_per_day: f64,
    pub start_date: NaiveDate,
    pub return_deadline: Option<NaiveDateTime>,
    /// Selection names the catalog did not know.
    pub invalid_places: Vec<String>,
    /// Warnings raised before building (unknown or duplicate selections).
    pub notices: Vec<String>,
}

pub struct ItineraryBuilder<'a> {
    table: &'a DistanceTable,
    config: &'a PlannerConfig,
}

impl<'a> ItineraryBuilder<'a> {
    pub fn new(table: &'a DistanceTable, config: &'a PlannerConfig) -> Self {
        Self { table, config }
    }

    /// Build a plan, excluding lowest-priority places until one fits.
    ///
    /// Returns [`PlanError::PlanUnachievable`] when even the empty trip
    /// misses the deadline.
    pub fn build(&self, inputs: &PlanInputs<'_>) -> Result<TourPlan, PlanError> {
        validate(inputs)?;

        let window = TripWindow::new(inputs, self.config);
        let mut kept: Vec<&ResolvedStop> = inputs.stops.iter().collect();
        let mut excluded: Vec<String> = Vec::new();

        loop {
            match self.attempt(inputs.start, &kept, &window) {
                Ok(schedule) => {
                    return Ok(self.finish(inputs, &window, &kept, excluded, schedule));
                }
                Err(overflow) => {
                    let Some(index) = exclusion_candidate(&kept, &overflow.placed) else {
                        warn!(reason = %overflow.reason, excluded = excluded.len(), "no plan fits");
                        return Err(PlanError::PlanUnachievable {
                            excluded_places: excluded,
                        });
                    };
                    let dropped = kept.remove(index);
                    info!(
                        place = %dropped.name,
                        priority = u8::from(dropped.priority),
                        reason = %overflow.reason,
                        "excluding place to fit the trip"
                    );
                    excluded.push(dropped.name.clone());
                }
            }
        }
    }

    fn attempt(
        &self,
        start: &str,
        kept: &[&ResolvedStop],
        window: &TripWindow,
    ) -> Result<Schedule, Overflow> {
        let mut ordered = kept.to_vec();
        ordered.sort_by_key(|stop| stop.priority);
        let names: Vec<&str> = ordered.iter().map(|stop| stop.name.as_str()).collect();

        let route = sequence(start, &names, start, self.table).map_err(|err| Overflow {
            reason: OverflowReason::NoRoute(err.to_string()),
            placed: Vec::new(),
        })?;

        let mut slicer = DaySlicer::new(window, self.table, start);
        for name in route.iter().skip(1) {
            let Some(stop) = ordered.iter().find(|stop| stop.name == *name) else {
                continue;
            };
            slicer.travel_to(name)?;
            slicer.visit(stop);
        }
        slicer.travel_to(start)?;

        let schedule = slicer.finish();
        if schedule.returns_at > window.deadline {
            return Err(Overflow {
                reason: OverflowReason::DeadlinePassed(schedule.returns_at),
                placed: schedule.placed,
            });
        }
        Ok(schedule)
    }

    fn finish(
        &self,
        inputs: &PlanInputs<'_>,
        window: &TripWindow,
        kept: &[&ResolvedStop],
        excluded_places: Vec<String>,
        schedule: Schedule,
    ) -> TourPlan {
        let days = schedule.days;
        let driving_minutes: u32 = days.iter().map(|day| day.driving_minutes).sum();
        let total_distance_km: f64 = days.iter().map(|day| day.distance_km).sum();
        let within_cap = driving_by_date(&days)
            .values()
            .all(|minutes| *minutes <= window.cap_minutes);

        let mut warnings = Vec::new();
        if let Some(reason) = self.table.degraded_reason() {
            warnings.push(format!(
                "distance service unavailable ({reason}); travel times are approximate estimates"
            ));
        }
        for name in &excluded_places {
            warnings.push(format!("{name} was excluded to fit the trip"));
        }
        warnings.extend(inputs.notices.iter().cloned());
        for day in &days {
            if self.is_tight(day.driving_minutes, window.cap_minutes) {
                warnings.push(format!(
                    "tight schedule on day {}: {:.1} of {:.1} driving hours used",
                    day.day_number,
                    f64::from(day.driving_minutes) / 60.0,
                    f64::from(window.cap_minutes) / 60.0
                ));
            }
        }

        let retained: Vec<ResolvedStop> = kept.iter().map(|stop| (*stop).clone()).collect();
        let report = FeasibilityAnalyzer::new(self.table, self.config).check(
            inputs.start,
            &retained,
            0,
            inputs.number_of_days,
            inputs.max_driving_hours_per_day,
        );
        if report.verdict == Verdict::Tight {
            warnings.push(format!("tight schedule overall: {}", report.recommendation));
        }

        let is_feasible = excluded_places.is_empty() && within_cap;
        info!(
            trip = %inputs.trip_name,
            days = days.len(),
            visited = retained.len(),
            excluded = excluded_places.len(),
            is_feasible,
            "plan built"
        );

        TourPlan {
            trip_name: inputs.trip_name.clone(),
            total_days: u32::try_from(days.len()).unwrap_or(u32::MAX),
            total_distance_km,
            total_driving_hours: f64::from(driving_minutes) / 60.0,
            estimated_fuel_cost: total_distance_km * self.config.cost_per_km,
            is_feasible,
            warnings,
            excluded_places,
            invalid_places: inputs.invalid_places.clone(),
            departure: window.departure,
            return_deadline: window.deadline,
            returns_at: schedule.returns_at,
            days,
        }
    }

    fn is_tight(&self, driving_minutes: u32, cap_minutes: u32) -> bool {
        cap_minutes > 0
            && f64::from(driving_minutes) * 100.0
                >= self.config.tight_threshold_percent * f64::from(cap_minutes)
    }
}

/// Reject requests no plan can be built for.
pub(crate) fn validate(inputs: &PlanInputs<'_>) -> Result<(), PlanError> {
    let reason = if inputs.start.trim().is_empty() {
        "start location is empty"
    } else if inputs.number_of_days == 0 {
        "number of days must be at least 1"
    } else if !(inputs.max_driving_hours_per_day.is_finite()
        && inputs.max_driving_hours_per_day > 0.0)
    {
        "max driving hours per day must be positive"
    } else {
        return Ok(());
    };
    Err(PlanError::InvalidRequest {
        reason: reason.to_string(),
    })
}

/// Index of the place to drop next: lowest priority, preferring one the
/// failed attempt had not reached yet, then the latest requested.
fn exclusion_candidate(kept: &[&ResolvedStop], placed: &[String]) -> Option<usize> {
    kept.iter()
        .enumerate()
        .max_by_key(|(index, stop)| (stop.priority, !placed.contains(&stop.name), *index))
        .map(|(index, _)| index)
}

/// Fixed time frame of a trip.
#[derive(Debug, Clone)]
struct TripWindow {
    start_date: NaiveDate,
    day_start_time: NaiveTime,
    number_of_days: u32,
    cap_minutes: u32,
    departure: NaiveDateTime,
    deadline: NaiveDateTime,
}

impl TripWindow {
    fn new(inputs: &PlanInputs<'_>, config: &PlannerConfig) -> Self {
        let default_deadline = inputs
            .start_date
            .checked_add_days(Days::new(u64::from(inputs.number_of_days)))
            .unwrap_or(NaiveDate::MAX)
            .and_time(config.return_deadline_time);

        Self {
            start_date: inputs.start_date,
            day_start_time: config.day_start_time,
            number_of_days: inputs.number_of_days,
            cap_minutes: daily_cap_minutes(inputs.max_driving_hours_per_day),
            departure: inputs.start_date.and_time(config.day_start_time),
            deadline: inputs.return_deadline.unwrap_or(default_deadline),
        }
    }

    fn date_of(&self, day_number: u32) -> NaiveDate {
        self.start_date
            .checked_add_days(Days::new(u64::from(day_number.saturating_sub(1))))
            .unwrap_or(NaiveDate::MAX)
    }

    /// 1-based trip day that falls on `date`.
    fn day_number_of(&self, date: NaiveDate) -> u32 {
        let offset = (date - self.start_date).num_days().max(0) + 1;
        u32::try_from(offset).unwrap_or(u32::MAX)
    }

    fn day_start(&self, day_number: u32) -> NaiveDateTime {
        self.date_of(day_number).and_time(self.day_start_time)
    }
}

/// A successful attempt.
#[derive(Debug)]
struct Schedule {
    days: Vec<DayItinerary>,
    returns_at: NaiveDateTime,
    placed: Vec<String>,
}

#[derive(Debug)]
struct Overflow {
    reason: OverflowReason,
    /// Places visited before the attempt failed.
    placed: Vec<String>,
}

#[derive(Debug)]
enum OverflowReason {
    NoRoute(String),
    LegExceedsCap { from: String, to: String, minutes: u32 },
    DaysExhausted,
    DeadlinePassed(NaiveDateTime),
}

impl fmt::Display for OverflowReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRoute(message) => f.write_str(message),
            Self::LegExceedsCap { from, to, minutes } => {
                write!(f, "{from} to {to} takes {minutes} minutes, more than a day's driving")
            }
            Self::DaysExhausted => f.write_str("ran out of days"),
            Self::DeadlinePassed(at) => write!(f, "would return at {at}, after the deadline"),
        }
    }
}

/// Walks a route and cuts it into days.
struct DaySlicer<'w> {
    window: &'w TripWindow,
    table: &'w DistanceTable,
    days: Vec<DayItinerary>,
    day_number: u32,
    clock: NaiveDateTime,
    location: String,
    stops: Vec<Stop>,
    driving_minutes: u32,
    distance_km: f64,
    placed: Vec<String>,
}

impl<'w> DaySlicer<'w> {
    fn new(window: &'w TripWindow, table: &'w DistanceTable, start: &str) -> Self {
        Self {
            window,
            table,
            days: Vec::new(),
            day_number: 1,
            clock: window.departure,
            location: start.to_string(),
            stops: Vec::new(),
            driving_minutes: 0,
            distance_km: 0.0,
            placed: Vec::new(),
        }
    }

    fn overflow(&self, reason: OverflowReason) -> Overflow {
        Overflow {
            reason,
            placed: self.placed.clone(),
        }
    }

    /// Drive from the current location to `to`, moving to the next day
    /// first if today's driving budget is spent.
    fn travel_to(&mut self, to: &str) -> Result<(), Overflow> {
        if self.location == to {
            return Ok(());
        }

        let entry = self.table.entry(&self.location, to);
        let (Some(minutes), Some(km)) = (entry.duration_minutes(), entry.distance_km()) else {
            return Err(self.overflow(OverflowReason::NoRoute(format!(
                "no drivable route from {} to {to}",
                self.location
            ))));
        };

        if minutes > self.window.cap_minutes {
            return Err(self.overflow(OverflowReason::LegExceedsCap {
                from: self.location.clone(),
                to: to.to_string(),
                minutes,
            }));
        }
        let over_cap = self.driving_minutes.saturating_add(minutes) > self.window.cap_minutes;
        if over_cap || self.clock.date() > self.window.date_of(self.day_number) {
            self.next_day()?;
        }

        let start_time = self.clock;
        self.clock = add_minutes(start_time, minutes);
        self.stops.push(Stop {
            start_time,
            end_time: self.clock,
            kind: StopKind::Travel {
                from_location: self.location.clone(),
                to_location: to.to_string(),
                duration_minutes: minutes,
                distance_km: km,
            },
        });
        self.driving_minutes += minutes;
        self.distance_km += km;
        self.location = to.to_string();
        Ok(())
    }

    fn visit(&mut self, stop: &ResolvedStop) {
        let start_time = self.clock;
        self.clock = add_minutes(start_time, stop.visit_minutes);
        self.stops.push(Stop {
            start_time,
            end_time: self.clock,
            kind: StopKind::Visit {
                place_name: stop.name.clone(),
                duration_minutes: stop.visit_minutes,
                notes: stop.notes.clone(),
            },
        });
        self.placed.push(stop.name.clone());
    }

    /// Close the current day and resume on the next trip day, or on the
    /// clock's own date if a long visit already ran past it.
    fn next_day(&mut self) -> Result<(), Overflow> {
        self.close_day();
        self.day_number = self
            .day_number
            .saturating_add(1)
            .max(self.window.day_number_of(self.clock.date()));
        if self.day_number > self.window.number_of_days {
            return Err(self.overflow(OverflowReason::DaysExhausted));
        }
        self.clock = self.clock.max(self.window.day_start(self.day_number));
        debug!(day = self.day_number, location = %self.location, "starting next day");
        Ok(())
    }

    fn close_day(&mut self) {
        if self.stops.is_empty() {
            return;
        }
        let stops = std::mem::take(&mut self.stops);
        let day_number = u32::try_from(self.days.len() + 1).unwrap_or(u32::MAX);
        let summary = summarize(day_number, &stops, self.driving_minutes, self.distance_km);
        self.days.push(DayItinerary {
            day_number,
            date: self.window.date_of(self.day_number),
            stops,
            driving_minutes: self.driving_minutes,
            distance_km: self.distance_km,
            summary,
        });
        self.driving_minutes = 0;
        self.distance_km = 0.0;
    }

    fn finish(mut self) -> Schedule {
        self.close_day();
        Schedule {
            days: self.days,
            returns_at: self.clock,
            placed: self.placed,
        }
    }
}

fn summarize(day_number: u32, stops: &[Stop], driving_minutes: u32, distance_km: f64) -> String {
    let mut path: Vec<&str> = Vec::new();
    for stop in stops {
        if let StopKind::Travel {
            from_location,
            to_location,
            ..
        } = &stop.kind
        {
            if path.is_empty() {
                path.push(from_location);
            }
            path.push(to_location);
        }
    }
    let visits = stops.iter().filter(|stop| !stop.is_travel()).count();

    format!(
        "Day {day_number}: {} ({} visit{}, {:.1} h driving, {} km)",
        path.join(" → "),
        visits,
        if visits == 1 { "" } else { "s" },
        f64::from(driving_minutes) / 60.0,
        round_km(distance_km)
    )
}

/// Driving minutes per calendar date, keyed by the date each leg starts on.
fn driving_by_date(days: &[DayItinerary]) -> BTreeMap<NaiveDate, u32> {
    let mut totals = BTreeMap::new();
    for stop in days.iter().flat_map(|day| &day.stops) {
        if let StopKind::Travel {
            duration_minutes, ..
        } = &stop.kind
        {
            let total: &mut u32 = totals.entry(stop.start_time.date()).or_default();
            *total = total.saturating_add(*duration_minutes);
        }
    }
    totals
}

fn add_minutes(time: NaiveDateTime, minutes: u32) -> NaiveDateTime {
    time.checked_add_signed(TimeDelta::minutes(i64::from(minutes)))
        .unwrap_or(NaiveDateTime::MAX)
}
