use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Utc};

use crate::config::Settings;
use crate::error::Result;
use crate::pipeline::Pipeline;

/// First trigger strictly after `after`. `times` must be sorted.
pub fn next_trigger(
    after: DateTime<FixedOffset>,
    times: &[NaiveTime],
    offset: FixedOffset,
) -> Option<DateTime<FixedOffset>> {
    let local = after.with_timezone(&offset);
    let today = local.date_naive();
    let tomorrow = today.succ_opt()?;
    [today, tomorrow].into_iter().find_map(|day| {
        times.iter().find_map(|time| {
            offset
                .from_local_datetime(&day.and_time(*time))
                .single()
                .filter(|trigger| *trigger > after)
        })
    })
}

/// Latest trigger in `(due, now]`, the ones that elapsed while a cycle ran.
pub fn latest_missed(
    due: DateTime<FixedOffset>,
    now: DateTime<FixedOffset>,
    times: &[NaiveTime],
    offset: FixedOffset,
) -> Option<DateTime<FixedOffset>> {
    let mut missed = None;
    let mut cursor = due;
    while let Some(trigger) = next_trigger(cursor, times, offset) {
        if trigger > now {
            break;
        }
        missed = Some(trigger);
        cursor = trigger;
    }
    missed
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Daily trigger times in a fixed UTC offset.
#[derive(Clone)]
pub struct Schedule {
    times: Vec<NaiveTime>,
    offset: FixedOffset,
    clock: Clock,
}

impl Schedule {
    pub fn new(mut times: Vec<NaiveTime>, offset: FixedOffset) -> Self {
        times.sort();
        times.dedup();
        Self {
            times,
            offset,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(settings.daily_times()?, settings.utc_offset()?))
    }

    #[cfg(test)]
    fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        (self.clock)().with_timezone(&self.offset)
    }

    pub fn next_after(&self, after: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        next_trigger(after, &self.times, self.offset)
    }

    pub fn latest_missed(
        &self,
        due: DateTime<FixedOffset>,
        now: DateTime<FixedOffset>,
    ) -> Option<DateTime<FixedOffset>> {
        latest_missed(due, now, &self.times, self.offset)
    }
}

async fn run_logged(pipeline: &Pipeline) {
    match pipeline.run_cycle().await {
        Ok(report) => log::info!("cycle finished: {}", report),
        Err(e) => log::error!("cycle failed: {}", e),
    }
}

/// One cycle right away, then one per trigger until the future is dropped.
///
/// Triggers passing while a cycle is running collapse into a single run
/// started as soon as that cycle returns.
pub async fn run_scheduled(pipeline: &Pipeline, schedule: &Schedule) {
    let mut due = schedule.now();
    loop {
        run_logged(pipeline).await;

        if let Some(missed) = schedule.latest_missed(due, schedule.now()) {
            log::warn!(
                "run scheduled for {} elapsed during the previous cycle, starting it now",
                missed.format("%d/%m/%Y %H:%M")
            );
            due = missed;
            continue;
        }

        let Some(next) = schedule.next_after(due) else {
            log::warn!("no schedule times configured, stopping after the startup cycle");
            return;
        };
        log::info!("next cycle at {}", next.format("%d/%m/%Y %H:%M %:z"));
        let wait = (next - schedule.now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;
        due = next;
    }
}
