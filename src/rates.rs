//! Rate derivation from paired cumulative counters.
//!
//! Every rate in kvmtop comes from the same rule: the delta between the
//! previous and current value of a monotonic counter, clamped at zero,
//! divided by the elapsed time between the two snapshots.

use crate::snapshot::{Sampled, Snapshot};
use crate::types::{
    DiskRates, DiskSample, Entity, GlobalCpu, NetIface, NetRates, ThreadRates, ThreadSample,
};
use std::time::Duration;

/// Bytes per MiB.
pub const BYTES_PER_MIB: f64 = 1_048_576.0;

/// Bytes per disk sector as reported by `/proc/diskstats`.
pub const SECTOR_BYTES: f64 = 512.0;

/// Non-negative delta of a monotonic counter.
///
/// A decrease (counter reset, identity reuse) yields zero.
#[inline]
#[must_use]
pub fn counter_delta(previous: u64, current: u64) -> u64 {
    current.saturating_sub(previous)
}

/// Elapsed seconds to divide by.
///
/// Non-positive or non-finite elapsed time is replaced by the configured
/// interval, and a degenerate interval by one second.
#[must_use]
pub fn effective_dt(elapsed_secs: f64, interval: Duration) -> f64 {
    if elapsed_secs.is_finite() && elapsed_secs > 0.0 {
        return elapsed_secs;
    }
    let fallback = interval.as_secs_f64();
    if fallback > 0.0 {
        fallback
    } else {
        1.0
    }
}

/// Timing inputs shared by every rate of one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateContext {
    /// Elapsed seconds, always positive.
    pub dt_secs: f64,
    /// Scheduler ticks per second, always positive.
    pub ticks_per_second: f64,
}

impl RateContext {
    /// Builds a context, substituting `interval` for a non-positive
    /// elapsed time.
    #[must_use]
    pub fn new(elapsed_secs: f64, interval: Duration, ticks_per_second: u64) -> Self {
        Self {
            dt_secs: effective_dt(elapsed_secs, interval),
            ticks_per_second: ticks_per_second.max(1) as f64,
        }
    }

    /// Per-second rate of a counter pair.
    #[inline]
    #[must_use]
    pub fn per_second(&self, previous: u64, current: u64) -> f64 {
        counter_delta(previous, current) as f64 / self.dt_secs
    }

    /// MiB/s of a byte counter pair.
    #[inline]
    #[must_use]
    pub fn mib_per_second(&self, previous: u64, current: u64) -> f64 {
        self.per_second(previous, current) / BYTES_PER_MIB
    }
}

/// Entities that carry rates derived from their previous sample.
pub trait DeriveRates {
    /// Sets this entity's rates from `previous`; `None` (first
    /// appearance) zeroes them.
    fn derive_rates(&mut self, previous: Option<&Self>, ctx: &RateContext);
}

impl DeriveRates for ThreadSample {
    fn derive_rates(&mut self, previous: Option<&Self>, ctx: &RateContext) {
        let Some(prev) = previous else {
            self.rates = ThreadRates::default();
            return;
        };
        let (p, c) = (&prev.counters, &self.counters);

        self.rates = ThreadRates {
            cpu_pct: 100.0 * counter_delta(p.cpu_ticks, c.cpu_ticks) as f64
                / (ctx.dt_secs * ctx.ticks_per_second),
            read_ops: ctx.per_second(p.syscr, c.syscr),
            write_ops: ctx.per_second(p.syscw, c.syscw),
            // Wait accumulated over the interval, not normalised by dt
            io_wait_ms: counter_delta(p.blkio_ticks, c.blkio_ticks) as f64 * 1000.0
                / ctx.ticks_per_second,
            read_mib: ctx.mib_per_second(p.read_bytes, c.read_bytes),
            write_mib: ctx.mib_per_second(p.write_bytes, c.write_bytes),
            minflt_ps: ctx.per_second(p.minflt, c.minflt),
            majflt_ps: ctx.per_second(p.majflt, c.majflt),
        };
    }
}

impl DeriveRates for NetIface {
    fn derive_rates(&mut self, previous: Option<&Self>, ctx: &RateContext) {
        let Some(prev) = previous else {
            self.rates = NetRates::default();
            return;
        };
        let (p, c) = (&prev.counters, &self.counters);
        let mbps = |prev: u64, cur: u64| ctx.per_second(prev, cur) * 8.0 / 1_000_000.0;

        self.rates = NetRates {
            rx_mbps: mbps(p.rx_bytes, c.rx_bytes),
            tx_mbps: mbps(p.tx_bytes, c.tx_bytes),
            rx_pps: ctx.per_second(p.rx_packets, c.rx_packets),
            tx_pps: ctx.per_second(p.tx_packets, c.tx_packets),
            rx_errs_ps: ctx.per_second(p.rx_errors, c.rx_errors),
            tx_errs_ps: ctx.per_second(p.tx_errors, c.tx_errors),
        };
    }
}

impl DeriveRates for DiskSample {
    fn derive_rates(&mut self, previous: Option<&Self>, ctx: &RateContext) {
        let Some(prev) = previous else {
            self.rates = DiskRates::default();
            return;
        };
        let (p, c) = (&prev.counters, &self.counters);
        let latency = |time_prev: u64, time_cur: u64, ops_prev: u64, ops_cur: u64| {
            let ops = counter_delta(ops_prev, ops_cur);
            if ops == 0 {
                0.0
            } else {
                counter_delta(time_prev, time_cur) as f64 / ops as f64
            }
        };
        let busy_ms = counter_delta(p.io_ticks, c.io_ticks) as f64;

        self.rates = DiskRates {
            read_iops: ctx.per_second(p.reads, c.reads),
            write_iops: ctx.per_second(p.writes, c.writes),
            read_mib: ctx.per_second(p.sectors_read, c.sectors_read) * SECTOR_BYTES
                / BYTES_PER_MIB,
            write_mib: ctx.per_second(p.sectors_written, c.sectors_written) * SECTOR_BYTES
                / BYTES_PER_MIB,
            read_latency_ms: latency(p.read_time_ms, c.read_time_ms, p.reads, c.reads),
            write_latency_ms: latency(p.write_time_ms, c.write_time_ms, p.writes, c.writes),
            util_pct: (busy_ms / (ctx.dt_secs * 1000.0) * 100.0).min(100.0),
        };
    }
}

/// Annotates every entity of `current` with rates against `previous`.
///
/// Entities absent from `previous` get zero rates.
pub fn compute_rates<T>(
    previous: Option<&Snapshot<T>>,
    current: &mut Snapshot<T>,
    ctx: &RateContext,
) where
    T: Entity + DeriveRates,
{
    for entity in current.entities_mut() {
        let prev = previous.and_then(|snap| snap.lookup(entity.key()));
        entity.derive_rates(prev, ctx);
    }
}

/// Seconds between two snapshots, or zero if `current` is older.
#[must_use]
pub fn elapsed_between<T>(previous: &Snapshot<T>, current: &Snapshot<T>) -> f64
where
    T: Entity,
{
    current.captured_at().saturating_duration_since(previous.captured_at()).as_secs_f64()
}

/// Busy percentage of all CPUs between two global samples.
///
/// `(total_delta - idle_delta) / total_delta * 100`, 0 when no ticks
/// elapsed.
#[must_use]
pub fn global_cpu_percent(previous: &GlobalCpu, current: &GlobalCpu) -> f64 {
    let total = counter_delta(previous.total(), current.total());
    if total == 0 {
        return 0.0;
    }
    let idle = counter_delta(previous.idle, current.idle).min(total);
    (total - idle) as f64 / total as f64 * 100.0
}

/// Global CPU percentage from the store's slots.
#[must_use]
pub fn global_cpu_from(
    previous: Option<&Sampled<GlobalCpu>>,
    current: Option<&Sampled<GlobalCpu>>,
) -> f64 {
    match (previous, current) {
        (Some(p), Some(c)) => global_cpu_percent(&p.value, &c.value),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DiskCounters, NetCounters, ThreadCounters};
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use std::time::Instant;

    fn ctx(dt: f64) -> RateContext {
        RateContext::new(dt, Duration::from_secs(5), 100)
    }

    fn thread(tid: u32, counters: ThreadCounters) -> ThreadSample {
        ThreadSample { tid, tgid: tid, counters, ..Default::default() }
    }

    // ========================================================================
    // Deltas and dt
    // ========================================================================

    #[test]
    fn test_counter_delta() {
        assert_eq!(counter_delta(100, 150), 50);
        assert_eq!(counter_delta(150, 150), 0);
        assert_eq!(counter_delta(5000, 10), 0);
        assert_eq!(counter_delta(0, u64::MAX), u64::MAX);
    }

    #[test]
    fn test_effective_dt_substitutes_interval() {
        let interval = Duration::from_millis(2500);
        assert_eq!(effective_dt(0.0, interval), 2.5);
        assert_eq!(effective_dt(-1.0, interval), 2.5);
        assert_eq!(effective_dt(f64::NAN, interval), 2.5);
        assert_eq!(effective_dt(1.25, interval), 1.25);
        assert_eq!(effective_dt(0.0, Duration::ZERO), 1.0);
    }

    // ========================================================================
    // Threads
    // ========================================================================

    #[test]
    fn test_cpu_percent_scenario() {
        let prev = thread(1, ThreadCounters { cpu_ticks: 100, ..Default::default() });
        let mut cur = thread(1, ThreadCounters { cpu_ticks: 150, ..Default::default() });

        cur.derive_rates(Some(&prev), &ctx(5.0));

        assert_relative_eq!(cur.rates.cpu_pct, 10.0);
    }

    #[test]
    fn test_thread_io_rates() {
        let prev = thread(1, ThreadCounters::default());
        let mut cur = thread(
            1,
            ThreadCounters {
                syscr: 200,
                syscw: 100,
                read_bytes: 2 * 1_048_576,
                write_bytes: 1_048_576,
                blkio_ticks: 30,
                minflt: 40,
                majflt: 4,
                ..Default::default()
            },
        );

        cur.derive_rates(Some(&prev), &ctx(2.0));

        assert_relative_eq!(cur.rates.read_ops, 100.0);
        assert_relative_eq!(cur.rates.write_ops, 50.0);
        assert_relative_eq!(cur.rates.read_mib, 1.0);
        assert_relative_eq!(cur.rates.write_mib, 0.5);
        assert_relative_eq!(cur.rates.io_wait_ms, 300.0);
        assert_relative_eq!(cur.rates.minflt_ps, 20.0);
        assert_relative_eq!(cur.rates.majflt_ps, 2.0);
    }

    #[test]
    fn test_first_appearance_has_zero_rates() {
        let mut cur = thread(9, ThreadCounters { cpu_ticks: 1_000_000, ..Default::default() });
        cur.rates.cpu_pct = 42.0;

        cur.derive_rates(None, &ctx(1.0));

        assert_eq!(cur.rates, ThreadRates::default());
    }

    #[test]
    fn test_compute_rates_matches_by_key() {
        let now = Instant::now();
        let prev = Snapshot::new(
            vec![
                thread(1, ThreadCounters { cpu_ticks: 100, ..Default::default() }),
                thread(2, ThreadCounters { cpu_ticks: 500, ..Default::default() }),
            ],
            now,
        );
        let mut cur = Snapshot::new(
            vec![
                thread(3, ThreadCounters { cpu_ticks: 900, ..Default::default() }),
                thread(2, ThreadCounters { cpu_ticks: 600, ..Default::default() }),
                thread(1, ThreadCounters { cpu_ticks: 150, ..Default::default() }),
            ],
            now,
        );

        compute_rates(Some(&prev), &mut cur, &ctx(1.0));

        let cpu: Vec<f64> = cur.entities().iter().map(|t| t.rates.cpu_pct).collect();
        assert_eq!(cpu, vec![50.0, 100.0, 0.0]);
    }

    #[test]
    fn test_compute_rates_without_previous() {
        let mut cur =
            Snapshot::new(vec![thread(1, ThreadCounters { cpu_ticks: 5, ..Default::default() })], Instant::now());
        compute_rates(None, &mut cur, &ctx(1.0));
        assert_eq!(cur.entities()[0].rates.cpu_pct, 0.0);
    }

    // ========================================================================
    // Network and disks
    // ========================================================================

    #[test]
    fn test_network_rates() {
        let prev = NetIface { name: "eth0".into(), ..Default::default() };
        let mut cur = NetIface {
            name: "eth0".into(),
            counters: NetCounters {
                rx_bytes: 1_250_000,
                tx_bytes: 2_500_000,
                rx_packets: 1000,
                tx_packets: 10,
                rx_errors: 2,
                tx_errors: 0,
            },
            ..Default::default()
        };

        cur.derive_rates(Some(&prev), &ctx(1.0));

        assert_relative_eq!(cur.rates.rx_mbps, 10.0);
        assert_relative_eq!(cur.rates.tx_mbps, 20.0);
        assert_relative_eq!(cur.rates.rx_pps, 1000.0);
        assert_relative_eq!(cur.rates.rx_errs_ps, 2.0);
    }

    #[test]
    fn test_disk_counter_reset_scenario() {
        let prev = DiskSample {
            name: "sda".into(),
            counters: DiskCounters { reads: 5000, ..Default::default() },
            ..Default::default()
        };
        let mut cur = DiskSample {
            name: "sda".into(),
            counters: DiskCounters { reads: 10, ..Default::default() },
            ..Default::default()
        };

        cur.derive_rates(Some(&prev), &ctx(1.0));

        assert_eq!(cur.rates.read_iops, 0.0);
        assert_eq!(cur.rates.read_latency_ms, 0.0);
    }

    #[test]
    fn test_disk_rates() {
        let prev = DiskSample { name: "sda".into(), ..Default::default() };
        let mut cur = DiskSample {
            name: "sda".into(),
            counters: DiskCounters {
                reads: 200,
                writes: 100,
                sectors_read: 4096,
                sectors_written: 2048,
                read_time_ms: 400,
                write_time_ms: 50,
                io_ticks: 1500,
                time_in_queue: 0,
            },
            ..Default::default()
        };

        cur.derive_rates(Some(&prev), &ctx(2.0));

        assert_relative_eq!(cur.rates.read_iops, 100.0);
        assert_relative_eq!(cur.rates.write_iops, 50.0);
        assert_relative_eq!(cur.rates.read_mib, 1.0);
        assert_relative_eq!(cur.rates.write_mib, 0.5);
        assert_relative_eq!(cur.rates.read_latency_ms, 2.0);
        assert_relative_eq!(cur.rates.write_latency_ms, 0.5);
        assert_relative_eq!(cur.rates.util_pct, 75.0);
    }

    #[test]
    fn test_disk_utilization_capped() {
        let prev = DiskSample::default();
        let mut cur =
            DiskSample { counters: DiskCounters { io_ticks: 9000, ..Default::default() }, ..Default::default() };

        cur.derive_rates(Some(&prev), &ctx(1.0));

        assert_eq!(cur.rates.util_pct, 100.0);
    }

    // ========================================================================
    // Global CPU
    // ========================================================================

    #[test]
    fn test_global_cpu_percent() {
        let prev = GlobalCpu { user: 100, idle: 900, ..Default::default() };
        let cur = GlobalCpu { user: 150, system: 50, idle: 1000, ..Default::default() };

        assert_relative_eq!(global_cpu_percent(&prev, &cur), 50.0);
    }

    #[test]
    fn test_global_cpu_zero_delta() {
        let cpu = GlobalCpu { user: 10, idle: 10, ..Default::default() };
        assert_eq!(global_cpu_percent(&cpu, &cpu), 0.0);
        assert_eq!(global_cpu_from(None, None), 0.0);
    }

    #[test]
    fn test_global_cpu_reset_is_zero() {
        let prev = GlobalCpu { user: 1000, idle: 1000, ..Default::default() };
        let cur = GlobalCpu { user: 1, idle: 1, ..Default::default() };
        assert_eq!(global_cpu_percent(&prev, &cur), 0.0);
    }

    #[test]
    fn test_global_cpu_near_counter_limit() {
        let prev = GlobalCpu { user: 10, idle: 10, ..Default::default() };
        let cur = GlobalCpu { user: u64::MAX - 5, idle: 20, system: 40, ..Default::default() };

        let pct = global_cpu_percent(&prev, &cur);
        assert!((0.0..=100.0).contains(&pct));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_delta_never_negative(p in any::<u64>(), c in any::<u64>()) {
            let d = counter_delta(p, c);
            prop_assert_eq!(d, c.saturating_sub(p));
            prop_assert!(d <= c);
        }

        #[test]
        fn prop_rates_non_negative_for_any_counters(
            prev in proptest::array::uniform8(0u64..1 << 40),
            cur in proptest::array::uniform8(0u64..1 << 40),
            dt in -10.0f64..10.0,
        ) {
            let counters = |v: [u64; 8]| ThreadCounters {
                cpu_ticks: v[0], syscr: v[1], syscw: v[2], read_bytes: v[3],
                write_bytes: v[4], blkio_ticks: v[5], minflt: v[6], majflt: v[7],
            };
            let p = thread(1, counters(prev));
            let mut c = thread(1, counters(cur));
            c.derive_rates(Some(&p), &ctx(dt));

            let r = c.rates;
            for v in [r.cpu_pct, r.read_ops, r.write_ops, r.io_wait_ms, r.read_mib, r.write_mib, r.minflt_ps, r.majflt_ps] {
                prop_assert!(v.is_finite());
                prop_assert!(v >= 0.0);
            }
        }

        #[test]
        fn prop_non_positive_dt_uses_interval(dt in -1000.0f64..=0.0, ms in 100u64..60_000) {
            let interval = Duration::from_millis(ms);
            prop_assert_eq!(effective_dt(dt, interval), interval.as_secs_f64());
        }

        #[test]
        fn prop_global_cpu_in_range(
            a in proptest::array::uniform8(0u64..1 << 32),
            b in proptest::array::uniform8(0u64..1 << 32),
        ) {
            let cpu = |v: [u64; 8]| GlobalCpu {
                user: v[0], nice: v[1], system: v[2], idle: v[3],
                iowait: v[4], irq: v[5], softirq: v[6], steal: v[7],
            };
            let pct = global_cpu_percent(&cpu(a), &cpu(b));
            prop_assert!((0.0..=100.0).contains(&pct));
        }
    }
}
