//! Sort columns, direction and the row comparator.
//!
//! Each view has its own column set, selected with the digit keys. The
//! comparator takes its direction as an explicit parameter; sorting is
//! stable so equal rows keep their incoming order.

use crate::aggregate::ProcessRow;
use crate::types::{DiskSample, NetIface};
use std::borrow::Borrow;
use std::cmp::Ordering;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    #[default]
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Orients an ascending comparison.
    #[must_use]
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }

    /// Arrow shown next to the active column header.
    #[must_use]
    pub fn arrow(self) -> char {
        match self {
            Self::Ascending => '↑',
            Self::Descending => '↓',
        }
    }
}

/// A sortable column of one view.
pub trait SortColumn: Copy + Eq + 'static {
    /// Row type the column sorts.
    type Row;

    /// Every column of the view, in key order.
    const ALL: &'static [Self];

    /// Column bound to digit key `digit` (1-based).
    fn from_digit(digit: u8) -> Option<Self> {
        Self::ALL.get(usize::from(digit).checked_sub(1)?).copied()
    }

    /// Digit key of this column.
    fn digit(self) -> u8 {
        Self::ALL.iter().position(|&c| c == self).map_or(0, |i| i as u8 + 1)
    }

    /// Column header label.
    fn label(self) -> &'static str;

    /// Ascending comparison of two rows by this column.
    fn compare(self, a: &Self::Row, b: &Self::Row) -> Ordering;
}

/// Process view columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessColumn {
    /// Process id.
    Pid,
    /// CPU percentage.
    #[default]
    Cpu,
    /// Logical reads per second.
    ReadOps,
    /// Logical writes per second.
    WriteOps,
    /// Block I/O wait.
    IoWait,
    /// Read MiB/s.
    ReadMib,
    /// Write MiB/s.
    WriteMib,
    /// Run state.
    State,
}

impl SortColumn for ProcessColumn {
    type Row = ProcessRow;

    const ALL: &'static [Self] = &[
        Self::Pid,
        Self::Cpu,
        Self::ReadOps,
        Self::WriteOps,
        Self::IoWait,
        Self::ReadMib,
        Self::WriteMib,
        Self::State,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Pid => "PID",
            Self::Cpu => "CPU%",
            Self::ReadOps => "R_Log/s",
            Self::WriteOps => "W_Log/s",
            Self::IoWait => "Wait_ms",
            Self::ReadMib => "R_MiB/s",
            Self::WriteMib => "W_MiB/s",
            Self::State => "S",
        }
    }

    fn compare(self, a: &ProcessRow, b: &ProcessRow) -> Ordering {
        match self {
            Self::Pid => a.pid.cmp(&b.pid),
            Self::Cpu => a.rates.cpu_pct.total_cmp(&b.rates.cpu_pct),
            Self::ReadOps => a.rates.read_ops.total_cmp(&b.rates.read_ops),
            Self::WriteOps => a.rates.write_ops.total_cmp(&b.rates.write_ops),
            Self::IoWait => a.rates.io_wait_ms.total_cmp(&b.rates.io_wait_ms),
            Self::ReadMib => a.rates.read_mib.total_cmp(&b.rates.read_mib),
            Self::WriteMib => a.rates.write_mib.total_cmp(&b.rates.write_mib),
            Self::State => a.state.as_char().cmp(&b.state.as_char()),
        }
    }
}

/// Network view columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetColumn {
    /// Receive Mbps.
    Rx,
    /// Transmit Mbps.
    #[default]
    Tx,
}

impl SortColumn for NetColumn {
    type Row = NetIface;

    const ALL: &'static [Self] = &[Self::Rx, Self::Tx];

    fn label(self) -> &'static str {
        match self {
            Self::Rx => "RX_Mbps",
            Self::Tx => "TX_Mbps",
        }
    }

    fn compare(self, a: &NetIface, b: &NetIface) -> Ordering {
        match self {
            Self::Rx => a.rates.rx_mbps.total_cmp(&b.rates.rx_mbps),
            Self::Tx => a.rates.tx_mbps.total_cmp(&b.rates.tx_mbps),
        }
    }
}

/// Storage view columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiskColumn {
    /// Read IOPS.
    #[default]
    ReadIops,
    /// Write IOPS.
    WriteIops,
    /// Read MiB/s.
    ReadMib,
    /// Write MiB/s.
    WriteMib,
    /// Read latency.
    ReadLatency,
    /// Write latency.
    WriteLatency,
}

impl SortColumn for DiskColumn {
    type Row = DiskSample;

    const ALL: &'static [Self] = &[
        Self::ReadIops,
        Self::WriteIops,
        Self::ReadMib,
        Self::WriteMib,
        Self::ReadLatency,
        Self::WriteLatency,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::ReadIops => "R_IOPS",
            Self::WriteIops => "W_IOPS",
            Self::ReadMib => "R_MiB/s",
            Self::WriteMib => "W_MiB/s",
            Self::ReadLatency => "R_Lat_ms",
            Self::WriteLatency => "W_Lat_ms",
        }
    }

    fn compare(self, a: &DiskSample, b: &DiskSample) -> Ordering {
        let (a, b) = (&a.rates, &b.rates);
        match self {
            Self::ReadIops => a.read_iops.total_cmp(&b.read_iops),
            Self::WriteIops => a.write_iops.total_cmp(&b.write_iops),
            Self::ReadMib => a.read_mib.total_cmp(&b.read_mib),
            Self::WriteMib => a.write_mib.total_cmp(&b.write_mib),
            Self::ReadLatency => a.read_latency_ms.total_cmp(&b.read_latency_ms),
            Self::WriteLatency => a.write_latency_ms.total_cmp(&b.write_latency_ms),
        }
    }
}

/// Active column and direction of one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState<C> {
    /// Active column.
    pub column: C,
    /// Active direction.
    pub direction: SortDirection,
}

impl<C: SortColumn> SortState<C> {
    /// Sorts by `column`, descending.
    #[must_use]
    pub fn new(column: C) -> Self {
        Self { column, direction: SortDirection::Descending }
    }

    /// Selecting the active column flips direction; another column
    /// becomes active, descending.
    pub fn select(&mut self, column: C) {
        if self.column == column {
            self.direction = self.direction.flipped();
        } else {
            self.column = column;
            self.direction = SortDirection::Descending;
        }
    }

    /// Comparator bound to this state.
    #[must_use]
    pub fn comparator(&self) -> impl Fn(&C::Row, &C::Row) -> Ordering {
        let (column, direction) = (self.column, self.direction);
        move |a: &C::Row, b: &C::Row| compare_rows(column, direction, a, b)
    }

    /// Stable in-place sort.
    pub fn sort<R>(&self, rows: &mut [R])
    where
        R: Borrow<C::Row>,
    {
        let cmp = self.comparator();
        rows.sort_by(|a, b| cmp(Borrow::<C::Row>::borrow(a), Borrow::<C::Row>::borrow(b)));
    }
}

/// Compares two rows by `column` in `direction`.
pub fn compare_rows<C: SortColumn>(
    column: C,
    direction: SortDirection,
    a: &C::Row,
    b: &C::Row,
) -> Ordering {
    direction.apply(column.compare(a, b))
}
