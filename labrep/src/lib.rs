//! Turns `labcore` outcomes into tables and JSON, and reads
//! workloads for the `oslab` dispatcher.

pub mod input;
pub mod report;

pub use input::{
    FileSpec, InputError, ProcessSpec, WorkloadFile, processes_from_columns, scatter_occupied,
    LAB_BLOCKS, LAB_DISK_BLOCKS, LAB_OCCUPIED,
};
pub use report::{
    DiskEvent, DiskReport, FileRow, FitComparison, FitReport, FitRow, FixedReport, FixedRow,
    Render, ScheduleReport, ScheduleRow, SliceRow, VariableReport, VariableRow, rejection_reason,
};
