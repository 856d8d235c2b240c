//! Input/Output operations for glmselect

mod report;
mod table;

pub use report::{
    CoefficientReport, FitReport, IntervalReport, ModelReport, SearchReport, StepReport,
    StepwiseReport, TermInterval,
};
pub use self::table::{
    build_design, read_table, write_fit, write_intervals, write_json, write_selection,
    write_stepwise, DesignTable, NumericTable,
};
