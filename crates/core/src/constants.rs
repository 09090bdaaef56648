/// Currency used for summaries when none is configured.
pub const DEFAULT_REPORTING_CURRENCY: &str = "USD";

/// Decimal places kept on converted amounts.
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal places used when presenting money.
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Page size used when a caller passes zero or a negative size.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Upper bound on a single page request.
pub const MAX_PAGE_SIZE: i64 = 500;
