/// Decimal precision for ledger calculations
pub const DECIMAL_PRECISION: u32 = 8;
